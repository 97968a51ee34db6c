//! # Moodlog Core
//!
//! Core library for Moodlog - an encrypted, CLI-first emotion diary.
//!
//! This crate provides emotion classification, the emotion-to-style registry,
//! and the encrypted diary store, independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **emotion**: The closed set of emotion tags
//! - **classifier**: Keyword table and first-to-max classification
//! - **registry**: Presentation style for every emotion tag
//! - **color**: HSLA color values used by the registry
//! - **storage**: Diary store trait and the Age+SQLite implementation

pub mod classifier;
pub mod color;
pub mod crypto;
pub mod emotion;
pub mod error;
pub mod fs;
pub mod registry;
pub mod storage;

pub use classifier::{classify, score, Classification, Scores, KEYWORDS};
pub use color::Hsla;
pub use emotion::Emotion;
pub use error::{MoodlogError, Result};
pub use registry::{default_style, style_for, EmotionStyle, Music};
pub use storage::DiaryStore;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
