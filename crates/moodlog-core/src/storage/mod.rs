//! Diary storage.
//!
//! - **traits**: the `DiaryStore` interface
//! - **types**: entries, filters and metadata
//! - **age_sqlite**: in-memory SQLite, serialized and Age-encrypted at rest
//! - **encryption**: Age passphrase encryption helpers

pub mod age_sqlite;
pub mod encryption;
pub mod traits;
pub mod types;

pub use age_sqlite::AgeSqliteStorage;
pub use traits::DiaryStore;
pub use types::{DiaryEntry, DiaryMetadata, EmotionCount, EntryFilter, NewDiaryEntry};
