//! Core data types for the storage layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classifier::classify;
use crate::emotion::Emotion;
use crate::registry::{style_for, EmotionStyle};

/// Metadata for a diary file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiaryMetadata {
    /// Format version (e.g., "0.1")
    pub format_version: String,

    /// Device that created this diary
    pub device_id: Uuid,

    /// When this diary was created
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp (informational)
    pub last_modified: DateTime<Utc>,
}

/// A saved diary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    /// Unique identifier for this entry
    pub id: Uuid,

    /// What the user wrote
    pub text: String,

    /// Emotion the text was classified as when saved
    pub emotion: Emotion,

    /// When this entry was written
    pub created_at: DateTime<Utc>,

    /// Device that wrote this entry
    pub device_id: Uuid,
}

impl DiaryEntry {
    /// Presentation style of this entry's emotion.
    pub fn style(&self) -> &'static EmotionStyle {
        style_for(self.emotion)
    }
}

/// Builder for creating new entries.
///
/// Carries no emotion: the store classifies `text` when the entry is
/// inserted.
#[derive(Debug, Clone)]
pub struct NewDiaryEntry {
    pub text: String,

    /// Defaults to the insert time when unset
    pub created_at: Option<DateTime<Utc>>,
}

impl NewDiaryEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: None,
        }
    }

    /// Emotion this entry will be saved with.
    pub fn emotion(&self) -> Emotion {
        classify(&self.text)
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Filter for querying entries.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Only entries with this emotion
    pub emotion: Option<Emotion>,

    /// Start date (inclusive)
    pub since: Option<DateTime<Utc>>,

    /// End date (inclusive)
    pub until: Option<DateTime<Utc>>,

    /// Maximum number of results
    pub limit: Option<usize>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emotion(mut self, emotion: Emotion) -> Self {
        self.emotion = Some(emotion);
        self
    }

    pub fn since(mut self, date: DateTime<Utc>) -> Self {
        self.since = Some(date);
        self
    }

    pub fn until(mut self, date: DateTime<Utc>) -> Self {
        self.until = Some(date);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Number of entries saved with one emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmotionCount {
    pub emotion: Emotion,
    pub count: u64,
}
