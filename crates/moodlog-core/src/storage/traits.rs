//! Storage engine trait definition.
//!
//! Hosts persist entries through `DiaryStore`; classification never depends
//! on it.

use std::path::Path;
use uuid::Uuid;

use super::types::{DiaryEntry, DiaryMetadata, EmotionCount, EntryFilter, NewDiaryEntry};
use crate::error::Result;

/// Storage interface for an encrypted diary.
///
/// Implementations must ensure:
/// - Data is encrypted at rest
/// - Entries are append-only and keyed by UUID
/// - Listings are newest first
pub trait DiaryStore: Send + Sync {
    /// Create a new diary at the specified path.
    ///
    /// Returns the device ID for this diary.
    ///
    /// # Errors
    ///
    /// Returns `MoodlogError::Storage` if the file already exists or cannot
    /// be written, `MoodlogError::InvalidInput` for a weak passphrase.
    fn create(path: &Path, passphrase: &str) -> Result<Uuid>
    where
        Self: Sized;

    /// Open an existing diary.
    ///
    /// # Errors
    ///
    /// Returns `MoodlogError::IncorrectPassphrase` if the passphrase does not
    /// decrypt the file, `MoodlogError::Crypto` if the file is corrupted.
    fn open(path: &Path, passphrase: &str) -> Result<Self>
    where
        Self: Sized;

    /// Close the diary, encrypting and writing it to disk atomically.
    fn close(self) -> Result<()>;

    /// Get diary metadata.
    fn metadata(&self) -> Result<DiaryMetadata>;

    /// Append an entry, returning its new ID.
    ///
    /// # Errors
    ///
    /// Returns `MoodlogError::Validation` if the text is blank or too large.
    fn insert_entry(&mut self, entry: &NewDiaryEntry) -> Result<Uuid>;

    /// Get an entry by ID.
    fn get_entry(&self, id: &Uuid) -> Result<Option<DiaryEntry>>;

    /// Resolve an ID prefix to a single entry.
    ///
    /// # Errors
    ///
    /// Returns `MoodlogError::InvalidInput` if the prefix is ambiguous.
    fn find_by_prefix(&self, prefix: &str) -> Result<Option<DiaryEntry>>;

    /// List entries matching the filter, newest first.
    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<DiaryEntry>>;

    /// Entries whose text contains `query` (case-sensitive), newest first.
    fn search_entries(&self, query: &str) -> Result<Vec<DiaryEntry>>;

    /// Entry count per emotion, one row for every emotion.
    fn emotion_counts(&self, filter: &EntryFilter) -> Result<Vec<EmotionCount>>;

    /// Check diary integrity.
    fn check_integrity(&self) -> Result<()>;
}
