//! Age-encrypted SQLite storage backend.
//!
//! The whole diary lives in an in-memory SQLite database while open. On
//! close it is serialized, encrypted with the passphrase, and written back
//! atomically. Nothing unencrypted touches the disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::serialize::OwnedData;
use rusqlite::{Connection, DatabaseName, OptionalExtension, ToSql};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classifier::classify;
use crate::crypto::validate_passphrase;
use crate::emotion::Emotion;
use crate::error::{MoodlogError, Result};
use crate::fs::write_atomic;
use crate::storage::encryption::DiaryKey;
use crate::storage::traits::DiaryStore;
use crate::storage::types::{
    DiaryEntry, DiaryMetadata, EmotionCount, EntryFilter, NewDiaryEntry,
};

const FORMAT_VERSION: &str = "0.1";
const REQUIRED_META_KEYS: [&str; 4] = [
    "format_version",
    "device_id",
    "created_at",
    "last_modified",
];
const ENTRY_COLUMNS: &str = "id, text, emotion, created_at, device_id";

/// Age-encrypted SQLite diary.
pub struct AgeSqliteStorage {
    path: PathBuf,
    conn: Mutex<Connection>,
    device_id: Uuid,
    // Retained to re-seal on close.
    key: DiaryKey,
}

type EntryRow = (String, String, String, String, String);

impl AgeSqliteStorage {
    /// Upper bound on the UTF-8 size of one entry's text.
    pub const MAX_TEXT_BYTES: usize = 1024 * 1024;

    fn sqlite_error(err: rusqlite::Error) -> MoodlogError {
        MoodlogError::Storage(format!("SQLite error: {}", err))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| MoodlogError::Storage("SQLite connection poisoned".to_string()))
    }

    fn timestamp(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_timestamp(value: &str, what: &str) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(value)
            .map_err(|e| MoodlogError::Storage(format!("Invalid {} timestamp: {}", what, e)))?
            .with_timezone(&Utc))
    }

    fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
        ))
    }

    fn entry_from_row(row: EntryRow) -> Result<DiaryEntry> {
        let (id_str, text, emotion_str, created_at_str, device_id_str) = row;
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| MoodlogError::Storage(format!("Invalid UUID: {}", e)))?;
        let device_id = Uuid::parse_str(&device_id_str)
            .map_err(|e| MoodlogError::Storage(format!("Invalid device_id: {}", e)))?;
        let emotion: Emotion = emotion_str
            .parse()
            .map_err(|e| MoodlogError::Storage(format!("Invalid stored emotion: {}", e)))?;
        let created_at = Self::parse_timestamp(&created_at_str, "created_at")?;

        Ok(DiaryEntry {
            id,
            text,
            emotion,
            created_at,
            device_id,
        })
    }

    fn query_entries(
        conn: &Connection,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> Result<Vec<DiaryEntry>> {
        let mut stmt = conn.prepare(sql).map_err(Self::sqlite_error)?;
        let rows = stmt
            .query_map(params, Self::read_row)
            .map_err(Self::sqlite_error)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(Self::entry_from_row(row.map_err(Self::sqlite_error)?)?);
        }
        Ok(entries)
    }

    /// WHERE clause and parameters for a filter (limit excluded).
    fn filter_clause(filter: &EntryFilter) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(emotion) = filter.emotion {
            conditions.push("emotion = ?");
            params.push(Box::new(emotion.as_str()));
        }
        if let Some(since) = filter.since {
            conditions.push("created_at >= ?");
            params.push(Box::new(Self::timestamp(&since)));
        }
        if let Some(until) = filter.until {
            conditions.push("created_at <= ?");
            params.push(Box::new(Self::timestamp(&until)));
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), params)
        }
    }

    fn validate_text(text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(MoodlogError::Validation(
                "Entry text cannot be empty".to_string(),
            ));
        }
        if text.len() > Self::MAX_TEXT_BYTES {
            return Err(MoodlogError::Validation(format!(
                "Entry text too large (max {} bytes)",
                Self::MAX_TEXT_BYTES
            )));
        }
        Ok(())
    }

    fn owned_data_from_bytes(bytes: &[u8]) -> Result<OwnedData> {
        if bytes.is_empty() {
            return Err(MoodlogError::Storage("SQLite payload is empty".to_string()));
        }

        let size: i32 = bytes
            .len()
            .try_into()
            .map_err(|_| MoodlogError::Storage("SQLite payload too large".to_string()))?;

        // SAFETY: sqlite3_malloc returns a valid pointer or null, and null is
        // rejected right below. `size` was checked to fit in i32.
        let raw = unsafe { rusqlite::ffi::sqlite3_malloc(size) as *mut u8 };
        if raw.is_null() {
            return Err(MoodlogError::Storage("SQLite allocation failed".to_string()));
        }

        // SAFETY:
        // - `raw` came from sqlite3_malloc(size) above and is non-null
        // - `raw` is writable for `bytes.len()` bytes since size == bytes.len()
        // - `bytes` is a valid slice and cannot overlap the fresh allocation
        // - `OwnedData` takes ownership of the sqlite3_malloc'd buffer, which
        //   SQLite frees once the deserialized database is dropped
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), raw, bytes.len());
            let ptr = NonNull::new(raw).ok_or_else(|| {
                MoodlogError::Storage("SQLite allocation returned null".to_string())
            })?;
            Ok(OwnedData::from_raw_nonnull(ptr, bytes.len()))
        }
    }

    fn meta_value(conn: &Connection, key: &str) -> Result<String> {
        conn.query_row("SELECT value FROM meta WHERE key = ?", [key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(Self::sqlite_error)?
        .ok_or_else(|| MoodlogError::Storage(format!("Missing metadata key: {}", key)))
    }
}

impl DiaryStore for AgeSqliteStorage {
    fn create(path: &Path, passphrase: &str) -> Result<Uuid> {
        if path.exists() {
            return Err(MoodlogError::Storage(
                "Diary file already exists".to_string(),
            ));
        }

        validate_passphrase(passphrase)?;

        let device_id = Uuid::new_v4();
        let conn = Connection::open_in_memory().map_err(Self::sqlite_error)?;

        conn.execute_batch(
            r#"
            CREATE TABLE meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE entries (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                emotion TEXT NOT NULL,
                created_at TEXT NOT NULL,
                device_id TEXT NOT NULL
            );

            CREATE INDEX entries_created_at ON entries(created_at);
            CREATE INDEX entries_emotion ON entries(emotion);
            "#,
        )
        .map_err(Self::sqlite_error)?;

        let created_at = Self::timestamp(&Utc::now());
        let device_id_str = device_id.to_string();
        for (key, value) in [
            ("format_version", FORMAT_VERSION),
            ("device_id", device_id_str.as_str()),
            ("created_at", created_at.as_str()),
            ("last_modified", created_at.as_str()),
        ] {
            conn.execute("INSERT INTO meta (key, value) VALUES (?, ?)", [key, value])
                .map_err(Self::sqlite_error)?;
        }

        let plaintext = conn
            .serialize(DatabaseName::Main)
            .map_err(Self::sqlite_error)?;
        let encrypted = DiaryKey::new(passphrase).seal(plaintext.as_ref())?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        write_atomic(path, &encrypted)?;

        info!(path = %path.display(), %device_id, "created diary");
        Ok(device_id)
    }

    fn open(path: &Path, passphrase: &str) -> Result<Self> {
        if !path.exists() {
            return Err(MoodlogError::NotFound(format!(
                "Diary file {}",
                path.display()
            )));
        }

        validate_passphrase(passphrase)?;

        let encrypted = fs::read(path)?;
        let key = DiaryKey::new(passphrase);
        let plaintext = key.unseal(&encrypted)?;
        let mut conn = Connection::open_in_memory().map_err(Self::sqlite_error)?;
        let owned_data = Self::owned_data_from_bytes(&plaintext)?;
        conn.deserialize(DatabaseName::Main, owned_data, false)
            .map_err(Self::sqlite_error)?;

        let device_id_str = Self::meta_value(&conn, "device_id")?;
        let device_id = Uuid::parse_str(&device_id_str).map_err(|e| {
            MoodlogError::Storage(format!("Invalid device_id in metadata: {}", e))
        })?;

        debug!(path = %path.display(), "opened diary");
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
            device_id,
            key,
        })
    }

    fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| MoodlogError::Storage("SQLite connection poisoned".to_string()))?;
        let data = conn
            .serialize(DatabaseName::Main)
            .map_err(Self::sqlite_error)?;
        let encrypted = self.key.seal(data.as_ref())?;
        write_atomic(&self.path, &encrypted)?;
        debug!(path = %self.path.display(), bytes = encrypted.len(), "closed diary");
        Ok(())
    }

    fn metadata(&self) -> Result<DiaryMetadata> {
        let conn = self.lock()?;

        let format_version = Self::meta_value(&conn, "format_version")?;
        let created_at =
            Self::parse_timestamp(&Self::meta_value(&conn, "created_at")?, "created_at")?;
        let last_modified =
            Self::parse_timestamp(&Self::meta_value(&conn, "last_modified")?, "last_modified")?;

        Ok(DiaryMetadata {
            format_version,
            device_id: self.device_id,
            created_at,
            last_modified,
        })
    }

    fn insert_entry(&mut self, entry: &NewDiaryEntry) -> Result<Uuid> {
        Self::validate_text(&entry.text)?;
        let emotion = classify(&entry.text);

        let device_id = self.device_id;
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(Self::sqlite_error)?;

        let id = Uuid::new_v4();
        let created_at = Self::timestamp(&entry.created_at.unwrap_or_else(Utc::now));
        let last_modified = Self::timestamp(&Utc::now());

        tx.execute(
            "INSERT INTO entries (id, text, emotion, created_at, device_id) VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &entry.text,
                emotion.as_str(),
                created_at,
                device_id.to_string(),
            ),
        )
        .map_err(Self::sqlite_error)?;

        tx.execute(
            "UPDATE meta SET value = ? WHERE key = 'last_modified'",
            [last_modified],
        )
        .map_err(Self::sqlite_error)?;

        tx.commit().map_err(Self::sqlite_error)?;

        debug!(%id, %emotion, "inserted entry");
        Ok(id)
    }

    fn get_entry(&self, id: &Uuid) -> Result<Option<DiaryEntry>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM entries WHERE id = ?", ENTRY_COLUMNS);
        let row = conn
            .query_row(&sql, [id.to_string()], Self::read_row)
            .optional()
            .map_err(Self::sqlite_error)?;
        row.map(Self::entry_from_row).transpose()
    }

    fn find_by_prefix(&self, prefix: &str) -> Result<Option<DiaryEntry>> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
            return Err(MoodlogError::InvalidInput(format!(
                "Invalid entry ID: {}",
                prefix
            )));
        }

        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM entries WHERE substr(id, 1, ?) = ? LIMIT 2",
            ENTRY_COLUMNS
        );
        let length = prefix.len() as i64;
        let mut entries = Self::query_entries(&conn, &sql, &[&length, &prefix])?;
        match entries.len() {
            0 => Ok(None),
            1 => Ok(entries.pop()),
            _ => Err(MoodlogError::InvalidInput(format!(
                "Entry ID prefix \"{}\" is ambiguous",
                prefix
            ))),
        }
    }

    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<DiaryEntry>> {
        let conn = self.lock()?;

        let (clause, mut params) = Self::filter_clause(filter);
        let mut sql = format!(
            "SELECT {} FROM entries{} ORDER BY created_at DESC, rowid DESC",
            ENTRY_COLUMNS, clause
        );
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        Self::query_entries(&conn, &sql, &refs)
    }

    fn search_entries(&self, query: &str) -> Result<Vec<DiaryEntry>> {
        if query.is_empty() {
            return Err(MoodlogError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM entries WHERE instr(text, ?) > 0 ORDER BY created_at DESC, rowid DESC",
            ENTRY_COLUMNS
        );
        Self::query_entries(&conn, &sql, &[&query])
    }

    fn emotion_counts(&self, filter: &EntryFilter) -> Result<Vec<EmotionCount>> {
        let conn = self.lock()?;

        let (clause, params) = Self::filter_clause(filter);
        let sql = format!(
            "SELECT emotion, COUNT(*) FROM entries{} GROUP BY emotion",
            clause
        );
        let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql).map_err(Self::sqlite_error)?;
        let rows = stmt
            .query_map(refs.as_slice(), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(Self::sqlite_error)?;

        let mut counts: Vec<EmotionCount> = Emotion::ALL
            .into_iter()
            .map(|emotion| EmotionCount { emotion, count: 0 })
            .collect();
        for row in rows {
            let (tag, count) = row.map_err(Self::sqlite_error)?;
            let emotion: Emotion = tag
                .parse()
                .map_err(|e| MoodlogError::Storage(format!("Invalid stored emotion: {}", e)))?;
            if let Some(slot) = counts.iter_mut().find(|c| c.emotion == emotion) {
                slot.count = count as u64;
            }
        }
        Ok(counts)
    }

    fn check_integrity(&self) -> Result<()> {
        let conn = self.lock()?;

        let status: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(Self::sqlite_error)?;
        if status != "ok" {
            warn!(%status, "sqlite integrity check failed");
            return Err(MoodlogError::Storage(format!(
                "SQLite integrity check failed: {}",
                status
            )));
        }

        for key in REQUIRED_META_KEYS {
            Self::meta_value(&conn, key)?;
        }

        let mut stmt = conn
            .prepare("SELECT DISTINCT emotion FROM entries")
            .map_err(Self::sqlite_error)?;
        let tags = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(Self::sqlite_error)?;
        for tag in tags {
            let tag = tag.map_err(Self::sqlite_error)?;
            tag.parse::<Emotion>().map_err(|_| {
                MoodlogError::Validation(format!("Entry has unknown emotion \"{}\"", tag))
            })?;
        }

        let blank: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM entries WHERE trim(text) = ''",
                [],
                |row| row.get(0),
            )
            .map_err(Self::sqlite_error)?;
        if blank > 0 {
            return Err(MoodlogError::Validation(format!(
                "{} entries have empty text",
                blank
            )));
        }

        Ok(())
    }
}
