//! Error types for Moodlog core operations.
//!
//! Classification and style lookup cannot fail; these errors cover the
//! boundaries around them (parsing tags, storage, encryption). The CLI layer
//! maps them to user-facing messages.

use thiserror::Error;

/// Result type alias for Moodlog operations.
pub type Result<T> = std::result::Result<T, MoodlogError>;

/// Core error type for Moodlog operations.
#[derive(Debug, Error)]
pub enum MoodlogError {
    /// Encryption or decryption error
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Wrong passphrase for an existing diary
    #[error("Incorrect passphrase")]
    IncorrectPassphrase,

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error (fallback)
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for MoodlogError {
    fn from(err: std::io::Error) -> Self {
        MoodlogError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for MoodlogError {
    fn from(err: serde_json::Error) -> Self {
        MoodlogError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_storage() {
        let err: MoodlogError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, MoodlogError::Storage(_)));
        assert_eq!(err.to_string(), "Storage error: gone");
    }

    #[test]
    fn test_json_error_maps_to_validation() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: MoodlogError = json_err.into();
        assert!(matches!(err, MoodlogError::Validation(_)));
    }
}
