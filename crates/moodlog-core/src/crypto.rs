//! Passphrase rules for diary encryption.
//!
//! The diary file is encrypted with Age's passphrase mode (scrypt KDF), see
//! [`crate::storage::encryption`]. This module only decides which
//! passphrases are acceptable.

use crate::error::{MoodlogError, Result};

/// Minimum passphrase length in characters.
pub const MIN_PASSPHRASE_LENGTH: usize = 8;

/// Validate passphrase meets minimum requirements.
///
/// # Examples
///
/// ```
/// use moodlog_core::crypto::validate_passphrase;
///
/// assert!(validate_passphrase("my-secure-passphrase-123").is_ok());
/// assert!(validate_passphrase("short").is_err());
/// ```
pub fn validate_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.trim().is_empty() {
        return Err(MoodlogError::InvalidInput(
            "Passphrase cannot be empty".to_string(),
        ));
    }

    let length = passphrase.chars().count();
    if length < MIN_PASSPHRASE_LENGTH {
        return Err(MoodlogError::InvalidInput(format!(
            "Passphrase must be at least {} characters (got {})",
            MIN_PASSPHRASE_LENGTH, length
        )));
    }

    Ok(())
}
