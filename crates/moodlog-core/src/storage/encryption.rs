//! Passphrase sealing for diary files.
//!
//! A diary file is one age payload with a single scrypt recipient. The
//! passphrase stays inside a [`DiaryKey`] for as long as the diary is open.

use std::fmt;
use std::io::{Read, Write};
use std::iter;

use age::secrecy::SecretString;

use crate::error::{MoodlogError, Result};

/// Passphrase that seals and unseals one diary file.
///
/// # Examples
///
/// ```
/// use moodlog_core::storage::encryption::DiaryKey;
///
/// let key = DiaryKey::new("my-secure-passphrase");
/// let sealed = key.seal(b"secret diary").unwrap();
/// assert_ne!(sealed.as_slice(), b"secret diary");
/// assert_eq!(key.unseal(&sealed).unwrap(), b"secret diary");
/// ```
#[derive(Clone)]
pub struct DiaryKey {
    passphrase: SecretString,
}

impl fmt::Debug for DiaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DiaryKey([REDACTED])")
    }
}

impl DiaryKey {
    pub fn new(passphrase: &str) -> Self {
        Self {
            passphrase: SecretString::from(passphrase.to_owned()),
        }
    }

    /// Encrypt a serialized diary.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let encryptor = age::Encryptor::with_user_passphrase(self.passphrase.clone());

        let mut sealed = Vec::with_capacity(plaintext.len() + 256);
        let mut writer = encryptor
            .wrap_output(&mut sealed)
            .map_err(|e| seal_error("start", e))?;
        writer
            .write_all(plaintext)
            .map_err(|e| seal_error("write", e))?;
        writer.finish().map_err(|e| seal_error("finish", e))?;

        Ok(sealed)
    }

    /// Decrypt a diary file's contents.
    ///
    /// # Errors
    ///
    /// Returns `MoodlogError::IncorrectPassphrase` when the passphrase does not
    /// match, `MoodlogError::Crypto` when the bytes are not a passphrase-sealed
    /// diary or are damaged.
    pub fn unseal(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        let decryptor = age::Decryptor::new(sealed)
            .map_err(|e| MoodlogError::Crypto(format!("Not a diary file: {}", e)))?;
        if !decryptor.is_scrypt() {
            return Err(MoodlogError::Crypto(
                "Diary file is not passphrase-encrypted".to_string(),
            ));
        }

        let identity = age::scrypt::Identity::new(self.passphrase.clone());
        let mut reader = decryptor
            .decrypt(iter::once(&identity as &dyn age::Identity))
            .map_err(|e| match e {
                age::DecryptError::NoMatchingKeys
                | age::DecryptError::DecryptionFailed
                | age::DecryptError::KeyDecryptionFailed => MoodlogError::IncorrectPassphrase,
                other => MoodlogError::Crypto(format!("Diary file is damaged: {}", other)),
            })?;

        let mut plaintext = Vec::new();
        reader
            .read_to_end(&mut plaintext)
            .map_err(|e| MoodlogError::Crypto(format!("Diary file is damaged: {}", e)))?;
        Ok(plaintext)
    }
}

fn seal_error(stage: &str, err: impl fmt::Display) -> MoodlogError {
    MoodlogError::Crypto(format!("Failed to seal diary ({}): {}", stage, err))
}
