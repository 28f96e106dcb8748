//! Common error types shared across crates.

use thiserror::Error;

/// Error taxonomy for the cipher engine and the field encryption service.
///
/// Variants never carry plaintext or key bytes; only lengths, argument names
/// and static descriptions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldSealError {
    /// A required argument was absent.
    #[error("argument `{0}` is required")]
    NullInput(&'static str),

    /// A required argument was present but empty.
    #[error("argument `{0}` cannot be empty")]
    EmptyInput(&'static str),

    /// The key is not exactly 32 bytes.
    #[error("incorrect key size {0}, expected 32")]
    InvalidKeySize(usize),

    /// The IV is not exactly 16 bytes.
    #[error("incorrect iv size {0}, expected 16")]
    InvalidIvSize(usize),

    /// `set_key` was called on an engine that already holds a key.
    #[error("key is already set")]
    KeyAlreadySet,

    /// `set_iv` was called on an engine that already holds an IV.
    #[error("iv has already been set")]
    IvAlreadySet,

    /// An encrypt/decrypt was attempted before a key was configured.
    #[error("encryption key is not configured")]
    KeyNotConfigured,

    /// An encrypt/decrypt was attempted before an IV was configured.
    #[error("encryption iv is not configured")]
    IvNotConfigured,

    /// Decrypt was attempted on a value without the envelope prefix.
    #[error("data is not encrypted or not in a supported format")]
    NotEncrypted,

    /// Base64 in the envelope payload or in configured key material is invalid.
    #[error("invalid base64 encoding: {0}")]
    InvalidEncoding(String),

    /// The block cipher rejected the ciphertext (bad length or padding).
    #[error("decryption failed")]
    DecryptionFailed,
}

impl FieldSealError {
    /// Returns `true` for errors caused by a misconfigured engine rather than
    /// by the value being processed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FieldSealError::InvalidKeySize(_)
                | FieldSealError::InvalidIvSize(_)
                | FieldSealError::KeyAlreadySet
                | FieldSealError::IvAlreadySet
                | FieldSealError::KeyNotConfigured
                | FieldSealError::IvNotConfigured
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, FieldSealError>;
