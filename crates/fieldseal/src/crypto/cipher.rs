//! AES-256-CBC encryption and decryption of individual string values.
//!
//! **Algorithm choice:** AES-256-CBC with PKCS#7 padding under a single,
//! process-wide IV. Identical plaintext + key + IV always produces the same
//! envelope. This leaks equality of plaintexts and carries no authentication
//! tag; it is kept as-is because stored envelopes must keep decrypting.
//!
//! **Do NOT add a per-message nonce or switch the mode here.** Either change
//! breaks every envelope already persisted by the embedding application.

use std::sync::OnceLock;

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use fieldseal_common::{envelope, FieldSealError};
use tracing::info;

use super::key::{IvBytes, KeyBytes};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Value-level cipher used by the field encryption service.
///
/// [`CipherEngine`] is the production implementation.
#[cfg_attr(test, mockall::automock)]
pub trait ValueCipher: Send + Sync {
    /// Encrypt `plaintext` and return its envelope.
    fn encrypt(&self, plaintext: &str) -> Result<String, FieldSealError>;

    /// Decrypt an envelope back to plaintext.
    fn decrypt(&self, envelope: &str) -> Result<String, FieldSealError>;

    /// Returns `true` if `value` is an envelope.
    fn is_encrypted(&self, value: &str) -> Result<bool, FieldSealError>;

    /// Returns `true` once a key has been installed.
    fn has_key(&self) -> bool;

    /// Returns `true` once an IV has been installed.
    fn has_iv(&self) -> bool;
}

/// Holds the key material and performs raw envelope encrypt/decrypt.
///
/// Key and IV are set-once cells: after the first successful `set_*` call
/// they are immutable for the lifetime of the engine, and reads need no
/// synchronisation.
#[derive(Default)]
pub struct CipherEngine {
    key: OnceLock<KeyBytes>,
    iv: OnceLock<IvBytes>,
}

impl CipherEngine {
    /// Create an engine with no key material. `set_key` and `set_iv` must be
    /// called before it can encrypt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fully configured engine from raw key and IV bytes.
    ///
    /// # Errors
    ///
    /// Propagates the size and empty-input errors of [`set_key`](Self::set_key)
    /// and [`set_iv`](Self::set_iv).
    pub fn from_parts(key: &[u8], iv: &[u8]) -> Result<Self, FieldSealError> {
        let engine = Self::new();
        engine.set_key(key)?;
        engine.set_iv(iv)?;
        Ok(engine)
    }

    /// Build an engine from base64-encoded key material.
    ///
    /// `None` leaves that half unconfigured until set explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSealError::InvalidEncoding`] if either string is not
    /// valid base64, otherwise the errors of [`set_key`](Self::set_key) and
    /// [`set_iv`](Self::set_iv).
    pub fn from_base64(key: Option<&str>, iv: Option<&str>) -> Result<Self, FieldSealError> {
        let engine = Self::new();
        if let Some(key) = key {
            engine.set_key(&decode_base64(key)?)?;
        }
        if let Some(iv) = iv {
            engine.set_iv(&decode_base64(iv)?)?;
        }
        Ok(engine)
    }

    /// Install the 32-byte key.
    ///
    /// # Errors
    ///
    /// - [`FieldSealError::KeyAlreadySet`] if a key is already installed.
    /// - [`FieldSealError::NullInput`] if `key` is empty.
    /// - [`FieldSealError::InvalidKeySize`] if `key` is not 32 bytes.
    pub fn set_key(&self, key: &[u8]) -> Result<(), FieldSealError> {
        if self.has_key() {
            return Err(FieldSealError::KeyAlreadySet);
        }
        let key = KeyBytes::from_slice(key)?;
        self.key.set(key).map_err(|_| FieldSealError::KeyAlreadySet)?;
        info!("encryption key installed");
        Ok(())
    }

    /// Install the 16-byte IV.
    ///
    /// # Errors
    ///
    /// - [`FieldSealError::IvAlreadySet`] if an IV is already installed.
    /// - [`FieldSealError::NullInput`] if `iv` is empty.
    /// - [`FieldSealError::InvalidIvSize`] if `iv` is not 16 bytes.
    pub fn set_iv(&self, iv: &[u8]) -> Result<(), FieldSealError> {
        if self.has_iv() {
            return Err(FieldSealError::IvAlreadySet);
        }
        let iv = IvBytes::from_slice(iv)?;
        self.iv.set(iv).map_err(|_| FieldSealError::IvAlreadySet)?;
        info!("encryption iv installed");
        Ok(())
    }

    /// Returns `true` once a key has been installed.
    pub fn has_key(&self) -> bool {
        self.key.get().is_some()
    }

    /// Returns `true` once an IV has been installed.
    pub fn has_iv(&self) -> bool {
        self.iv.get().is_some()
    }

    /// Encrypt `plaintext` and wrap it in the `Enc|\n` envelope.
    ///
    /// # Errors
    ///
    /// - [`FieldSealError::EmptyInput`] if `plaintext` is empty.
    /// - [`FieldSealError::KeyNotConfigured`] / [`FieldSealError::IvNotConfigured`]
    ///   if key material is missing.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, FieldSealError> {
        if plaintext.is_empty() {
            return Err(FieldSealError::EmptyInput("value"));
        }
        let (key, iv) = self.key_material()?;

        let ciphertext = Aes256CbcEnc::new(key.as_array().into(), iv.as_array().into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        Ok(envelope::wrap(&STANDARD.encode(ciphertext)))
    }

    /// Strip the envelope from `value` and decrypt it.
    ///
    /// Bytes that are not valid UTF-8 after decryption are replaced with
    /// U+FFFD rather than rejected.
    ///
    /// # Errors
    ///
    /// - [`FieldSealError::EmptyInput`] if `value` or its payload is empty.
    /// - [`FieldSealError::NotEncrypted`] if `value` is not an envelope.
    /// - [`FieldSealError::InvalidEncoding`] if the payload is not base64.
    /// - [`FieldSealError::DecryptionFailed`] on a bad block length or padding.
    pub fn decrypt(&self, value: &str) -> Result<String, FieldSealError> {
        if !self.is_encrypted(value)? {
            return Err(FieldSealError::NotEncrypted);
        }
        let payload = envelope::payload(value).ok_or(FieldSealError::NotEncrypted)?;
        let ciphertext = decode_base64(payload)?;
        if ciphertext.is_empty() {
            return Err(FieldSealError::EmptyInput("ciphertext"));
        }
        let (key, iv) = self.key_material()?;

        let plaintext = Aes256CbcDec::new(key.as_array().into(), iv.as_array().into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| FieldSealError::DecryptionFailed)?;

        Ok(String::from_utf8_lossy(&plaintext).into_owned())
    }

    /// Returns `true` if `value` carries the envelope prefix. No decryption
    /// is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSealError::EmptyInput`] if `value` is empty.
    pub fn is_encrypted(&self, value: &str) -> Result<bool, FieldSealError> {
        if value.is_empty() {
            return Err(FieldSealError::EmptyInput("value"));
        }
        Ok(envelope::has_prefix(value))
    }

    fn key_material(&self) -> Result<(&KeyBytes, &IvBytes), FieldSealError> {
        let key = self.key.get().ok_or(FieldSealError::KeyNotConfigured)?;
        let iv = self.iv.get().ok_or(FieldSealError::IvNotConfigured)?;
        Ok((key, iv))
    }
}

impl ValueCipher for CipherEngine {
    fn encrypt(&self, plaintext: &str) -> Result<String, FieldSealError> {
        CipherEngine::encrypt(self, plaintext)
    }

    fn decrypt(&self, envelope: &str) -> Result<String, FieldSealError> {
        CipherEngine::decrypt(self, envelope)
    }

    fn is_encrypted(&self, value: &str) -> Result<bool, FieldSealError> {
        CipherEngine::is_encrypted(self, value)
    }

    fn has_key(&self) -> bool {
        CipherEngine::has_key(self)
    }

    fn has_iv(&self) -> bool {
        CipherEngine::has_iv(self)
    }
}

impl std::fmt::Debug for CipherEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherEngine")
            .field("has_key", &self.has_key())
            .field("has_iv", &self.has_iv())
            .finish()
    }
}

/// Decode standard base64, skipping ASCII whitespace anywhere in the input
/// (stored envelopes may carry line breaks or a trailing newline).
fn decode_base64(encoded: &str) -> Result<Vec<u8>, FieldSealError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| FieldSealError::InvalidEncoding(e.to_string()))
}
