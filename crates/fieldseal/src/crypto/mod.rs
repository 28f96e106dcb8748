//! AES-256-CBC value encryption primitives.
//!
//! This module is intentionally free of record and field-discovery logic.
//! It provides the low-level encrypt/decrypt operations used by the field
//! encryption service.
//!
//! # Ciphertext format
//!
//! ```text
//! Enc|\n<base64(ciphertext)>
//! ```
//!
//! The prefix lets stored values be told apart from plaintext without
//! attempting decryption.

pub mod cipher;
pub mod key;

pub use cipher::{CipherEngine, ValueCipher};
pub use key::{IV_LEN, KEY_LEN};

#[cfg(test)]
pub use cipher::MockValueCipher;
