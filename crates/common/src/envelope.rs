//! Wire format of an encrypted value.
//!
//! ```text
//! Enc|\n<base64(ciphertext)>
//! ```
//!
//! The prefix is four visible characters followed by a newline and must be
//! reproduced byte for byte; previously stored values depend on it.

/// Literal prefix that marks a value as ciphertext.
pub const ENVELOPE_PREFIX: &str = "Enc|\n";

/// Returns `true` if `value` carries the envelope prefix.
///
/// No decoding or decryption is attempted.
pub fn has_prefix(value: &str) -> bool {
    value.starts_with(ENVELOPE_PREFIX)
}

/// Return the base64 payload following the prefix, or `None` for plaintext.
pub fn payload(value: &str) -> Option<&str> {
    value.strip_prefix(ENVELOPE_PREFIX)
}

/// Wrap an already base64-encoded payload in the envelope.
pub fn wrap(encoded: &str) -> String {
    format!("{ENVELOPE_PREFIX}{encoded}")
}
