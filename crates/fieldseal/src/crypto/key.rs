//! [`KeyBytes`] and [`IvBytes`]: fixed-size holders for the engine's key material.

use fieldseal_common::FieldSealError;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-CBC initialisation vector (16 bytes = 128 bits).
pub const IV_LEN: usize = 16;

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// When this type is dropped, the memory is overwritten with zeroes.
pub struct KeyBytes(Box<[u8; KEY_LEN]>);

/// Fixed-size IV buffer that holds exactly [`IV_LEN`] bytes.
pub struct IvBytes([u8; IV_LEN]);

impl KeyBytes {
    /// Copy `bytes` into a new key buffer.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSealError::NullInput`] for an empty slice and
    /// [`FieldSealError::InvalidKeySize`] for any other length mismatch.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FieldSealError> {
        if bytes.is_empty() {
            return Err(FieldSealError::NullInput("key"));
        }
        if bytes.len() != KEY_LEN {
            return Err(FieldSealError::InvalidKeySize(bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    pub(crate) fn as_array(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl IvBytes {
    /// Copy `bytes` into a new IV buffer.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSealError::NullInput`] for an empty slice and
    /// [`FieldSealError::InvalidIvSize`] for any other length mismatch.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FieldSealError> {
        if bytes.is_empty() {
            return Err(FieldSealError::NullInput("iv"));
        }
        if bytes.len() != IV_LEN {
            return Err(FieldSealError::InvalidIvSize(bytes.len()));
        }
        let mut buf = [0u8; IV_LEN];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    pub(crate) fn as_array(&self) -> &[u8; IV_LEN] {
        &self.0
    }
}

/// Overwrite `bytes` with zeroes.
fn wipe(bytes: &mut [u8]) {
    bytes.fill(0);
}

impl Drop for KeyBytes {
    fn drop(&mut self) {
        wipe(&mut self.0[..]);
    }
}

impl Drop for IvBytes {
    fn drop(&mut self) {
        wipe(&mut self.0);
    }
}

// Only the length is shown; the bytes never reach a formatter.
impl std::fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyBytes").field("len", &KEY_LEN).finish_non_exhaustive()
    }
}

impl std::fmt::Debug for IvBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IvBytes").field("len", &IV_LEN).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_accepts_exact_length() {
        let key = KeyBytes::from_slice(&[0x42u8; KEY_LEN]).unwrap();
        assert_eq!(key.as_array(), &[0x42u8; KEY_LEN]);
    }

    #[test]
    fn key_rejects_off_by_one() {
        assert_eq!(
            KeyBytes::from_slice(&[0u8; 31]).unwrap_err(),
            FieldSealError::InvalidKeySize(31)
        );
        assert_eq!(
            KeyBytes::from_slice(&[0u8; 33]).unwrap_err(),
            FieldSealError::InvalidKeySize(33)
        );
    }

    #[test]
    fn iv_rejects_off_by_one() {
        assert_eq!(
            IvBytes::from_slice(&[0u8; 15]).unwrap_err(),
            FieldSealError::InvalidIvSize(15)
        );
        assert_eq!(
            IvBytes::from_slice(&[0u8; 17]).unwrap_err(),
            FieldSealError::InvalidIvSize(17)
        );
    }

    #[test]
    fn empty_slices_are_null_input() {
        assert_eq!(KeyBytes::from_slice(&[]).unwrap_err(), FieldSealError::NullInput("key"));
        assert_eq!(IvBytes::from_slice(&[]).unwrap_err(), FieldSealError::NullInput("iv"));
    }

    #[test]
    fn key_material_redacted_in_debug() {
        let key = KeyBytes::from_slice(&[0xFFu8; KEY_LEN]).unwrap();
        let iv = IvBytes::from_slice(&[0xFFu8; IV_LEN]).unwrap();
        assert_eq!(format!("{key:?}"), "KeyBytes { len: 32, .. }");
        assert_eq!(format!("{iv:?}"), "IvBytes { len: 16, .. }");
        assert!(!format!("{key:?}{iv:?}").contains("255"));
    }

    #[test]
    fn wipe_zeroes_every_byte() {
        let mut buf = [0xA5u8; KEY_LEN];
        wipe(&mut buf);
        assert_eq!(buf, [0u8; KEY_LEN]);
    }
}
