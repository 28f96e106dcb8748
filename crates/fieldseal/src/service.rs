//! [`FieldEncryptionService`]: applies a [`ValueCipher`] to the sensitive
//! fields of records and to loose values.
//!
//! Every operation is idempotent: values already in the target state are
//! passed through untouched, so repeated encrypt or decrypt calls never
//! double-wrap or fail on plaintext.

use std::sync::Arc;

use fieldseal_common::FieldSealError;
use tracing::{debug, warn};

use crate::crypto::{CipherEngine, ValueCipher};
use crate::fields::{FieldCache, SensitiveFields};

/// Encrypts and decrypts the `#[encrypted]` fields of records.
///
/// Cheap to clone; clones share the cipher and the field cache.
#[derive(Clone)]
pub struct FieldEncryptionService {
    cipher: Arc<dyn ValueCipher>,
    fields: FieldCache,
}

#[derive(Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

impl FieldEncryptionService {
    /// Create a service backed by `cipher`.
    pub fn new(cipher: Arc<dyn ValueCipher>) -> Self {
        Self {
            cipher,
            fields: FieldCache::new(),
        }
    }

    /// Create a service that owns `engine`.
    pub fn with_engine(engine: CipherEngine) -> Self {
        Self::new(Arc::new(engine))
    }

    /// The per-type sensitive-field cache used by this service.
    pub fn field_cache(&self) -> &FieldCache {
        &self.fields
    }

    /// Encrypt every non-empty plaintext sensitive field of `record` in place.
    ///
    /// Empty, absent and already-encrypted fields are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSealError::KeyNotConfigured`] if the cipher has no key.
    /// A cipher error on any field aborts the call; fields processed before
    /// it stay encrypted.
    pub fn encrypt_record<'r, R: SensitiveFields>(
        &self,
        record: &'r mut R,
    ) -> Result<&'r mut R, FieldSealError> {
        self.transform_record(record, Direction::Encrypt)
    }

    /// Decrypt every non-empty envelope sensitive field of `record` in place.
    ///
    /// Empty, absent and plaintext fields are left untouched.
    ///
    /// # Errors
    ///
    /// Same as [`encrypt_record`](Self::encrypt_record).
    pub fn decrypt_record<'r, R: SensitiveFields>(
        &self,
        record: &'r mut R,
    ) -> Result<&'r mut R, FieldSealError> {
        self.transform_record(record, Direction::Decrypt)
    }

    /// Encrypt a single value, returning it unchanged if it is already an
    /// envelope.
    ///
    /// # Errors
    ///
    /// - [`FieldSealError::NullInput`] if `value` is empty.
    /// - [`FieldSealError::KeyNotConfigured`] if the cipher has no key.
    pub fn encrypt_value(&self, value: &str) -> Result<String, FieldSealError> {
        self.ensure_ready(value)?;
        if self.cipher.is_encrypted(value)? {
            return Ok(value.to_owned());
        }
        self.cipher.encrypt(value)
    }

    /// Decrypt a single value, returning it unchanged if it is not an
    /// envelope.
    ///
    /// # Errors
    ///
    /// - [`FieldSealError::NullInput`] if `value` is empty.
    /// - [`FieldSealError::KeyNotConfigured`] if the cipher has no key.
    pub fn decrypt_value(&self, value: &str) -> Result<String, FieldSealError> {
        self.ensure_ready(value)?;
        if !self.cipher.is_encrypted(value)? {
            return Ok(value.to_owned());
        }
        self.cipher.decrypt(value)
    }

    /// Returns `true` if `value` is an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`FieldSealError::NullInput`] if `value` is empty.
    pub fn is_value_encrypted(&self, value: &str) -> Result<bool, FieldSealError> {
        if value.is_empty() {
            return Err(FieldSealError::NullInput("value"));
        }
        self.cipher.is_encrypted(value)
    }

    fn ensure_ready(&self, value: &str) -> Result<(), FieldSealError> {
        if value.is_empty() {
            return Err(FieldSealError::NullInput("value"));
        }
        if !self.cipher.has_key() {
            return Err(FieldSealError::KeyNotConfigured);
        }
        Ok(())
    }

    fn transform_record<'r, R: SensitiveFields>(
        &self,
        record: &'r mut R,
        direction: Direction,
    ) -> Result<&'r mut R, FieldSealError> {
        if !self.cipher.has_key() {
            return Err(FieldSealError::KeyNotConfigured);
        }

        let fields = self.fields.fields::<R>();
        let mut transformed = 0usize;

        for field in fields.iter() {
            let Some(slot) = field.slot(record) else {
                continue;
            };
            if slot.is_empty() {
                continue;
            }

            let result = match direction {
                Direction::Encrypt => self.encrypt_slot(slot),
                Direction::Decrypt => self.decrypt_slot(slot),
            };
            match result {
                Ok(true) => transformed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        record = std::any::type_name::<R>(),
                        field = field.name(),
                        error = %e,
                        "sensitive field transform failed"
                    );
                    return Err(e);
                }
            }
        }

        debug!(
            record = std::any::type_name::<R>(),
            transformed,
            encrypt = matches!(direction, Direction::Encrypt),
            "record fields processed"
        );
        Ok(record)
    }

    fn encrypt_slot(&self, slot: &mut String) -> Result<bool, FieldSealError> {
        if self.cipher.is_encrypted(slot)? {
            return Ok(false);
        }
        *slot = self.cipher.encrypt(slot)?;
        Ok(true)
    }

    fn decrypt_slot(&self, slot: &mut String) -> Result<bool, FieldSealError> {
        if !self.cipher.is_encrypted(slot)? {
            return Ok(false);
        }
        *slot = self.cipher.decrypt(slot)?;
        Ok(true)
    }
}

impl std::fmt::Debug for FieldEncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldEncryptionService")
            .field("has_key", &self.cipher.has_key())
            .field("fields", &self.fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::crypto::MockValueCipher;
    use crate::fields::{SensitiveField, TaggedSlot};

    #[derive(Debug)]
    struct Card {
        number: String,
        holder: Option<String>,
        label: String,
    }

    impl SensitiveFields for Card {
        fn sensitive_fields() -> Vec<SensitiveField<Self>> {
            vec![
                SensitiveField::new("number", |c: &mut Card| TaggedSlot::slot(&mut c.number)),
                SensitiveField::new("holder", |c: &mut Card| TaggedSlot::slot(&mut c.holder)),
            ]
        }
    }

    fn card() -> Card {
        Card {
            number: "4111111111111111".into(),
            holder: Some("Alice".into()),
            label: "4111111111111111".into(),
        }
    }

    fn keyed_mock() -> MockValueCipher {
        let mut mock = MockValueCipher::new();
        mock.expect_has_key().return_const(true);
        mock.expect_is_encrypted()
            .returning(|v| Ok(v.starts_with("Enc|\n")));
        mock
    }

    #[test]
    fn unkeyed_cipher_rejects_everything() {
        let mut mock = MockValueCipher::new();
        mock.expect_has_key().return_const(false);
        mock.expect_encrypt().never();
        let svc = FieldEncryptionService::new(Arc::new(mock));

        let mut c = card();
        assert_eq!(
            svc.encrypt_record(&mut c).unwrap_err(),
            FieldSealError::KeyNotConfigured
        );
        assert_eq!(
            svc.decrypt_record(&mut c).unwrap_err(),
            FieldSealError::KeyNotConfigured
        );
        assert_eq!(
            svc.encrypt_value("x").unwrap_err(),
            FieldSealError::KeyNotConfigured
        );
        assert_eq!(
            svc.decrypt_value("x").unwrap_err(),
            FieldSealError::KeyNotConfigured
        );
    }

    #[test]
    fn empty_value_is_null_input() {
        let svc = FieldEncryptionService::new(Arc::new(keyed_mock()));
        assert_eq!(svc.encrypt_value(""), Err(FieldSealError::NullInput("value")));
        assert_eq!(svc.decrypt_value(""), Err(FieldSealError::NullInput("value")));
        assert_eq!(svc.is_value_encrypted(""), Err(FieldSealError::NullInput("value")));
    }

    #[test]
    fn encrypt_record_touches_only_marked_fields() {
        let mut mock = keyed_mock();
        mock.expect_encrypt()
            .times(2)
            .returning(|v| Ok(format!("Enc|\n<{v}>")));
        let svc = FieldEncryptionService::new(Arc::new(mock));

        let mut c = card();
        svc.encrypt_record(&mut c).unwrap();
        assert_eq!(c.number, "Enc|\n<4111111111111111>");
        assert_eq!(c.holder.as_deref(), Some("Enc|\n<Alice>"));
        assert_eq!(c.label, "4111111111111111");
    }

    #[test]
    fn encrypt_record_skips_empty_and_encrypted_fields() {
        let mut mock = keyed_mock();
        mock.expect_encrypt().never();
        let svc = FieldEncryptionService::new(Arc::new(mock));

        let mut c = Card {
            number: "Enc|\nAAAA".into(),
            holder: None,
            label: String::new(),
        };
        svc.encrypt_record(&mut c).unwrap();
        assert_eq!(c.number, "Enc|\nAAAA");
        assert!(c.holder.is_none());

        c.holder = Some(String::new());
        svc.encrypt_record(&mut c).unwrap();
        assert_eq!(c.holder.as_deref(), Some(""));
    }

    #[test]
    fn decrypt_record_skips_plaintext_fields() {
        let mut mock = keyed_mock();
        mock.expect_decrypt()
            .with(eq("Enc|\nBBBB"))
            .times(1)
            .returning(|_| Ok("Alice".into()));
        let svc = FieldEncryptionService::new(Arc::new(mock));

        let mut c = Card {
            number: "4111111111111111".into(),
            holder: Some("Enc|\nBBBB".into()),
            label: "x".into(),
        };
        svc.decrypt_record(&mut c).unwrap();
        assert_eq!(c.number, "4111111111111111");
        assert_eq!(c.holder.as_deref(), Some("Alice"));
    }

    #[test]
    fn field_failure_aborts_record() {
        let mut mock = keyed_mock();
        mock.expect_decrypt()
            .times(1)
            .returning(|_| Err(FieldSealError::DecryptionFailed));
        let svc = FieldEncryptionService::new(Arc::new(mock));

        let mut c = Card {
            number: "Enc|\ncorrupt".into(),
            holder: Some("Enc|\nBBBB".into()),
            label: "x".into(),
        };
        assert_eq!(
            svc.decrypt_record(&mut c).unwrap_err(),
            FieldSealError::DecryptionFailed
        );
        // The second field is never reached.
        assert_eq!(c.holder.as_deref(), Some("Enc|\nBBBB"));
    }

    #[test]
    fn value_passthrough_in_target_state() {
        let mut mock = keyed_mock();
        mock.expect_encrypt().never();
        mock.expect_decrypt().never();
        let svc = FieldEncryptionService::new(Arc::new(mock));

        assert_eq!(svc.encrypt_value("Enc|\nAAAA").unwrap(), "Enc|\nAAAA");
        assert_eq!(svc.decrypt_value("plain").unwrap(), "plain");
        assert!(svc.is_value_encrypted("Enc|\nAAAA").unwrap());
        assert!(!svc.is_value_encrypted("plain").unwrap());
    }

    #[test]
    fn record_discovery_is_cached() {
        let mut mock = keyed_mock();
        mock.expect_encrypt().returning(|v| Ok(format!("Enc|\n{v}")));
        let svc = FieldEncryptionService::new(Arc::new(mock));

        assert!(!svc.field_cache().contains::<Card>());
        svc.encrypt_record(&mut card()).unwrap();
        assert!(svc.field_cache().contains::<Card>());
        assert_eq!(svc.field_cache().len(), 1);
    }
}
