//! Transparent encryption of sensitive record fields.
//!
//! Mark fields with `#[encrypted]`, derive [`SensitiveFields`], and let a
//! [`FieldEncryptionService`] encrypt them before storage and decrypt them
//! after retrieval:
//!
//! ```
//! use fieldseal::{CipherEngine, FieldEncryptionService, SensitiveFields};
//!
//! #[derive(SensitiveFields)]
//! struct Customer {
//!     name: String,
//!     #[encrypted]
//!     email: String,
//! }
//!
//! let engine = CipherEngine::from_parts(&[7u8; 32], &[9u8; 16])?;
//! let service = FieldEncryptionService::with_engine(engine);
//!
//! let mut customer = Customer { name: "Ada".into(), email: "ada@example.com".into() };
//! service.encrypt_record(&mut customer)?;
//! assert!(customer.email.starts_with("Enc|\n"));
//! assert_eq!(customer.name, "Ada");
//!
//! service.decrypt_record(&mut customer)?;
//! assert_eq!(customer.email, "ada@example.com");
//! # Ok::<(), fieldseal::FieldSealError>(())
//! ```

// Lets `#[derive(SensitiveFields)]` expand to `::fieldseal::...` paths inside
// this crate's own tests.
extern crate self as fieldseal;

pub mod config;
pub mod crypto;
pub mod fields;
pub mod service;
pub mod telemetry;

pub use crypto::{CipherEngine, ValueCipher, IV_LEN, KEY_LEN};
pub use fieldseal_common::{envelope, FieldSealError, ENVELOPE_PREFIX};
pub use fieldseal_derive::SensitiveFields;
pub use fields::{FieldCache, SensitiveField, SensitiveFields, TaggedSlot};
pub use service::FieldEncryptionService;
