//! Common types, envelope format, and errors shared across `fieldseal` crates.

pub mod envelope;
pub mod error;

pub use envelope::ENVELOPE_PREFIX;
pub use error::{FieldSealError, Result};
