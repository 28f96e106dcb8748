//! Structured logging setup for binaries embedding `fieldseal`.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the embedding application, or to [`init_telemetry`] for the
//! bundled operator binary.
//!
//! # Telemetry invariants
//!
//! - **No plaintext or key material** may appear in any span attribute or log
//!   field. Only record type names, field names and counts are logged.
//! - Log level is configurable via `FIELDSEAL_LOG_LEVEL` (default: `info`);
//!   `RUST_LOG` takes precedence when set.

pub mod init;

pub use init::init_telemetry;
