//! Configuration loading and validation.
//!
//! All values are read from `FIELDSEAL_`-prefixed environment variables. Key
//! material is optional: an engine built without it stays unconfigured until
//! the embedding application calls `set_key` / `set_iv`.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::crypto::CipherEngine;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "FIELDSEAL";

/// Validated fieldseal configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Base64-encoded 32-byte AES key (`FIELDSEAL_ENCRYPTION_KEY`).
    #[serde(default)]
    pub encryption_key: Option<String>,

    /// Base64-encoded 16-byte IV (`FIELDSEAL_ENCRYPTION_IV`).
    #[serde(default)]
    pub encryption_iv: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn from_source(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Build a [`CipherEngine`] from the configured key material.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or IV is not valid base64 or has the wrong
    /// decoded length.
    pub fn build_engine(&self) -> Result<CipherEngine> {
        CipherEngine::from_base64(self.encryption_key.as_deref(), self.encryption_iv.as_deref())
            .context("invalid encryption key material")
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_not_blank(self.encryption_key.as_deref(), "FIELDSEAL_ENCRYPTION_KEY")?;
        ensure_not_blank(self.encryption_iv.as_deref(), "FIELDSEAL_ENCRYPTION_IV")?;
        if self.log_level.trim().is_empty() {
            anyhow::bail!("FIELDSEAL_LOG_LEVEL must not be empty");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "[REDACTED]"))
            .field("encryption_iv", &self.encryption_iv.as_ref().map(|_| "[REDACTED]"))
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn ensure_not_blank(value: Option<&str>, name: &str) -> Result<()> {
    if matches!(value, Some(v) if v.trim().is_empty()) {
        anyhow::bail!("{name} must not be blank when set");
    }
    Ok(())
}
