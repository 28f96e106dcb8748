//! `fieldseal` — operator binary for one-off value encryption.
//!
//! Usage: `fieldseal <encrypt|decrypt|check> <value>`
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from `FIELDSEAL_*` environment variables.
//! 2. Initialise structured JSON logging on stderr.
//! 3. Build the cipher engine and the field encryption service.
//! 4. Run the requested command and print the result to stdout.
//!
//! This binary is operator tooling and not part of the library API; it only
//! calls the public `fieldseal` surface.

use anyhow::{Context, Result};
use tracing::{error, info};

use fieldseal::config::Config;
use fieldseal::{telemetry, FieldEncryptionService, FieldSealError};

const USAGE: &str = "usage: fieldseal <encrypt|decrypt|check> <value>";

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(&cfg.log_level)?;

    // -----------------------------------------------------------------------
    // 3. Engine + service
    // -----------------------------------------------------------------------
    let engine = cfg.build_engine()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        has_key = engine.has_key(),
        has_iv = engine.has_iv(),
        "fieldseal starting"
    );
    let service = FieldEncryptionService::with_engine(engine);

    // -----------------------------------------------------------------------
    // 4. Command
    // -----------------------------------------------------------------------
    let mut args = std::env::args().skip(1);
    let command = args.next().context(USAGE)?;
    let value = args.next().context(USAGE)?;

    let output = match command.as_str() {
        "encrypt" => service.encrypt_value(&value),
        "decrypt" => service.decrypt_value(&value),
        "check" => service.is_value_encrypted(&value).map(|b| b.to_string()),
        other => anyhow::bail!("unknown command `{other}`; {USAGE}"),
    }
    .map_err(|e| {
        error!(command = %command, error = %e, "command failed");
        command_error(e)
    })?;

    println!("{output}");
    Ok(())
}

/// Wrap a library error for exit reporting. Key-material problems get a
/// pointer at the environment variables that supply it.
fn command_error(err: FieldSealError) -> anyhow::Error {
    if err.is_configuration() {
        anyhow::Error::new(err)
            .context("check FIELDSEAL_ENCRYPTION_KEY and FIELDSEAL_ENCRYPTION_IV")
    } else {
        anyhow::Error::new(err)
    }
}
