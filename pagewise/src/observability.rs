//! Structured logging setup

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Error, error::Result};

/// Install a JSON `tracing` subscriber filtered by `config.log_level`
///
/// An unparsable filter directive falls back to `info`. Calling this twice
/// returns an error rather than replacing the first subscriber.
pub fn init_tracing(config: &Config) -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {e}")))?;

    tracing::info!(log_level = %config.log_level, "Tracing initialized");

    Ok(())
}
