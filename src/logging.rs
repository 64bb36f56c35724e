//! Structured logging on stderr via `tracing-subscriber`.
//!
//! Resolution order for the filter: `RUST_LOG`, then the configured level.
//! Stdout is left to command output.

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::MendError;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive: `trace`, `debug`, `info`, `warn`, `error`, `off`,
    /// or any `EnvFilter` expression such as `mend=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: LogFormat::Text }
    }
}

/// Builds the filter for `config`, letting `RUST_LOG` win when set.
///
/// # Errors
///
/// Returns [`MendError::Config`] if the configured level does not parse.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, MendError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| MendError::Config(format!("invalid log level `{}`: {e}", config.level)))
}

/// Installs the global subscriber. A second call is a no-op, so tests and
/// embedding callers may call it freely.
///
/// # Errors
///
/// Returns [`MendError::Config`] if the level does not parse.
pub fn init_logging(config: &LoggingConfig) -> Result<(), MendError> {
    let filter = build_filter(config)?;
    let registry = Registry::default().with(filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("global subscriber already installed");
    }
    Ok(())
}
