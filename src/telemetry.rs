//! Tracing subscriber setup for binaries.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive did not parse.
    #[error("invalid log filter {directive:?}: {source}")]
    InvalidFilter {
        /// Offending directive.
        directive: String,
        /// Parser error.
        source: tracing_subscriber::filter::ParseError,
    },
    /// A global subscriber is already installed.
    #[error(transparent)]
    AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs a formatting subscriber.
///
/// `RUST_LOG` wins over `fallback_directive` when set.
///
/// # Errors
///
/// Returns [`TelemetryError`] for a malformed directive or when a subscriber
/// is already installed.
pub fn init_tracing(fallback_directive: &str) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_directive))
        .map_err(|source| TelemetryError::InvalidFilter {
            directive: fallback_directive.to_owned(),
            source,
        })?;
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()?;
    Ok(())
}
