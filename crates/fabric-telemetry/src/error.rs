//! Telemetry error types.

use thiserror::Error;

/// Errors raised while configuring telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The logging configuration is invalid.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// The global subscriber could not be installed.
    #[error("initialization error: {0}")]
    InitError(String),

    /// I/O failure while preparing log output.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
