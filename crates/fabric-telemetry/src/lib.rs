//! Logging and activity tracking for the Fabric definition file system.
//!
//! This crate provides:
//! - Configurable logging setup with several output formats
//! - Activity contexts that wrap user-visible operations in a span
//!
//! # Example
//!
//! ```rust,no_run
//! use fabric_telemetry::{ActivityContext, LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), fabric_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("fabric_vfs=trace");
//! setup_logging(&config)?;
//!
//! let ctx = ActivityContext::new("fabric_vfs", "write_file")
//!     .with_metadata("artifactId", "a-1");
//! let _entered = ctx.span().entered();
//! tracing::info!("writing definition part");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{ActivityContext, ActivityGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging,
};
