//! Commonly used telemetry types.
//!
//! ```rust
//! use fabric_telemetry::prelude::*;
//!
//! let ctx = ActivityContext::new("fabric_vfs", "write_file");
//! assert_eq!(ctx.operation, "write_file");
//! ```

pub use crate::{
    ActivityContext, ActivityGuard, FileRotation, LogConfig, LogFormat, LogTarget, TelemetryError,
    TelemetryResult, setup_default_logging, setup_logging,
};
