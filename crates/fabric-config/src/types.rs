//! Configuration types.
//!
//! Every struct implements [`Default`] with the same values as the embedded
//! `defaults.toml`, so a bare `[section]` header produces a working
//! configuration.

use serde::{Deserialize, Serialize};

/// URI scheme the definition file system registers under by default.
pub const DEFAULT_SCHEME: &str = "fabric-definition";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Definition file system behaviour.
    pub definitions: DefinitionsSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// DefinitionsSection
// ---------------------------------------------------------------------------

/// Settings for the definition virtual file system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionsSection {
    /// Allow writes and deletes to be pushed back to the remote definition.
    pub edit_enabled: bool,
    /// URI scheme the file system is registered under.
    pub scheme: String,
    /// Restore cached state when a remote update fails. When off, the local
    /// cache may stay ahead of the server until the next full fetch.
    pub rollback_on_failure: bool,
    /// Buffer size of the file-change broadcast channel.
    pub event_capacity: usize,
}

impl Default for DefinitionsSection {
    fn default() -> Self {
        Self {
            edit_enabled: false,
            scheme: DEFAULT_SCHEME.to_owned(),
            rollback_on_failure: false,
            event_capacity: 256,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["fabric_vfs=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
