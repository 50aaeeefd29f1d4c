//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Upper bound for the change-event channel buffer.
const MAX_EVENT_CAPACITY: usize = 65_536;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_definitions(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_definitions(config: &Config) -> ConfigResult<()> {
    let d = &config.definitions;

    if !is_valid_scheme(&d.scheme) {
        return Err(ConfigError::ValidationError {
            field: "definitions.scheme".to_owned(),
            message: format!(
                "'{}' is not a valid URI scheme; it must start with a letter and contain only letters, digits, '+', '-' or '.'",
                d.scheme
            ),
        });
    }

    if d.event_capacity == 0 || d.event_capacity > MAX_EVENT_CAPACITY {
        return Err(ConfigError::ValidationError {
            field: "definitions.event_capacity".to_owned(),
            message: format!("event_capacity must be between 1 and {MAX_EVENT_CAPACITY}"),
        });
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    Ok(())
}

/// RFC 3986: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
