//! Environment variable fallbacks.
//!
//! Env vars are a **fallback**, not an override: they only apply to fields
//! that no config file set.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::merge::{ConfigLayer, FieldSources};

/// Kind of value an environment variable is coerced into.
#[derive(Clone, Copy)]
enum ValueKind {
    Bool,
    Integer,
    Text,
}

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: ValueKind,
}

/// All supported `FABRIC_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "FABRIC_EDIT_ITEM_DEFINITIONS",
        field_path: "definitions.edit_enabled",
        kind: ValueKind::Bool,
    },
    EnvMapping {
        var_name: "FABRIC_DEFINITION_SCHEME",
        field_path: "definitions.scheme",
        kind: ValueKind::Text,
    },
    EnvMapping {
        var_name: "FABRIC_ROLLBACK_ON_FAILURE",
        field_path: "definitions.rollback_on_failure",
        kind: ValueKind::Bool,
    },
    EnvMapping {
        var_name: "FABRIC_EVENT_CAPACITY",
        field_path: "definitions.event_capacity",
        kind: ValueKind::Integer,
    },
    EnvMapping {
        var_name: "FABRIC_LOG_LEVEL",
        field_path: "logging.level",
        kind: ValueKind::Text,
    },
    EnvMapping {
        var_name: "FABRIC_LOG_FORMAT",
        field_path: "logging.format",
        kind: ValueKind::Text,
    },
];

/// Snapshot the process environment, keeping only `FABRIC_*` variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("FABRIC_"))
        .collect()
}

/// Apply environment variable fallbacks to fields that were not set by any
/// config file layer.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }

        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        let Some(value) = coerce(mapping.kind, raw) else {
            warn!(
                var = mapping.var_name,
                value = raw.as_str(),
                "ignoring env var with unparseable value"
            );
            continue;
        };

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        set_field(merged, mapping.field_path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    count
}

fn coerce(kind: ValueKind, raw: &str) -> Option<toml::Value> {
    let trimmed = raw.trim();
    match kind {
        ValueKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(toml::Value::Boolean(true)),
            "0" | "false" | "no" | "off" => Some(toml::Value::Boolean(false)),
            _ => None,
        },
        ValueKind::Integer => trimmed.parse::<i64>().ok().map(toml::Value::Integer),
        ValueKind::Text => Some(toml::Value::String(trimmed.to_owned())),
    }
}

/// Set a dotted field in the TOML tree, creating intermediate tables.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut current = root;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_env_fills_default_fields() {
        let mut merged: toml::Value = toml::from_str("[definitions]\nedit_enabled = false").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("definitions.edit_enabled".into(), ConfigLayer::Defaults);

        let applied = apply_env_fallbacks(
            &mut merged,
            &mut sources,
            &env(&[("FABRIC_EDIT_ITEM_DEFINITIONS", "true")]),
        );

        assert_eq!(applied, 1);
        assert_eq!(merged["definitions"]["edit_enabled"].as_bool(), Some(true));
        assert_eq!(
            sources.get("definitions.edit_enabled"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_env_does_not_override_files() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".into(), ConfigLayer::User);

        let applied = apply_env_fallbacks(
            &mut merged,
            &mut sources,
            &env(&[("FABRIC_LOG_LEVEL", "trace")]),
        );

        assert_eq!(applied, 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_unparseable_values_are_skipped() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();

        let applied = apply_env_fallbacks(
            &mut merged,
            &mut sources,
            &env(&[
                ("FABRIC_EDIT_ITEM_DEFINITIONS", "maybe"),
                ("FABRIC_EVENT_CAPACITY", "many"),
            ]),
        );

        assert_eq!(applied, 0);
        assert!(merged.as_table().unwrap().is_empty());
    }

    #[test]
    fn test_creates_intermediate_tables() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();

        apply_env_fallbacks(
            &mut merged,
            &mut sources,
            &env(&[("FABRIC_EVENT_CAPACITY", "64")]),
        );

        assert_eq!(merged["definitions"]["event_capacity"].as_integer(), Some(64));
    }
}
