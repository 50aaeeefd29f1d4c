//! Settings-backed feature flags.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fabric_config::{Config, DefinitionsSection};
use fabric_core::FeatureFlags;
use tracing::info;

/// Feature flags seeded from configuration and toggleable at runtime.
///
/// Clones share the flag, so a settings watcher can hold one clone and the
/// file system another.
#[derive(Debug, Clone, Default)]
pub struct SettingsFeatureFlags {
    edit_item_definitions: Arc<AtomicBool>,
}

impl SettingsFeatureFlags {
    /// Flags with editing set to `enabled`.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            edit_item_definitions: Arc::new(AtomicBool::new(enabled)),
        }
    }

    /// Flags seeded from `definitions.edit_enabled`.
    #[must_use]
    pub fn from_section(section: &DefinitionsSection) -> Self {
        Self::new(section.edit_enabled)
    }

    /// Flags seeded from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::from_section(&config.definitions)
    }

    /// Change the edit flag. Takes effect on the next write or delete.
    pub fn set_edit_item_definitions(&self, enabled: bool) {
        let previous = self.edit_item_definitions.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            info!(enabled, "item definition editing toggled");
        }
    }
}

impl FeatureFlags for SettingsFeatureFlags {
    fn is_edit_item_definitions_enabled(&self) -> bool {
        self.edit_item_definitions.load(Ordering::SeqCst)
    }
}
