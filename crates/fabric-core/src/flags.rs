//! Feature-flag contract.

/// Feature flags consulted by the definition file system.
///
/// Implementations must be cheap to query: the flag is polled on every
/// mutating call and never cached by callers.
pub trait FeatureFlags: Send + Sync {
    /// Whether item definitions may be edited in place.
    fn is_edit_item_definitions_enabled(&self) -> bool;
}

