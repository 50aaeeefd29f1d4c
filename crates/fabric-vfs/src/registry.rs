//! Scheme-based dispatch to file system providers.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::info;
use url::Url;

use crate::FileSystemProvider;
use crate::error::{FsError, FsResult};

/// What a provider supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapabilities {
    /// Paths differing only in case name different files.
    pub is_case_sensitive: bool,
    /// Mutations are always refused.
    pub is_readonly: bool,
}

struct Registration {
    provider: Arc<dyn FileSystemProvider>,
    capabilities: ProviderCapabilities,
}

/// Maps URI schemes to the providers that serve them.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: DashMap<String, Registration>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` for `scheme`.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::SchemeInUse`] if another provider already serves
    /// the scheme.
    pub fn register(
        &self,
        scheme: &str,
        provider: Arc<dyn FileSystemProvider>,
        capabilities: ProviderCapabilities,
    ) -> FsResult<()> {
        match self.providers.entry(scheme.to_owned()) {
            Entry::Occupied(_) => Err(FsError::SchemeInUse(scheme.to_owned())),
            Entry::Vacant(entry) => {
                entry.insert(Registration {
                    provider,
                    capabilities,
                });
                info!(scheme, ?capabilities, "registered file system provider");
                Ok(())
            },
        }
    }

    /// Remove the provider for `scheme`. Returns whether one was registered.
    pub fn unregister(&self, scheme: &str) -> bool {
        self.providers.remove(scheme).is_some()
    }

    /// Provider serving `uri`'s scheme.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] if no provider serves the scheme.
    pub fn provider_for(&self, uri: &Url) -> FsResult<Arc<dyn FileSystemProvider>> {
        self.providers
            .get(uri.scheme())
            .map(|r| Arc::clone(&r.provider))
            .ok_or_else(|| FsError::NotFound(format!("no provider for scheme '{}'", uri.scheme())))
    }

    /// Capabilities registered for `scheme`.
    #[must_use]
    pub fn capabilities(&self, scheme: &str) -> Option<ProviderCapabilities> {
        self.providers.get(scheme).map(|r| r.capabilities)
    }

    /// Registered schemes, sorted.
    #[must_use]
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.providers.iter().map(|r| r.key().clone()).collect();
        schemes.sort();
        schemes
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}
