//! Single-flight coalescing of whole-definition fetches.
//!
//! At most one fetch per artifact is outstanding at any time. Callers that
//! arrive while a fetch is running join it instead of starting their own.
//! The entry is removed by the fetch future itself when it finishes or is
//! dropped, so it never outlives the fetch.

use std::future::Future;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use fabric_core::ArtifactKey;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

/// Result of a whole-definition fetch, shared by every joined caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchOutcome {
    /// The definition was fetched and registered.
    Loaded,
    /// A cached definition was reused without a network call.
    Reused,
    /// The fetch failed or returned no definition.
    Failed,
}

type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

/// How a caller got hold of a fetch.
pub(crate) enum Flight {
    /// This caller started the fetch.
    Started(SharedFetch),
    /// A fetch was already running and this caller joined it.
    Joined(SharedFetch),
}

impl Flight {
    pub(crate) async fn wait(self) -> FetchOutcome {
        match self {
            Self::Started(fetch) | Self::Joined(fetch) => fetch.await,
        }
    }
}

/// Registry of outstanding fetches keyed by artifact.
#[derive(Default)]
pub(crate) struct InFlightFetches {
    fetches: Arc<DashMap<ArtifactKey, SharedFetch>>,
}

impl InFlightFetches {
    /// Join the fetch running for `key`, or start one with `start`.
    ///
    /// `start` is only called when no fetch is running. It must not block:
    /// it runs while the registry entry is locked.
    pub(crate) fn join_or_start<F, Fut>(&self, key: &ArtifactKey, start: F) -> Flight
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchOutcome> + Send + 'static,
    {
        match self.fetches.entry(key.clone()) {
            Entry::Occupied(entry) => Flight::Joined(entry.get().clone()),
            Entry::Vacant(entry) => {
                let guard = RemoveOnDrop {
                    fetches: Arc::downgrade(&self.fetches),
                    key: key.clone(),
                };
                let work = start();
                let shared = async move {
                    let _guard = guard;
                    work.await
                }
                .boxed()
                .shared();
                entry.insert(shared.clone());
                Flight::Started(shared)
            },
        }
    }

    pub(crate) fn is_in_flight(&self, key: &ArtifactKey) -> bool {
        self.fetches.contains_key(key)
    }
}

/// Removes a registry entry when the fetch future that owns it finishes or
/// is dropped.
struct RemoveOnDrop {
    fetches: Weak<DashMap<ArtifactKey, SharedFetch>>,
    key: ArtifactKey,
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if let Some(fetches) = self.fetches.upgrade() {
            fetches.remove(&self.key);
        }
    }
}
