//! Mock implementations for testing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use fabric_core::{
    ApiError, ApiResponse, ApiResult, Artifact, ArtifactKey, ArtifactManager, DefinitionEnvelope,
    FeatureFlags, ItemDefinition,
};

/// One call to [`ArtifactManager::update_artifact_definition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedUpdate {
    /// Target artifact.
    pub artifact: Artifact,
    /// Definition that was pushed.
    pub definition: ItemDefinition,
    /// Folder argument passed alongside the definition.
    pub folder: PathBuf,
}

#[derive(Debug, Default)]
struct MockState {
    definitions: Mutex<HashMap<ArtifactKey, ItemDefinition>>,
    updates: Mutex<Vec<CapturedUpdate>>,
    get_calls: AtomicUsize,
    update_calls: AtomicUsize,
    latency_ms: AtomicU64,
    fail_get: AtomicBool,
    fail_update: AtomicBool,
}

/// In-memory remote definition service.
///
/// Clones share state, so a test can hand one clone to the file system and
/// keep another to inspect call counts. Successful updates replace the
/// stored definition, the way the real service would.
#[derive(Debug, Clone, Default)]
pub struct MockArtifactManager {
    state: Arc<MockState>,
}

impl MockArtifactManager {
    /// Create an empty mock: every fetch returns a response without a body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a definition served for `artifact`.
    #[must_use]
    pub fn with_definition(self, artifact: &Artifact, definition: ItemDefinition) -> Self {
        self.set_definition(artifact, definition);
        self
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.state.latency_ms.store(millis, Ordering::SeqCst);
        self
    }

    /// Make every fetch fail with a 500.
    #[must_use]
    pub fn failing_gets(self) -> Self {
        self.set_fail_get(true);
        self
    }

    /// Make every update fail with a 500.
    #[must_use]
    pub fn failing_updates(self) -> Self {
        self.set_fail_update(true);
        self
    }

    /// Replace the stored definition for `artifact`.
    pub fn set_definition(&self, artifact: &Artifact, definition: ItemDefinition) {
        if let Ok(mut guard) = self.state.definitions.lock() {
            guard.insert(artifact.key(), definition);
        }
    }

    /// Toggle fetch failures.
    pub fn set_fail_get(&self, fail: bool) {
        self.state.fail_get.store(fail, Ordering::SeqCst);
    }

    /// Toggle update failures.
    pub fn set_fail_update(&self, fail: bool) {
        self.state.fail_update.store(fail, Ordering::SeqCst);
    }

    /// Number of fetches so far, failed ones included.
    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.state.get_calls.load(Ordering::SeqCst)
    }

    /// Number of updates so far, failed ones included.
    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.state.update_calls.load(Ordering::SeqCst)
    }

    /// Successful updates in call order.
    #[must_use]
    pub fn updates(&self) -> Vec<CapturedUpdate> {
        self.state
            .updates
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Most recent successful update.
    #[must_use]
    pub fn last_update(&self) -> Option<CapturedUpdate> {
        self.updates().pop()
    }

    /// Definition currently stored for `key`.
    #[must_use]
    pub fn stored_definition(&self, key: &ArtifactKey) -> Option<ItemDefinition> {
        self.state
            .definitions
            .lock()
            .ok()
            .and_then(|guard| guard.get(key).cloned())
    }

    async fn simulate_latency(&self) {
        let millis = self.state.latency_ms.load(Ordering::SeqCst);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }
}

#[async_trait]
impl ArtifactManager for MockArtifactManager {
    async fn get_artifact_definition(
        &self,
        artifact: &Artifact,
    ) -> ApiResult<ApiResponse<DefinitionEnvelope>> {
        self.state.get_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.state.fail_get.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                message: "mock get failure".to_owned(),
            });
        }

        Ok(match self.stored_definition(&artifact.key()) {
            Some(definition) => ApiResponse::ok(DefinitionEnvelope { definition }),
            None => ApiResponse::empty(404),
        })
    }

    async fn update_artifact_definition(
        &self,
        artifact: &Artifact,
        definition: &ItemDefinition,
        folder: &Path,
    ) -> ApiResult<ApiResponse<serde_json::Value>> {
        self.state.update_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.state.fail_update.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                message: "mock update failure".to_owned(),
            });
        }

        self.set_definition(artifact, definition.clone());
        if let Ok(mut guard) = self.state.updates.lock() {
            guard.push(CapturedUpdate {
                artifact: artifact.clone(),
                definition: definition.clone(),
                folder: folder.to_path_buf(),
            });
        }
        Ok(ApiResponse::empty(200))
    }
}

/// Feature flags that can be flipped mid-test and count how often they
/// were polled.
#[derive(Debug, Clone, Default)]
pub struct MockFeatureFlags {
    enabled: Arc<AtomicBool>,
    polls: Arc<AtomicUsize>,
}

impl MockFeatureFlags {
    /// Flags with editing enabled.
    #[must_use]
    pub fn enabled() -> Self {
        let flags = Self::default();
        flags.set_enabled(true);
        flags
    }

    /// Flags with editing disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Flip the edit flag.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// How many times the flag was read.
    #[must_use]
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl FeatureFlags for MockFeatureFlags {
    fn is_edit_item_definitions_enabled(&self) -> bool {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.enabled.load(Ordering::SeqCst)
    }
}
