//! Shared setup for definition file system integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use fabric_core::StandardBase64Encoder;
use fabric_test::{MockArtifactManager, MockFeatureFlags, init_test_logging, test_artifact};
use fabric_vfs::{DefinitionFileSystem, DefinitionFsOptions, FileChangeEvent};
use tokio::sync::broadcast;
use url::Url;

/// A file system wired to a mock remote and toggleable flags.
pub struct Harness {
    pub fs: DefinitionFileSystem,
    pub api: MockArtifactManager,
    pub flags: MockFeatureFlags,
}

impl Harness {
    /// Editing enabled, default options.
    pub fn new(api: MockArtifactManager) -> Self {
        Self::with_options(api, MockFeatureFlags::enabled(), DefinitionFsOptions::default())
    }

    pub fn with_flags(api: MockArtifactManager, flags: MockFeatureFlags) -> Self {
        Self::with_options(api, flags, DefinitionFsOptions::default())
    }

    pub fn with_options(
        api: MockArtifactManager,
        flags: MockFeatureFlags,
        options: DefinitionFsOptions,
    ) -> Self {
        init_test_logging();
        let fs = DefinitionFileSystem::with_options(
            Arc::new(api.clone()),
            Arc::new(StandardBase64Encoder),
            Arc::new(flags.clone()),
            options,
        );
        Self { fs, api, flags }
    }

    /// URI of `file` inside the test artifact.
    pub fn uri(&self, file: &str) -> Url {
        self.fs.uri(&test_artifact(), file).unwrap()
    }
}

/// Drain every batch currently buffered on `rx`, flattened.
pub fn drain(rx: &mut broadcast::Receiver<Vec<FileChangeEvent>>) -> Vec<FileChangeEvent> {
    let mut events = Vec::new();
    while let Ok(batch) = rx.try_recv() {
        events.extend(batch);
    }
    events
}
