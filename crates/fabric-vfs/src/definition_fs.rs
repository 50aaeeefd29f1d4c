use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use fabric_config::DefinitionsSection;
use fabric_core::{
    Artifact, ArtifactKey, ArtifactManager, Base64Encoder, DefinitionPart, FeatureFlags,
    ItemDefinition, directory_prefix, is_valid_part_path,
};
use fabric_telemetry::ActivityContext;
use tokio::sync::broadcast;
use tracing::{Instrument, debug, error, info, warn};
use url::Url;

use crate::cache::DefinitionCache;
use crate::error::{FsError, FsResult};
use crate::fetch::{FetchOutcome, Flight, InFlightFetches};
use crate::registry::{ProviderCapabilities, ProviderRegistry};
use crate::uri::{DefinitionPath, create_uri_with_scheme, parse_uri, uri_for};
use crate::{
    DeleteOptions, FileChangeEvent, FileChangeType, FileStat, FileSystemProvider, FileType,
    RenameOptions, WatchHandle, WatchOptions, WriteOptions,
};

/// Folder argument passed with every definition update. The definition
/// file system never has a local folder behind it.
pub const EMPTY_FOLDER_PLACEHOLDER: &str = "";

const EDIT_DISABLED: &str = "Editing item definitions is disabled. Enable the \
    `definitions.edit_enabled` setting (or FABRIC_EDIT_ITEM_DEFINITIONS) to save changes.";

/// Construction options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionFsOptions {
    /// Scheme used for change-event URIs and registry registration.
    pub scheme: String,
    /// Restore cached state when a remote update fails.
    pub rollback_on_failure: bool,
    /// Buffer size of the change-event channel.
    pub event_capacity: usize,
}

impl Default for DefinitionFsOptions {
    fn default() -> Self {
        Self::from(&DefinitionsSection::default())
    }
}

impl From<&DefinitionsSection> for DefinitionFsOptions {
    fn from(section: &DefinitionsSection) -> Self {
        Self {
            scheme: section.scheme.clone(),
            rollback_on_failure: section.rollback_on_failure,
            event_capacity: section.event_capacity,
        }
    }
}

/// Virtual file system over remote item definitions.
///
/// Cheap to clone; clones share caches and the change-event channel.
///
/// Reads are served from cache when possible. A miss fetches the whole
/// definition of the owning artifact once, however many files of that
/// artifact are requested concurrently. Writes and deletes mutate the
/// cached definition and push it back in full; the remote service is
/// last-writer-wins.
#[derive(Clone)]
pub struct DefinitionFileSystem {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn ArtifactManager>,
    encoder: Arc<dyn Base64Encoder>,
    flags: Arc<dyn FeatureFlags>,
    options: DefinitionFsOptions,
    cache: DefinitionCache,
    in_flight: InFlightFetches,
    events: broadcast::Sender<Vec<FileChangeEvent>>,
}

impl fmt::Debug for DefinitionFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionFileSystem")
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl DefinitionFileSystem {
    /// Capabilities the file system registers with.
    pub const CAPABILITIES: ProviderCapabilities = ProviderCapabilities {
        is_case_sensitive: true,
        is_readonly: false,
    };

    /// Create a file system with default options.
    #[must_use]
    pub fn new(
        api: Arc<dyn ArtifactManager>,
        encoder: Arc<dyn Base64Encoder>,
        flags: Arc<dyn FeatureFlags>,
    ) -> Self {
        Self::with_options(api, encoder, flags, DefinitionFsOptions::default())
    }

    /// Create a file system with explicit options.
    #[must_use]
    pub fn with_options(
        api: Arc<dyn ArtifactManager>,
        encoder: Arc<dyn Base64Encoder>,
        flags: Arc<dyn FeatureFlags>,
        options: DefinitionFsOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                api,
                encoder,
                flags,
                options,
                cache: DefinitionCache::default(),
                in_flight: InFlightFetches::default(),
                events,
            }),
        }
    }

    /// Scheme this file system addresses.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.inner.options.scheme
    }

    /// Register under [`Self::scheme`] in `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::SchemeInUse`] if the scheme is taken.
    pub fn register(&self, registry: &ProviderRegistry) -> FsResult<()> {
        registry.register(self.scheme(), Arc::new(self.clone()), Self::CAPABILITIES)
    }

    /// URI of `file_name` inside `artifact` under this file system's scheme.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::InvalidUri`] if the URI cannot be built.
    pub fn uri(&self, artifact: &Artifact, file_name: &str) -> FsResult<Url> {
        create_uri_with_scheme(self.scheme(), artifact, file_name)
    }

    /// Cache one file's content without touching the definition cache.
    pub fn register_file(&self, artifact: &Artifact, file_name: &str, content: Vec<u8>) {
        self.inner
            .cache
            .insert_file(DefinitionPath::for_artifact(artifact, file_name), content, artifact);
    }

    /// Cache a full definition and every addressable part in it.
    pub fn register_item(&self, artifact: &Artifact, definition: ItemDefinition) {
        debug!(
            workspace_id = %artifact.workspace_id,
            artifact_id = %artifact.id,
            parts = definition.parts.len(),
            "registering item definition"
        );
        self.inner
            .cache
            .register_item(artifact, definition, self.inner.encoder.as_ref());
    }

    /// The cached definition of an artifact, if any. Never does I/O.
    #[must_use]
    pub fn get_cached_item_definition(
        &self,
        workspace_id: &str,
        artifact_id: &str,
    ) -> Option<ItemDefinition> {
        self.inner
            .cache
            .definition(&ArtifactKey::new(workspace_id, artifact_id))
            .map(|cached| cached.definition)
    }

    /// Stat `uri` from cache alone.
    #[must_use]
    pub fn stat_cached(&self, uri: &Url) -> Option<FileStat> {
        self.stat_path_cached(&parse_uri(uri)?)
    }

    /// Content of `uri` from cache alone.
    #[must_use]
    pub fn read_cached(&self, uri: &Url) -> Option<Vec<u8>> {
        self.inner.cache.file(&parse_uri(uri)?)
    }

    /// Receive batches of change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<FileChangeEvent>> {
        self.inner.events.subscribe()
    }

    fn parse(uri: &Url) -> FsResult<DefinitionPath> {
        parse_uri(uri).ok_or_else(|| FsError::NotFound(uri.to_string()))
    }

    /// Parse a URI that must address a file or directory below the root.
    ///
    /// The decoded relative path must be a well-formed part path, so a
    /// segment such as `%2E%2E%2Fx` never becomes a part.
    fn parse_below_root(uri: &Url) -> FsResult<DefinitionPath> {
        let path = Self::parse(uri)?;
        if path.is_root() {
            return Err(FsError::NotFound(uri.to_string()));
        }
        if !is_valid_part_path(&path.file_path) {
            return Err(FsError::InvalidPartPath(format!(
                "{uri}: `{}` is not a valid part path",
                path.file_path
            )));
        }
        Ok(path)
    }

    fn stat_path_cached(&self, path: &DefinitionPath) -> Option<FileStat> {
        let cache = &self.inner.cache;
        if let Some(len) = cache.file_len(path) {
            let fetched_ms = cache
                .with_definition(&path.key(), |c| c.fetched_at.timestamp_millis())
                .unwrap_or(0);
            return Some(FileStat::file(
                u64::try_from(len).unwrap_or(u64::MAX),
                fetched_ms,
            ));
        }

        cache
            .with_definition(&path.key(), |c| {
                c.definition
                    .has_directory(&path.file_path)
                    .then(|| FileStat::directory(c.fetched_at.timestamp_millis()))
            })
            .flatten()
    }

    /// Serve a file on a cache miss by fetching its artifact's definition.
    ///
    /// Concurrent misses on the same artifact share one fetch; each caller
    /// then looks up its own file, so a missing file fails only the caller
    /// that asked for it.
    async fn fetch_and_cache_file(&self, path: &DefinitionPath) -> FsResult<Vec<u8>> {
        if path.is_root() {
            return Err(FsError::NotFound(path.to_string()));
        }

        let key = path.key();
        let flight = self.inner.in_flight.join_or_start(&key, || {
            let inner = Arc::clone(&self.inner);
            let artifact = self.artifact_for(path);
            async move { inner.load_definition(artifact).await }
        });
        if matches!(flight, Flight::Joined(_)) {
            debug!(%key, path = %path.file_path, "joining in-flight definition fetch");
        }

        let outcome = flight.wait().await;
        self.inner.cache.file(path).ok_or_else(|| {
            debug!(%key, path = %path.file_path, ?outcome, "file absent after fetch");
            FsError::NotFound(path.to_string())
        })
    }

    /// Best-known artifact for a path. Falls back to one built from the
    /// path's identifiers, which is all the fetch API needs.
    fn artifact_for(&self, path: &DefinitionPath) -> Artifact {
        self.resolve_owner(path).unwrap_or_else(|| {
            Artifact::new(&path.workspace_id, &path.artifact_id, &path.artifact_id, "")
        })
    }

    fn resolve_owner(&self, path: &DefinitionPath) -> Option<Artifact> {
        let cache = &self.inner.cache;
        cache
            .owner(path)
            .or_else(|| cache.with_definition(&path.key(), |c| c.artifact.clone()))
    }

    fn ensure_editable(&self) -> FsResult<()> {
        if self.inner.flags.is_edit_item_definitions_enabled() {
            Ok(())
        } else {
            Err(FsError::NoPermissions(EDIT_DISABLED.to_owned()))
        }
    }

    /// Make sure the full definition of `artifact` is cached, fetching it
    /// directly if not. Unlike reads, remote errors surface as-is.
    async fn ensure_definition(&self, artifact: &Artifact) -> FsResult<()> {
        if self.inner.cache.has_definition(&artifact.key()) {
            return Ok(());
        }

        let response = self.inner.api.get_artifact_definition(artifact).await?;
        let Some(envelope) = response.parsed_body else {
            return Err(FsError::NotFound(format!(
                "definition of {} (status {})",
                artifact.key(),
                response.status
            )));
        };
        self.register_item(artifact, envelope.definition);
        Ok(())
    }

    async fn push(&self, artifact: &Artifact, definition: &ItemDefinition) -> FsResult<()> {
        self.inner
            .api
            .update_artifact_definition(artifact, definition, Path::new(EMPTY_FOLDER_PLACEHOLDER))
            .await?;
        Ok(())
    }

    fn emit(&self, change_type: FileChangeType, uri: Url) {
        if self
            .inner
            .events
            .send(vec![FileChangeEvent { change_type, uri }])
            .is_err()
        {
            debug!("no change subscribers");
        }
    }

    /// Run `work` inside an activity span and log its outcome.
    async fn in_activity<T>(
        operation: &str,
        path: &DefinitionPath,
        work: impl Future<Output = FsResult<T>>,
    ) -> FsResult<T> {
        let ctx = ActivityContext::new("fabric_vfs", operation)
            .with_metadata("workspaceId", &path.workspace_id)
            .with_metadata("artifactId", &path.artifact_id)
            .with_metadata("path", &path.file_path);
        let span = ctx.span();
        let result = work.instrument(span.clone()).await;
        span.in_scope(|| ctx.record_outcome(&result));
        result
    }

    async fn write_part(
        &self,
        uri: &Url,
        path: &DefinitionPath,
        content: &[u8],
        options: WriteOptions,
    ) -> FsResult<()> {
        let cache = &self.inner.cache;

        let existed = cache.contains_file(path);
        if existed && !options.overwrite {
            return Err(FsError::FileExists(uri.to_string()));
        }
        if !existed && !options.create {
            return Err(FsError::NotFound(uri.to_string()));
        }

        let artifact = self
            .resolve_owner(path)
            .ok_or_else(|| FsError::NotFound(uri.to_string()))?;
        self.ensure_editable()?;
        self.ensure_definition(&artifact).await?;

        let key = artifact.key();
        let snapshot = self
            .inner
            .options
            .rollback_on_failure
            .then(|| cache.snapshot(&key, [path]));

        let part = DefinitionPart::inline(&path.file_path, self.inner.encoder.encode(content));
        let (replaced, definition) = cache
            .update_definition(&key, |d| d.upsert_part(part))
            .ok_or_else(|| FsError::NotFound(uri.to_string()))?;
        cache.insert_file(path.clone(), content.to_vec(), &artifact);
        debug!(%key, path = %path.file_path, replaced, "updated cached definition");

        if let Err(e) = self.push(&artifact, &definition).await {
            if let Some(snapshot) = snapshot {
                cache.restore(snapshot);
                warn!(%key, "restored cached definition after failed update");
            }
            return Err(e);
        }

        let change_type = if existed {
            FileChangeType::Changed
        } else {
            FileChangeType::Created
        };
        self.emit(change_type, uri.clone());
        Ok(())
    }

    async fn delete_parts(
        &self,
        uri: &Url,
        path: &DefinitionPath,
        options: DeleteOptions,
    ) -> FsResult<()> {
        let cache = &self.inner.cache;

        let artifact = self
            .resolve_owner(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        self.ensure_editable()?;
        self.ensure_definition(&artifact).await?;

        let key = artifact.key();
        let is_file = cache.contains_file(path);
        if !is_file && !options.recursive {
            return Err(FsError::NoPermissions(format!(
                "{path} is a directory and the delete is not recursive"
            )));
        }

        let targets: Vec<DefinitionPath> = cache
            .with_definition(&key, |c| {
                if is_file {
                    c.definition
                        .part(&path.file_path)
                        .map(|p| vec![p.path.clone()])
                        .unwrap_or_default()
                } else {
                    let prefix = directory_prefix(&path.file_path);
                    c.definition
                        .paths()
                        .filter(|p| p.starts_with(&prefix))
                        .map(str::to_owned)
                        .collect()
                }
            })
            .unwrap_or_default()
            .into_iter()
            .map(|p| DefinitionPath::for_artifact(&artifact, p))
            .collect();
        if targets.is_empty() {
            return Err(FsError::NotFound(path.to_string()));
        }

        let snapshot = self
            .inner
            .options
            .rollback_on_failure
            .then(|| cache.snapshot(&key, &targets));

        let (removed, definition) = cache
            .update_definition(&key, |d| {
                if is_file {
                    d.remove_part(&path.file_path).into_iter().collect::<Vec<_>>()
                } else {
                    d.remove_under(&path.file_path)
                }
            })
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        if removed.is_empty() {
            return Err(FsError::NotFound(path.to_string()));
        }

        let removed: Vec<DefinitionPath> = removed
            .iter()
            .map(|p| DefinitionPath::for_artifact(&artifact, &p.path))
            .collect();
        for removed_path in &removed {
            cache.remove_file(removed_path);
        }
        debug!(%key, count = removed.len(), "removed parts from cached definition");

        if let Err(e) = self.push(&artifact, &definition).await {
            if let Some(snapshot) = snapshot {
                cache.restore(snapshot);
                warn!(%key, "restored cached definition after failed update");
            }
            return Err(e);
        }

        if is_file {
            self.emit(FileChangeType::Deleted, uri.clone());
            return Ok(());
        }
        for removed_path in &removed {
            match uri_for(self.scheme(), removed_path) {
                Ok(removed_uri) => self.emit(FileChangeType::Deleted, removed_uri),
                Err(e) => warn!(path = %removed_path, error = %e, "no URI for deleted part"),
            }
        }
        Ok(())
    }
}

impl Inner {
    /// Body of a shared fetch: reuse a cached definition, or fetch and
    /// register it. Failures are logged and reported as [`FetchOutcome::Failed`].
    async fn load_definition(self: Arc<Self>, artifact: Artifact) -> FetchOutcome {
        let key = artifact.key();
        if self.cache.has_definition(&key) {
            debug!(%key, "reusing cached definition");
            return FetchOutcome::Reused;
        }

        match self.api.get_artifact_definition(&artifact).await {
            Ok(response) => match response.parsed_body {
                Some(envelope) => {
                    info!(%key, parts = envelope.definition.parts.len(), "fetched item definition");
                    self.cache
                        .register_item(&artifact, envelope.definition, self.encoder.as_ref());
                    FetchOutcome::Loaded
                },
                None => {
                    warn!(%key, status = response.status, "definition response had no body");
                    FetchOutcome::Failed
                },
            },
            Err(e) => {
                error!(%key, error = %e, "failed to fetch item definition");
                FetchOutcome::Failed
            },
        }
    }
}

/// Entries directly under `dir`, in first-seen order.
///
/// A part whose remaining path has no `/` is a file; otherwise it implies
/// a directory named by its first segment. Names are unique: when a name
/// shows up again its kind is updated in place.
fn list_directory(definition: &ItemDefinition, dir: &str) -> Vec<(String, FileType)> {
    let prefix = directory_prefix(dir);
    let mut entries: Vec<(String, FileType)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for remainder in definition
        .paths()
        .filter_map(|p| p.strip_prefix(prefix.as_str()))
    {
        let (name, kind) = match remainder.split_once('/') {
            Some((first, _)) => (first, FileType::Directory),
            None => (remainder, FileType::File),
        };
        if name.is_empty() {
            continue;
        }

        match positions.get(name).and_then(|&i| entries.get_mut(i)) {
            Some(entry) => entry.1 = kind,
            None => {
                positions.insert(name, entries.len());
                entries.push((name.to_owned(), kind));
            },
        }
    }

    entries
}

#[async_trait]
impl FileSystemProvider for DefinitionFileSystem {
    fn watch(&self, _uri: &Url, _options: &WatchOptions) -> WatchHandle {
        WatchHandle::noop()
    }

    async fn stat(&self, uri: &Url) -> FsResult<FileStat> {
        let path = Self::parse(uri)?;
        if let Some(stat) = self.stat_path_cached(&path) {
            return Ok(stat);
        }

        let content = self.fetch_and_cache_file(&path).await?;
        let fetched_ms = self
            .inner
            .cache
            .with_definition(&path.key(), |c| c.fetched_at.timestamp_millis())
            .unwrap_or(0);
        Ok(FileStat::file(
            u64::try_from(content.len()).unwrap_or(u64::MAX),
            fetched_ms,
        ))
    }

    async fn read_directory(&self, uri: &Url) -> FsResult<Vec<(String, FileType)>> {
        let path = Self::parse(uri)?;
        self.inner
            .cache
            .with_definition(&path.key(), |c| list_directory(&c.definition, &path.file_path))
            .ok_or_else(|| FsError::NotFound(uri.to_string()))
    }

    async fn create_directory(&self, uri: &Url) -> FsResult<()> {
        let path = Self::parse_below_root(uri)?;
        let occupied = self
            .inner
            .cache
            .with_definition(&path.key(), |c| {
                c.definition.part(&path.file_path).is_some()
                    || c.definition.has_directory(&path.file_path)
            })
            .ok_or_else(|| FsError::NotFound(uri.to_string()))?;

        if occupied {
            return Err(FsError::FileExists(uri.to_string()));
        }
        // Directories only exist through the parts under them.
        Ok(())
    }

    async fn read_file(&self, uri: &Url) -> FsResult<Vec<u8>> {
        let path = Self::parse(uri)?;
        if let Some(content) = self.inner.cache.file(&path) {
            return Ok(content);
        }
        self.fetch_and_cache_file(&path).await
    }

    async fn write_file(&self, uri: &Url, content: &[u8], options: WriteOptions) -> FsResult<()> {
        let path = Self::parse_below_root(uri)?;
        Self::in_activity(
            "write_file",
            &path,
            self.write_part(uri, &path, content, options),
        )
        .await
    }

    async fn delete(&self, uri: &Url, options: DeleteOptions) -> FsResult<()> {
        let path = Self::parse_below_root(uri)?;
        Self::in_activity("delete", &path, self.delete_parts(uri, &path, options)).await
    }

    async fn rename(&self, old: &Url, _new: &Url, _options: RenameOptions) -> FsResult<()> {
        Err(FsError::NoPermissions(format!(
            "{old}: renaming definition files is not supported"
        )))
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<FileChangeEvent>> {
        self.inner.events.subscribe()
    }
}
