//! In-memory caches owned by one definition file system.
//!
//! Three maps, all keyed by parsed identifiers rather than URI strings:
//! file contents and file owners per [`DefinitionPath`], and full
//! definitions per [`ArtifactKey`]. None of the accessors hand out map
//! guards, so callers can never hold a shard lock across an `.await`.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fabric_core::{Artifact, ArtifactKey, Base64Encoder, ItemDefinition};
use tracing::warn;

use crate::uri::DefinitionPath;

/// A full definition together with the artifact it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedDefinition {
    /// Owning artifact.
    pub artifact: Artifact,
    /// All parts, `.platform` included.
    pub definition: ItemDefinition,
    /// When the definition was fetched or registered.
    pub fetched_at: DateTime<Utc>,
}

/// Cached state for a set of files, taken before a mutation so it can be
/// put back if the remote update fails.
#[derive(Debug)]
pub(crate) struct CacheSnapshot {
    key: ArtifactKey,
    definition: Option<CachedDefinition>,
    files: Vec<(DefinitionPath, Option<Vec<u8>>, Option<Artifact>)>,
}

#[derive(Debug, Default)]
pub(crate) struct DefinitionCache {
    files: DashMap<DefinitionPath, Vec<u8>>,
    owners: DashMap<DefinitionPath, Artifact>,
    definitions: DashMap<ArtifactKey, CachedDefinition>,
}

impl DefinitionCache {
    pub(crate) fn file(&self, path: &DefinitionPath) -> Option<Vec<u8>> {
        self.files.get(path).map(|entry| entry.value().clone())
    }

    pub(crate) fn file_len(&self, path: &DefinitionPath) -> Option<usize> {
        self.files.get(path).map(|entry| entry.value().len())
    }

    pub(crate) fn contains_file(&self, path: &DefinitionPath) -> bool {
        self.files.contains_key(path)
    }

    pub(crate) fn owner(&self, path: &DefinitionPath) -> Option<Artifact> {
        self.owners.get(path).map(|entry| entry.value().clone())
    }

    pub(crate) fn definition(&self, key: &ArtifactKey) -> Option<CachedDefinition> {
        self.definitions.get(key).map(|entry| entry.value().clone())
    }

    /// Run `f` against the cached definition for `key` without cloning it.
    pub(crate) fn with_definition<R>(
        &self,
        key: &ArtifactKey,
        f: impl FnOnce(&CachedDefinition) -> R,
    ) -> Option<R> {
        self.definitions.get(key).map(|entry| f(entry.value()))
    }

    /// Mutate the cached definition for `key` in place.
    ///
    /// Returns `f`'s result and a copy of the updated definition, or `None`
    /// if nothing is cached.
    pub(crate) fn update_definition<R>(
        &self,
        key: &ArtifactKey,
        f: impl FnOnce(&mut ItemDefinition) -> R,
    ) -> Option<(R, ItemDefinition)> {
        let mut entry = self.definitions.get_mut(key)?;
        let result = f(&mut entry.definition);
        Some((result, entry.definition.clone()))
    }

    pub(crate) fn has_definition(&self, key: &ArtifactKey) -> bool {
        self.definitions.contains_key(key)
    }

    /// Store file content and its owner.
    pub(crate) fn insert_file(&self, path: DefinitionPath, content: Vec<u8>, owner: &Artifact) {
        self.owners.insert(path.clone(), owner.clone());
        self.files.insert(path, content);
    }

    /// Drop file content and its owner.
    pub(crate) fn remove_file(&self, path: &DefinitionPath) {
        self.files.remove(path);
        self.owners.remove(path);
    }

    pub(crate) fn insert_definition(&self, artifact: &Artifact, definition: ItemDefinition) {
        self.definitions.insert(
            artifact.key(),
            CachedDefinition {
                artifact: artifact.clone(),
                definition,
                fetched_at: Utc::now(),
            },
        );
    }

    /// Cache a full definition and every addressable part in it.
    ///
    /// Parts with an empty path or payload are skipped. Payloads that fail
    /// to decode are logged and skipped; the definition itself is still
    /// cached in full.
    pub(crate) fn register_item(
        &self,
        artifact: &Artifact,
        definition: ItemDefinition,
        encoder: &dyn Base64Encoder,
    ) {
        for part in definition.parts.iter().filter(|p| p.is_addressable()) {
            match encoder.decode(&part.payload) {
                Ok(bytes) => {
                    self.insert_file(DefinitionPath::for_artifact(artifact, &part.path), bytes, artifact);
                },
                Err(e) => warn!(
                    workspace_id = %artifact.workspace_id,
                    artifact_id = %artifact.id,
                    path = %part.path,
                    error = %e,
                    "skipping part with undecodable payload"
                ),
            }
        }
        self.insert_definition(artifact, definition);
    }

    pub(crate) fn snapshot<'a>(
        &self,
        key: &ArtifactKey,
        paths: impl IntoIterator<Item = &'a DefinitionPath>,
    ) -> CacheSnapshot {
        CacheSnapshot {
            key: key.clone(),
            definition: self.definition(key),
            files: paths
                .into_iter()
                .map(|p| (p.clone(), self.file(p), self.owner(p)))
                .collect(),
        }
    }

    pub(crate) fn restore(&self, snapshot: CacheSnapshot) {
        match snapshot.definition {
            Some(cached) => {
                self.definitions.insert(snapshot.key, cached);
            },
            None => {
                self.definitions.remove(&snapshot.key);
            },
        }

        for (path, content, owner) in snapshot.files {
            match content {
                Some(bytes) => {
                    self.files.insert(path.clone(), bytes);
                },
                None => {
                    self.files.remove(&path);
                },
            }
            match owner {
                Some(artifact) => {
                    self.owners.insert(path, artifact);
                },
                None => {
                    self.owners.remove(&path);
                },
            }
        }
    }
}
