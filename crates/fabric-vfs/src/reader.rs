//! Reading a local item folder into a definition.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fabric_core::{Base64Encoder, DefinitionPart, ItemDefinition};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{FsError, FsResult};
use crate::path::part_path_of;

/// Options for [`ItemDefinitionReader::read`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Include the `.platform` metadata file. Reads for display leave it
    /// out; reads that are pushed to the service need it.
    pub include_platform: bool,
}

impl ReadOptions {
    /// Options for a read that will be pushed to the service.
    #[must_use]
    pub fn for_sync() -> Self {
        Self {
            include_platform: true,
        }
    }
}

/// Builds definitions from local item folders.
#[derive(Clone)]
pub struct ItemDefinitionReader {
    encoder: Arc<dyn Base64Encoder>,
}

impl ItemDefinitionReader {
    /// Create a reader encoding payloads with `encoder`.
    #[must_use]
    pub fn new(encoder: Arc<dyn Base64Encoder>) -> Self {
        Self { encoder }
    }

    /// Read every file under `folder` into a definition, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] if `folder` is not a directory, or an
    /// I/O error if any entry cannot be read.
    pub async fn read(&self, folder: &Path, options: ReadOptions) -> FsResult<ItemDefinition> {
        let metadata = tokio::fs::metadata(folder).await?;
        if !metadata.is_dir() {
            return Err(FsError::NotFound(format!(
                "{} is not a directory",
                folder.display()
            )));
        }

        let files = Self::walk_files(folder.to_path_buf()).await?;
        let mut parts = Vec::with_capacity(files.len());
        for path in files {
            let Some(part_path) = part_path_of(folder, &path) else {
                warn!(path = %path.display(), "skipping file with non-UTF-8 path");
                continue;
            };
            let content = tokio::fs::read(&path).await?;
            parts.push(DefinitionPart::inline(part_path, self.encoder.encode(&content)));
        }

        parts.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(folder = %folder.display(), parts = parts.len(), "read item definition");

        let definition = ItemDefinition::new(parts);
        if options.include_platform {
            Ok(definition)
        } else {
            Ok(definition.without_platform())
        }
    }

    /// Regular files anywhere under `root`. Symlinks are not followed.
    async fn walk_files(root: PathBuf) -> FsResult<Vec<PathBuf>> {
        let walk = tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();
            for entry in WalkDir::new(&root).follow_links(false) {
                let entry = entry?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                } else if !entry.file_type().is_dir() {
                    debug!(path = %entry.path().display(), "skipping non-regular entry");
                }
            }
            Ok::<_, walkdir::Error>(files)
        });

        walk.await
            .map_err(std::io::Error::other)?
            .map_err(|e| FsError::Io(e.into()))
    }
}

impl std::fmt::Debug for ItemDefinitionReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemDefinitionReader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_core::{PLATFORM_FILE, StandardBase64Encoder};
    use fabric_test::test_item_folder;

    fn reader() -> ItemDefinitionReader {
        ItemDefinitionReader::new(Arc::new(StandardBase64Encoder))
    }

    #[tokio::test]
    async fn test_read_excludes_platform_by_default() {
        let folder = test_item_folder(&[
            ("model.tmdl", "model Model"),
            ("tables/Sales.tmdl", "table Sales"),
            (".platform", "{}"),
        ]);

        let definition = reader().read(folder.path(), ReadOptions::default()).await.unwrap();
        let paths: Vec<&str> = definition.paths().collect();
        assert_eq!(paths, vec!["model.tmdl", "tables/Sales.tmdl"]);

        let part = definition.part("tables/Sales.tmdl").unwrap();
        assert_eq!(StandardBase64Encoder.decode_text(&part.payload).unwrap(), "table Sales");
    }

    #[tokio::test]
    async fn test_read_for_sync_includes_platform() {
        let folder = test_item_folder(&[("model.tmdl", "m"), (".platform", "{}")]);
        let definition = reader().read(folder.path(), ReadOptions::for_sync()).await.unwrap();
        assert!(definition.part(PLATFORM_FILE).is_some());
    }

    #[tokio::test]
    async fn test_read_walks_nested_folders() {
        let folder = test_item_folder(&[
            ("b.json", "{}"),
            ("definition/pages/page1/visuals/v1/visual.json", "{}"),
            ("definition/pages/page1/page.json", "{}"),
            ("definition/report.json", "{}"),
            ("definition/pages/.platform", "nested"),
        ]);

        let definition = reader().read(folder.path(), ReadOptions::default()).await.unwrap();
        let paths: Vec<&str> = definition.paths().collect();
        assert_eq!(
            paths,
            vec![
                "b.json",
                "definition/pages/.platform",
                "definition/pages/page1/page.json",
                "definition/pages/page1/visuals/v1/visual.json",
                "definition/report.json",
            ]
        );
    }

    #[tokio::test]
    async fn test_read_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let err = reader()
            .read(&dir.path().join("missing"), ReadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::Io(_)));
    }
}
