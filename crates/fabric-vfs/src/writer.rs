//! Writing a definition out to a local item folder.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fabric_core::{Base64Encoder, ItemDefinition};
use tracing::debug;

use crate::error::FsResult;
use crate::path::resolve_part_path;

/// Materializes definitions as local item folders.
#[derive(Clone)]
pub struct ItemDefinitionWriter {
    encoder: Arc<dyn Base64Encoder>,
}

impl ItemDefinitionWriter {
    /// Create a writer decoding payloads with `encoder`.
    #[must_use]
    pub fn new(encoder: Arc<dyn Base64Encoder>) -> Self {
        Self { encoder }
    }

    /// Write every part of `definition` under `folder` and return the
    /// written file paths in part order.
    ///
    /// All part paths and payloads are validated before the first file is
    /// written, so a malformed definition leaves `folder` untouched.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FsError::InvalidPartPath`] for a path that is
    /// absolute or contains `..`, a codec error for an undecodable
    /// payload, or an I/O error if writing fails.
    pub async fn write(&self, definition: &ItemDefinition, folder: &Path) -> FsResult<Vec<PathBuf>> {
        let files = definition
            .parts
            .iter()
            .map(|part| -> FsResult<(PathBuf, Vec<u8>)> {
                let target = resolve_part_path(folder, &part.path)?;
                let content = self.encoder.decode(&part.payload)?;
                Ok((target, content))
            })
            .collect::<FsResult<Vec<_>>>()?;

        let mut written = Vec::with_capacity(files.len());
        for (target, content) in files {
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, content).await?;
            written.push(target);
        }

        debug!(folder = %folder.display(), files = written.len(), "wrote item definition");
        Ok(written)
    }
}

impl std::fmt::Debug for ItemDefinitionWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemDefinitionWriter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FsError;
    use crate::reader::{ItemDefinitionReader, ReadOptions};
    use fabric_core::{DefinitionPart, StandardBase64Encoder};
    use fabric_test::{semantic_model_definition, test_definition};

    fn writer() -> ItemDefinitionWriter {
        ItemDefinitionWriter::new(Arc::new(StandardBase64Encoder))
    }

    #[tokio::test]
    async fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let definition = semantic_model_definition();

        let written = writer().write(&definition, dir.path()).await.unwrap();
        assert_eq!(written.len(), definition.parts.len());
        assert!(dir.path().join("tables").join("Sales.tmdl").is_file());

        let read = ItemDefinitionReader::new(Arc::new(StandardBase64Encoder))
            .read(dir.path(), ReadOptions::for_sync())
            .await
            .unwrap();
        let mut expected: Vec<&str> = definition.paths().collect();
        expected.sort_unstable();
        assert_eq!(read.paths().collect::<Vec<_>>(), expected);
    }

    #[tokio::test]
    async fn test_traversal_rejected_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut definition = test_definition(&[("ok.json", "{}")]);
        definition
            .parts
            .push(DefinitionPart::inline("../escape.json", StandardBase64Encoder.encode(b"{}")));

        let err = writer().write(&definition, dir.path()).await.unwrap_err();
        assert!(matches!(err, FsError::InvalidPartPath(_)));
        assert!(!dir.path().join("ok.json").exists());
    }

    #[tokio::test]
    async fn test_bad_payload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let definition = ItemDefinition::new(vec![DefinitionPart::inline("a.json", "%%%")]);
        let err = writer().write(&definition, dir.path()).await.unwrap_err();
        assert!(matches!(err, FsError::Codec(_)));
    }
}
