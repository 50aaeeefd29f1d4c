//! Test fixtures for common types.

use std::path::Path;

use tempfile::TempDir;

use fabric_core::{
    Artifact, Base64Encoder, DefinitionPart, ItemDefinition, PLATFORM_FILE, StandardBase64Encoder,
};

/// Workspace ID used by [`test_artifact`].
pub const TEST_WORKSPACE_ID: &str = "ws-1";

/// Artifact ID used by [`test_artifact`].
pub const TEST_ARTIFACT_ID: &str = "artifact-1";

/// A semantic model artifact in [`TEST_WORKSPACE_ID`].
#[must_use]
pub fn test_artifact() -> Artifact {
    Artifact::new(TEST_WORKSPACE_ID, TEST_ARTIFACT_ID, "Sales Model", "SemanticModel")
}

/// An artifact with specific IDs.
#[must_use]
pub fn test_artifact_with(workspace_id: &str, artifact_id: &str) -> Artifact {
    Artifact::new(workspace_id, artifact_id, artifact_id, "Notebook")
}

/// A part whose payload is `text` encoded as standard base64.
#[must_use]
pub fn text_part(path: &str, text: &str) -> DefinitionPart {
    DefinitionPart::inline(path, StandardBase64Encoder.encode_text(text))
}

/// A definition built from `(path, text)` pairs, in order.
#[must_use]
pub fn test_definition(files: &[(&str, &str)]) -> ItemDefinition {
    ItemDefinition::new(files.iter().map(|(path, text)| text_part(path, text)).collect())
}

/// A small TMDL semantic model with a nested table and a `.platform` file.
#[must_use]
pub fn semantic_model_definition() -> ItemDefinition {
    test_definition(&[
        ("model.tmdl", "model Model\n\tculture: en-US\n"),
        ("tables/Sales.tmdl", "table Sales\n\tcolumn Amount\n"),
        ("definition.pbism", "{\"version\": \"4.0\"}"),
        (PLATFORM_FILE, "{\"metadata\": {\"type\": \"SemanticModel\"}}"),
    ])
    .with_format("TMDL")
}

/// A temporary directory holding `files` as `(relative path, text)` pairs.
///
/// # Panics
///
/// Panics if the directory or any file cannot be created.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_item_folder(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    for (relative, text) in files {
        write_file(dir.path(), relative, text);
    }
    dir
}

#[allow(clippy::expect_used)]
fn write_file(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(path, text).expect("write fixture file");
}
