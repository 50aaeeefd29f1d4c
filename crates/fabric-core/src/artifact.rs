//! Remote artifact identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A remotely hosted Fabric item.
///
/// Artifacts are the unit the remote API addresses: definitions are
/// fetched and pushed one whole artifact at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Item identifier, unique within its workspace.
    pub id: String,
    /// Owning workspace identifier.
    pub workspace_id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Item type (e.g. `SemanticModel`, `Notebook`).
    #[serde(rename = "type")]
    pub artifact_type: String,
    /// Environment the item lives in (e.g. `PROD`).
    #[serde(default)]
    pub fabric_environment: String,
}

impl Artifact {
    /// Create an artifact in the default (`PROD`) environment.
    #[must_use]
    pub fn new(
        workspace_id: impl Into<String>,
        id: impl Into<String>,
        display_name: impl Into<String>,
        artifact_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            workspace_id: workspace_id.into(),
            display_name: display_name.into(),
            artifact_type: artifact_type.into(),
            fabric_environment: "PROD".to_string(),
        }
    }

    /// Set the environment.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.fabric_environment = environment.into();
        self
    }

    /// The `(workspace, artifact)` key used by caches and fetch deduplication.
    #[must_use]
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(&self.workspace_id, &self.id)
    }
}

/// Identity of an artifact, independent of its display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactKey {
    /// Owning workspace identifier.
    pub workspace_id: String,
    /// Item identifier.
    pub artifact_id: String,
}

impl ArtifactKey {
    /// Create a key.
    #[must_use]
    pub fn new(workspace_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.workspace_id, self.artifact_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_key() {
        let artifact = Artifact::new("ws", "item", "Item", "Report");
        assert_eq!(artifact.key(), ArtifactKey::new("ws", "item"));
        assert_eq!(artifact.key().to_string(), "ws/item");
    }

    #[test]
    fn test_artifact_wire_format() {
        let artifact = Artifact::new("ws", "item", "Item", "Report").with_environment("DAILY");
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["type"], "Report");
        assert_eq!(json["workspaceId"], "ws");
        assert_eq!(json["fabricEnvironment"], "DAILY");
    }
}
