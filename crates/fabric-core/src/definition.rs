//! Item definitions and their parts.
//!
//! A definition is an ordered list of parts. Order is insertion order and
//! carries no meaning for lookup, which is by exact, case-sensitive path.
//! Directories do not exist in this model: they are implied by parts whose
//! path shares a `dir/` prefix.

use serde::{Deserialize, Serialize};

/// Metadata file that accompanies every definition.
pub const PLATFORM_FILE: &str = ".platform";

/// Encoding of a part payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadType {
    /// Base64 payload carried inline in the definition.
    #[default]
    InlineBase64,
}

/// One named, base64-encoded file within a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionPart {
    /// Relative, forward-slash separated path.
    pub path: String,
    /// Base64-encoded content.
    pub payload: String,
    /// Payload encoding.
    #[serde(default)]
    pub payload_type: PayloadType,
}

impl DefinitionPart {
    /// Create an inline base64 part.
    #[must_use]
    pub fn inline(path: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            payload: payload.into(),
            payload_type: PayloadType::InlineBase64,
        }
    }

    /// Whether this part maps to an addressable file (non-empty path and payload).
    #[must_use]
    pub fn is_addressable(&self) -> bool {
        !self.path.is_empty() && !self.payload.is_empty()
    }
}

/// The remote representation of an artifact's contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    /// Optional definition format (e.g. `TMDL`, `ipynb`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Parts in insertion order.
    #[serde(default)]
    pub parts: Vec<DefinitionPart>,
}

impl ItemDefinition {
    /// Create a definition from parts.
    #[must_use]
    pub fn new(parts: Vec<DefinitionPart>) -> Self {
        Self {
            format: None,
            parts,
        }
    }

    /// Set the format.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Look up a part by exact path.
    #[must_use]
    pub fn part(&self, path: &str) -> Option<&DefinitionPart> {
        self.parts.iter().find(|p| p.path == path)
    }

    /// Replace the part with the same path in place, or append it.
    ///
    /// Returns `true` when an existing part was replaced.
    pub fn upsert_part(&mut self, part: DefinitionPart) -> bool {
        if let Some(existing) = self.parts.iter_mut().find(|p| p.path == part.path) {
            *existing = part;
            true
        } else {
            self.parts.push(part);
            false
        }
    }

    /// Remove the part at exactly `path`.
    pub fn remove_part(&mut self, path: &str) -> Option<DefinitionPart> {
        let index = self.parts.iter().position(|p| p.path == path)?;
        Some(self.parts.remove(index))
    }

    /// Remove every part living under the directory `dir`.
    ///
    /// Returns the removed parts in their original order.
    pub fn remove_under(&mut self, dir: &str) -> Vec<DefinitionPart> {
        let prefix = directory_prefix(dir);
        let (removed, kept) = std::mem::take(&mut self.parts)
            .into_iter()
            .partition(|p| p.path.starts_with(&prefix));
        self.parts = kept;
        removed
    }

    /// Whether any part lives under the directory `dir`.
    ///
    /// An empty `dir` denotes the definition root, which always exists.
    #[must_use]
    pub fn has_directory(&self, dir: &str) -> bool {
        if dir.is_empty() {
            return true;
        }
        let prefix = directory_prefix(dir);
        self.parts.iter().any(|p| p.path.starts_with(&prefix))
    }

    /// Iterate over part paths.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.path.as_str())
    }

    /// A copy of this definition without the `.platform` part.
    #[must_use]
    pub fn without_platform(&self) -> Self {
        Self {
            format: self.format.clone(),
            parts: self
                .parts
                .iter()
                .filter(|p| p.path != PLATFORM_FILE)
                .cloned()
                .collect(),
        }
    }
}

/// `dir/` for a non-empty directory, empty for the root.
#[must_use]
pub fn directory_prefix(dir: &str) -> String {
    if dir.is_empty() {
        String::new()
    } else {
        format!("{dir}/")
    }
}

/// Whether `path` is a well-formed part path: relative, forward-slash
/// separated, no empty, `.` or `..` segments.
#[must_use]
pub fn is_valid_part_path(path: &str) -> bool {
    !path.is_empty()
        && !path.contains('\\')
        && path
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}
