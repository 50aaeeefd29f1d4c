//! Mapping between virtual URIs and definition part paths.
//!
//! Every virtual file is addressed as
//! `fabric-definition:///<workspaceId>/<artifactId>/<relativePath>`. Each
//! segment is percent-encoded on the way out and decoded on the way in, so
//! identifiers and part names may contain characters that are not legal in
//! a URI path.

use std::fmt;

use fabric_core::{Artifact, ArtifactKey};
use url::Url;

use crate::error::{FsError, FsResult};

/// URI scheme the definition file system is registered under.
pub const DEFINITION_SCHEME: &str = fabric_config::DEFAULT_SCHEME;

/// A parsed virtual path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefinitionPath {
    /// Workspace the artifact lives in.
    pub workspace_id: String,
    /// Artifact the file belongs to.
    pub artifact_id: String,
    /// Part path relative to the artifact root. Empty for the root itself.
    pub file_path: String,
}

impl DefinitionPath {
    /// Build a path from its components.
    #[must_use]
    pub fn new(
        workspace_id: impl Into<String>,
        artifact_id: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            artifact_id: artifact_id.into(),
            file_path: file_path.into(),
        }
    }

    /// Path of `file_path` inside `artifact`.
    #[must_use]
    pub fn for_artifact(artifact: &Artifact, file_path: impl Into<String>) -> Self {
        Self::new(&artifact.workspace_id, &artifact.id, file_path)
    }

    /// Key of the owning artifact.
    #[must_use]
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(&self.workspace_id, &self.artifact_id)
    }

    /// Whether this addresses the artifact root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.file_path.is_empty()
    }
}

impl fmt::Display for DefinitionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.workspace_id, self.artifact_id, self.file_path)
    }
}

/// Parse a virtual URI.
///
/// Empty segments are ignored, so `///ws//art/` and `/ws/art` are the same
/// root. Returns `None` when fewer than two segments remain or a segment
/// is not valid percent-encoded UTF-8. The scheme is not checked.
#[must_use]
pub fn parse_uri(uri: &Url) -> Option<DefinitionPath> {
    let segments = uri
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::decode(s).ok().map(|d| d.into_owned()))
        .collect::<Option<Vec<_>>>()?;

    let mut segments = segments.into_iter();
    let workspace_id = segments.next()?;
    let artifact_id = segments.next()?;
    let file_path = segments.collect::<Vec<_>>().join("/");

    Some(DefinitionPath {
        workspace_id,
        artifact_id,
        file_path,
    })
}

/// URI of `file_name` inside `artifact` under [`DEFINITION_SCHEME`].
///
/// # Errors
///
/// Returns [`FsError::InvalidUri`] if the result does not parse as a URL.
pub fn create_uri(artifact: &Artifact, file_name: &str) -> FsResult<Url> {
    create_uri_with_scheme(DEFINITION_SCHEME, artifact, file_name)
}

/// URI of `file_name` inside `artifact` under an arbitrary scheme.
///
/// # Errors
///
/// Returns [`FsError::InvalidUri`] if the result does not parse as a URL.
pub fn create_uri_with_scheme(scheme: &str, artifact: &Artifact, file_name: &str) -> FsResult<Url> {
    uri_for(
        scheme,
        &DefinitionPath::for_artifact(artifact, file_name),
    )
}

/// URI addressing `path` under `scheme`.
///
/// # Errors
///
/// Returns [`FsError::InvalidUri`] if the result does not parse as a URL.
pub fn uri_for(scheme: &str, path: &DefinitionPath) -> FsResult<Url> {
    let mut raw = format!(
        "{scheme}:///{}/{}/",
        urlencoding::encode(&path.workspace_id),
        urlencoding::encode(&path.artifact_id),
    );
    let encoded_file = path
        .file_path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    raw.push_str(&encoded_file);

    Url::parse(&raw).map_err(|e| FsError::InvalidUri(format!("{raw}: {e}")))
}
