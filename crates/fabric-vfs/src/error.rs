use fabric_core::{ApiError, CodecError};
use thiserror::Error;

/// Definition file system errors.
///
/// Hosts map these onto their own file-system error kinds; the `is_*`
/// predicates cover the kinds an editor distinguishes.
#[derive(Debug, Error)]
pub enum FsError {
    /// The URI does not address a known file or directory.
    #[error("File not found: {0}")]
    NotFound(String),

    /// The target already exists and overwriting was not requested.
    #[error("File exists: {0}")]
    FileExists(String),

    /// The operation is not permitted.
    #[error("No permissions: {0}")]
    NoPermissions(String),

    /// A URI could not be built from the given identifiers.
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// A provider is already registered for the scheme.
    #[error("Scheme already registered: {0}")]
    SchemeInUse(String),

    /// A part path is absolute, escapes its folder, or is otherwise malformed.
    #[error("Invalid part path: {0}")]
    InvalidPartPath(String),

    /// The remote definition API failed.
    #[error("Remote API error: {0}")]
    Remote(#[from] ApiError),

    /// A payload could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Local file I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// Whether this is a not-found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this is a file-exists error.
    #[must_use]
    pub fn is_file_exists(&self) -> bool {
        matches!(self, Self::FileExists(_))
    }

    /// Whether this is a permission error.
    #[must_use]
    pub fn is_no_permissions(&self) -> bool {
        matches!(self, Self::NoPermissions(_))
    }
}

/// Convenience result type for definition file system operations.
pub type FsResult<T> = Result<T, FsError>;
