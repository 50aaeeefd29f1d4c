//! Fabric definition virtual file system.
//!
//! Exposes remote item definitions (bundles of base64-encoded parts) as a
//! hierarchical, editable file system. Reads are deferred and coalesced into
//! one whole-definition fetch per artifact; writes and deletes are pushed
//! back with a read-modify-write of the full definition.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// In-memory file, owner and definition caches.
pub mod cache;
/// Detection of local edits that diverge from the remote definition.
pub mod conflict;
/// The definition file system itself.
pub mod definition_fs;
/// Error types.
pub mod error;
mod fetch;
/// Runtime-toggleable feature flags.
pub mod flags;
/// Part path resolution against local folders.
pub mod path;
/// Local item folder to definition.
pub mod reader;
/// Scheme to provider registry.
pub mod registry;
/// Virtual URI model.
pub mod uri;
/// Definition to local item folder.
pub mod writer;

pub use cache::CachedDefinition;
pub use conflict::{ConflictDetector, contents_differ};
pub use definition_fs::{DefinitionFileSystem, DefinitionFsOptions, EMPTY_FOLDER_PLACEHOLDER};
pub use error::{FsError, FsResult};
pub use flags::SettingsFeatureFlags;
pub use reader::{ItemDefinitionReader, ReadOptions};
pub use registry::{ProviderCapabilities, ProviderRegistry};
pub use uri::{DEFINITION_SCHEME, DefinitionPath, create_uri, parse_uri};
pub use writer::ItemDefinitionWriter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use url::Url;

/// Kind of a file system entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    /// A regular file.
    File,
    /// A directory.
    Directory,
}

/// Metadata returned by [`FileSystemProvider::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// Entry kind.
    pub file_type: FileType,
    /// Creation time in milliseconds since the UNIX epoch, 0 if unknown.
    pub ctime: i64,
    /// Modification time in milliseconds since the UNIX epoch, 0 if unknown.
    pub mtime: i64,
    /// Size in bytes. Always 0 for directories.
    pub size: u64,
}

impl FileStat {
    /// Stat for a file of `size` bytes.
    #[must_use]
    pub fn file(size: u64, timestamp_ms: i64) -> Self {
        Self {
            file_type: FileType::File,
            ctime: timestamp_ms,
            mtime: timestamp_ms,
            size,
        }
    }

    /// Stat for a directory.
    #[must_use]
    pub fn directory(timestamp_ms: i64) -> Self {
        Self {
            file_type: FileType::Directory,
            ctime: timestamp_ms,
            mtime: timestamp_ms,
            size: 0,
        }
    }

    /// Whether this is a file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Whether this is a directory.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// Kind of change reported to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileChangeType {
    /// Existing content changed.
    Changed,
    /// A file was created.
    Created,
    /// A file was deleted.
    Deleted,
}

/// One change to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChangeEvent {
    /// What happened.
    pub change_type: FileChangeType,
    /// Which file it happened to.
    pub uri: Url,
}

/// Options for [`FileSystemProvider::write_file`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Allow creating a file that does not exist.
    pub create: bool,
    /// Allow replacing a file that exists.
    pub overwrite: bool,
}

impl WriteOptions {
    /// Create or overwrite.
    #[must_use]
    pub fn upsert() -> Self {
        Self {
            create: true,
            overwrite: true,
        }
    }
}

/// Options for [`FileSystemProvider::delete`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Delete directories and everything under them.
    pub recursive: bool,
}

/// Options for [`FileSystemProvider::rename`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameOptions {
    /// Replace the target if it exists.
    pub overwrite: bool,
}

/// Options for [`FileSystemProvider::watch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// Watch the whole subtree.
    pub recursive: bool,
    /// Glob patterns to ignore.
    pub excludes: Vec<String>,
}

/// Handle returned by [`FileSystemProvider::watch`]. Dropping it or calling
/// [`WatchHandle::dispose`] stops the watch.
#[derive(Debug, Default)]
pub struct WatchHandle {
    _private: (),
}

impl WatchHandle {
    /// A handle for a watch that has nothing to tear down.
    #[must_use]
    pub fn noop() -> Self {
        Self::default()
    }

    /// Stop watching.
    pub fn dispose(self) {}
}

/// A hierarchical file system registered under a URI scheme.
#[async_trait]
pub trait FileSystemProvider: Send + Sync {
    /// Start watching `uri` for changes.
    fn watch(&self, uri: &Url, options: &WatchOptions) -> WatchHandle;

    /// Metadata for `uri`.
    async fn stat(&self, uri: &Url) -> FsResult<FileStat>;

    /// Entries directly under `uri`, as `(name, kind)` pairs.
    async fn read_directory(&self, uri: &Url) -> FsResult<Vec<(String, FileType)>>;

    /// Create the directory `uri`.
    async fn create_directory(&self, uri: &Url) -> FsResult<()>;

    /// Full content of the file at `uri`.
    async fn read_file(&self, uri: &Url) -> FsResult<Vec<u8>>;

    /// Replace or create the file at `uri`.
    async fn write_file(&self, uri: &Url, content: &[u8], options: WriteOptions) -> FsResult<()>;

    /// Delete the file or directory at `uri`.
    async fn delete(&self, uri: &Url, options: DeleteOptions) -> FsResult<()>;

    /// Move `old` to `new`.
    async fn rename(&self, old: &Url, new: &Url, options: RenameOptions) -> FsResult<()>;

    /// Receive batches of change events.
    fn subscribe(&self) -> broadcast::Receiver<Vec<FileChangeEvent>>;
}
