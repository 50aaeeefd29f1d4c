//! Mapping between part paths and local file system paths.

use std::path::{Component, Path, PathBuf};

use crate::error::{FsError, FsResult};

/// Lexically resolve a part path against a local item folder.
///
/// Does not touch the file system. `.` segments are ignored; `..`,
/// absolute paths, drive prefixes and backslashes are rejected outright,
/// since part paths are always relative and forward-slash separated.
///
/// # Errors
///
/// Returns [`FsError::InvalidPartPath`] for any rejected path.
pub fn resolve_part_path(root: &Path, part_path: &str) -> FsResult<PathBuf> {
    if part_path.is_empty() {
        return Err(FsError::InvalidPartPath("empty part path".into()));
    }
    if part_path.contains('\\') {
        return Err(FsError::InvalidPartPath(format!(
            "{part_path}: backslashes are not allowed"
        )));
    }

    let mut resolved = root.to_path_buf();
    for component in Path::new(part_path).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(FsError::InvalidPartPath(format!(
                    "{part_path}: absolute paths are not allowed"
                )));
            },
            Component::ParentDir => {
                return Err(FsError::InvalidPartPath(format!(
                    "{part_path}: '..' segments are not allowed"
                )));
            },
            Component::CurDir => {},
            Component::Normal(segment) => resolved.push(segment),
        }
    }

    if resolved == root {
        return Err(FsError::InvalidPartPath(format!(
            "{part_path}: does not name a file"
        )));
    }
    Ok(resolved)
}

/// Forward-slash part path of `file` relative to `root`, or `None` if
/// `file` is not under `root` or is not valid UTF-8.
#[must_use]
pub fn part_path_of(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let segments = relative
        .components()
        .map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}
