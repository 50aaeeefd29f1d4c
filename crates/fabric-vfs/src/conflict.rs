//! Detection of local edits that diverge from a remote definition.
//!
//! Formatting noise is not a conflict: JSON parts are compared
//! structurally, ignoring key order and key case, and everything else is
//! compared with whitespace removed.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use fabric_core::{Base64Encoder, ItemDefinition};
use serde_json::Value;
use tracing::debug;

use crate::error::FsResult;
use crate::path::resolve_part_path;

/// Compares a local item folder against a remote definition.
#[derive(Clone)]
pub struct ConflictDetector {
    encoder: Arc<dyn Base64Encoder>,
}

impl ConflictDetector {
    /// Create a detector decoding payloads with `encoder`.
    #[must_use]
    pub fn new(encoder: Arc<dyn Base64Encoder>) -> Self {
        Self { encoder }
    }

    /// Part paths whose local file exists and differs materially from the
    /// remote payload. Parts with no local counterpart are not conflicts.
    ///
    /// # Errors
    ///
    /// Returns an error if a part path is malformed, a payload does not
    /// decode, or a local file exists but cannot be read.
    pub async fn conflicting_files(
        &self,
        local_folder: &Path,
        remote: &ItemDefinition,
    ) -> FsResult<Vec<String>> {
        let mut conflicts = Vec::new();

        for part in &remote.parts {
            let local_path = resolve_part_path(local_folder, &part.path)?;
            let local = match tokio::fs::read(&local_path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let remote_bytes = self.encoder.decode(&part.payload)?;

            if contents_differ(&part.path, &local, &remote_bytes) {
                debug!(path = %part.path, "local file differs from remote");
                conflicts.push(part.path.clone());
            }
        }

        Ok(conflicts)
    }
}

impl std::fmt::Debug for ConflictDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConflictDetector").finish_non_exhaustive()
    }
}

/// Whether `local` and `remote` differ beyond formatting.
///
/// Non-UTF-8 content is compared byte for byte.
#[must_use]
pub fn contents_differ(path: &str, local: &[u8], remote: &[u8]) -> bool {
    let (Ok(local_text), Ok(remote_text)) = (std::str::from_utf8(local), std::str::from_utf8(remote))
    else {
        return local != remote;
    };

    if is_json_path(path) {
        let parsed = (
            serde_json::from_str::<Value>(local_text),
            serde_json::from_str::<Value>(remote_text),
        );
        if let (Ok(l), Ok(r)) = parsed {
            return !json_equivalent(&l, &r);
        }
    }

    !without_whitespace(local_text).eq(without_whitespace(remote_text))
}

fn is_json_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn without_whitespace(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().filter(|c| !c.is_whitespace())
}

/// Deep equality with case-insensitive object keys.
fn json_equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => {
            let b_by_key: HashMap<String, &Value> =
                b.iter().map(|(k, v)| (k.to_lowercase(), v)).collect();
            let a_by_key: HashMap<String, &Value> =
                a.iter().map(|(k, v)| (k.to_lowercase(), v)).collect();

            a_by_key.len() == b_by_key.len()
                && a_by_key.iter().all(|(k, av)| {
                    b_by_key
                        .get(k)
                        .is_some_and(|bv| json_equivalent(av, bv))
                })
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equivalent(x, y))
        },
        _ => a == b,
    }
}
