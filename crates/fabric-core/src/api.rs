//! Remote definition API contract.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::definition::ItemDefinition;
use crate::error::ApiResult;

/// A response from the remote API.
///
/// Callers only look at whether a body was parsed; status codes are kept
/// for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// HTTP status code.
    pub status: u16,
    /// Parsed response body, if the service returned one.
    pub parsed_body: Option<T>,
}

impl<T> ApiResponse<T> {
    /// A `200 OK` response carrying `body`.
    #[must_use]
    pub fn ok(body: T) -> Self {
        Self {
            status: 200,
            parsed_body: Some(body),
        }
    }

    /// A response without a parsed body.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            parsed_body: None,
        }
    }
}

/// Body of a get-definition response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionEnvelope {
    /// The artifact's full definition.
    pub definition: ItemDefinition,
}

/// Remote API for reading and replacing artifact definitions.
///
/// Both calls have arbitrary latency and may fail arbitrarily; timeouts are
/// the implementation's business.
#[async_trait]
pub trait ArtifactManager: Send + Sync {
    /// Fetch the full definition of `artifact`.
    async fn get_artifact_definition(
        &self,
        artifact: &Artifact,
    ) -> ApiResult<ApiResponse<DefinitionEnvelope>>;

    /// Replace the full definition of `artifact`.
    ///
    /// `folder` is the local folder the definition was read from, or an
    /// empty placeholder when the definition never touched disk.
    async fn update_artifact_definition(
        &self,
        artifact: &Artifact,
        definition: &ItemDefinition,
        folder: &Path,
    ) -> ApiResult<ApiResponse<serde_json::Value>>;
}
