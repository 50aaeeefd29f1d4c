//! Fabric Core - Foundation types and traits for Fabric item definitions.
//!
//! This crate provides:
//! - The artifact and item-definition data model shared by every crate
//! - The `ArtifactManager` contract for the remote definition API
//! - The `Base64Encoder` contract and its standard implementations
//! - The `FeatureFlags` contract used to gate definition editing
//! - Error types for API and codec failures

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod api;
pub mod artifact;
pub mod codec;
pub mod definition;
pub mod error;
pub mod flags;

pub use api::{ApiResponse, ArtifactManager, DefinitionEnvelope};
pub use artifact::{Artifact, ArtifactKey};
pub use codec::{Base64Encoder, LenientBase64Encoder, StandardBase64Encoder};
pub use definition::{
    DefinitionPart, ItemDefinition, PLATFORM_FILE, PayloadType, directory_prefix, is_valid_part_path,
};
pub use error::{ApiError, ApiResult, CodecError, CodecResult};
pub use flags::FeatureFlags;
