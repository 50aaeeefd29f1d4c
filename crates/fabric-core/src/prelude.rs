//! Prelude module - commonly used types for convenient import.
//!
//! Use `use fabric_core::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use fabric_core::prelude::*;
//!
//! let artifact = Artifact::new("ws-1", "item-1", "Sales Model", "SemanticModel");
//! let codec = StandardBase64Encoder;
//! let definition = ItemDefinition::new(vec![DefinitionPart::inline(
//!     "model.tmdl",
//!     codec.encode(b"model Model"),
//! )]);
//! assert_eq!(artifact.key().artifact_id, "item-1");
//! assert!(definition.part("model.tmdl").is_some());
//! ```

// Errors
pub use crate::{ApiError, ApiResult, CodecError, CodecResult};

// Data model
pub use crate::{Artifact, ArtifactKey, DefinitionPart, ItemDefinition, PLATFORM_FILE, PayloadType};

// Collaborator contracts
pub use crate::{ApiResponse, ArtifactManager, DefinitionEnvelope, FeatureFlags};

// Codecs
pub use crate::{Base64Encoder, LenientBase64Encoder, StandardBase64Encoder};
