//! Shared test utilities for the Fabric definition file system.
//!
//! This crate provides a scriptable [`MockArtifactManager`], a toggleable
//! [`MockFeatureFlags`], and fixtures for artifacts, definitions and local
//! item folders. Use it as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! fabric-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use fabric_test::{MockArtifactManager, test_artifact, test_definition};
//!
//! #[tokio::test]
//! async fn fetch_is_counted() {
//!     let artifact = test_artifact();
//!     let api = MockArtifactManager::new()
//!         .with_definition(&artifact, test_definition(&[("a.json", "{}")]));
//!     api.get_artifact_definition(&artifact).await.unwrap();
//!     assert_eq!(api.get_calls(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
