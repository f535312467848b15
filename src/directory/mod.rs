//! Directory (map) service access.
//!
//! [`DirectoryClient`] is the seam the reconciliation engine talks through;
//! [`HttpDirectoryClient`] is the production implementation and
//! [`RequestSigner`] is where the shared-secret header is applied.

pub mod auth;
pub mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod http;

pub use auth::{RequestSigner, SharedSecretHeader};
pub use client::{DirectoryClient, DirectoryResponse};
pub use http::HttpDirectoryClient;
