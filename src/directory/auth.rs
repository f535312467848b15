//! Request signing for directory calls.
//!
//! The directory verifies callers externally; all this side does is attach
//! the owner id and shared secret to every outgoing request.

use std::fmt;

use crate::config::{RoomConfig, Secret};

/// Header carrying the caller's owner id.
pub const ID_HEADER: &str = "gameon-id";
/// Header carrying the shared secret.
pub const SECRET_HEADER: &str = "gameon-secret";

/// Applies authentication to an outgoing directory request.
pub trait RequestSigner: Send + Sync + fmt::Debug {
    /// Returns the request with authentication applied.
    fn sign(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder;
}

/// Attaches the owner id and shared secret as plain headers.
#[derive(Debug, Clone)]
pub struct SharedSecretHeader {
    owner_id: String,
    secret: Secret,
}

impl SharedSecretHeader {
    /// Creates a signer for the given owner and secret.
    #[must_use]
    pub fn new(owner_id: impl Into<String>, secret: Secret) -> Self {
        Self {
            owner_id: owner_id.into(),
            secret,
        }
    }

    /// Creates a signer from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &RoomConfig) -> Self {
        Self::new(config.owner_id.clone(), config.registration_secret.clone())
    }
}

impl RequestSigner for SharedSecretHeader {
    fn sign(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(ID_HEADER, &self.owner_id)
            .header(SECRET_HEADER, self.secret.expose())
    }
}
