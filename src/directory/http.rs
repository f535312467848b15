//! `reqwest`-backed [`DirectoryClient`].

use std::sync::Arc;

use axum::http::StatusCode;

use super::auth::{RequestSigner, SharedSecretHeader};
use super::client::{DirectoryClient, DirectoryResponse};
use crate::config::RoomConfig;
use crate::domain::RegistrationPayload;
use crate::error::DirectoryError;

/// HTTP client for the directory service.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpDirectoryClient {
    http: reqwest::Client,
    base: String,
    signer: Arc<dyn RequestSigner>,
}

impl HttpDirectoryClient {
    /// Creates a client for `config.map_url`, signing requests with the
    /// configured shared secret.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn from_config(config: &RoomConfig) -> Result<Self, DirectoryError> {
        let http = reqwest::Client::builder()
            .timeout(config.directory_timeout)
            .build()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;
        Ok(Self::with_signer(
            http,
            &config.map_url,
            Arc::new(SharedSecretHeader::from_config(config)),
        ))
    }

    /// Creates a client from its parts.
    #[must_use]
    pub fn with_signer(http: reqwest::Client, base: &str, signer: Arc<dyn RequestSigner>) -> Self {
        Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            signer,
        }
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/{id}", self.base)
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<DirectoryResponse, DirectoryError> {
        let response = self
            .signer
            .sign(request)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify)?;
        let status: StatusCode = response.status();
        let body = response.text().await.map_err(classify)?;
        tracing::trace!(status = status.as_u16(), %body, "directory response");
        Ok(DirectoryResponse { status, body })
    }
}

fn classify(e: reqwest::Error) -> DirectoryError {
    if e.is_connect() {
        DirectoryError::Unreachable(e.to_string())
    } else if e.is_builder() {
        DirectoryError::InvalidUrl(e.to_string())
    } else {
        DirectoryError::Transport(e.to_string())
    }
}

impl DirectoryClient for HttpDirectoryClient {
    async fn find_room(&self, owner: &str, name: &str) -> Result<DirectoryResponse, DirectoryError> {
        let request = self
            .http
            .get(&self.base)
            .query(&[("owner", owner), ("name", name)]);
        self.execute(request).await
    }

    async fn get_room(&self, id: &str) -> Result<DirectoryResponse, DirectoryError> {
        let request = self.http.get(self.record_url(id));
        self.execute(request).await
    }

    async fn create_room(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<DirectoryResponse, DirectoryError> {
        let request = self.http.post(&self.base).json(payload);
        self.execute(request).await
    }

    async fn update_room(
        &self,
        id: &str,
        payload: &RegistrationPayload,
    ) -> Result<DirectoryResponse, DirectoryError> {
        let request = self.http.put(self.record_url(id)).json(payload);
        self.execute(request).await
    }
}
