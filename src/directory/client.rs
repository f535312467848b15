//! The directory client seam.
//!
//! [`DirectoryClient`] speaks raw HTTP semantics (status + body) and leaves
//! every protocol decision to the reconciliation engine. That keeps the
//! engine testable against a scripted fake and the HTTP implementation free
//! of room logic.

use std::future::Future;

use axum::http::StatusCode;

use crate::domain::RegistrationPayload;
use crate::error::DirectoryError;

/// Status and body of one directory response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Raw response body (may be empty).
    pub body: String,
}

impl DirectoryResponse {
    /// Builds a response.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Authenticated access to the directory (map) service.
pub trait DirectoryClient: Send + Sync + 'static {
    /// `GET mapBase?owner=<owner>&name=<name>`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if no HTTP response was obtained.
    fn find_room(
        &self,
        owner: &str,
        name: &str,
    ) -> impl Future<Output = Result<DirectoryResponse, DirectoryError>> + Send;

    /// `GET mapBase/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if no HTTP response was obtained.
    fn get_room(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<DirectoryResponse, DirectoryError>> + Send;

    /// `POST mapBase` with the full payload.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if no HTTP response was obtained.
    fn create_room(
        &self,
        payload: &RegistrationPayload,
    ) -> impl Future<Output = Result<DirectoryResponse, DirectoryError>> + Send;

    /// `PUT mapBase/{id}` with the full payload.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if no HTTP response was obtained.
    fn update_room(
        &self,
        id: &str,
        payload: &RegistrationPayload,
    ) -> impl Future<Output = Result<DirectoryResponse, DirectoryError>> + Send;
}
