//! Room service error types with HTTP status code mapping.
//!
//! [`RoomError`] is the central error type. Each variant maps to a specific
//! HTTP status code and structured JSON error response for the operational
//! API. The narrower [`ConfigError`], [`DirectoryError`] and [`SendError`]
//! cover startup, directory transport and per-connection delivery.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "room not found: kitchen"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Startup configuration failures. Always fatal for the process.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting is absent from the environment.
    #[error("missing required configuration value {0}")]
    Missing(&'static str),

    /// A setting is present but cannot be used.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Environment key that held the bad value.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The room catalog file could not be read.
    #[error("cannot read room catalog {path}: {source}")]
    CatalogIo {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The room catalog is not valid JSON or has the wrong shape.
    #[error("malformed room catalog: {0}")]
    CatalogFormat(#[from] serde_json::Error),

    /// The room catalog defines a room that cannot be hosted.
    #[error("invalid room definition: {0}")]
    InvalidRoom(String),
}

/// Transport-level failures talking to the directory service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The directory could not be reached (connection refused, DNS, ...).
    #[error("directory unreachable: {0}")]
    Unreachable(String),

    /// The request was sent but failed in flight (timeout, reset, body read).
    #[error("directory transport failure: {0}")]
    Transport(String),

    /// The directory URL could not be built.
    #[error("invalid directory url: {0}")]
    InvalidUrl(String),
}

/// Failure delivering a single frame to a single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The connection is gone; it will never accept another frame.
    #[error("connection closed")]
    Closed,

    /// The connection's outbound queue is full; this frame was dropped.
    #[error("outbound queue full")]
    QueueFull,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                |
/// |-----------|---------------------|----------------------------|
/// | 2000–2999 | Not Found           | 404 Not Found              |
/// | 3000–3099 | Server              | 500 Internal Server Error  |
/// | 3100–3199 | Directory protocol  | 502 Bad Gateway            |
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No hosted room has the given id.
    #[error("room not found: {0}")]
    RoomNotFound(String),

    /// The directory answered with a status code the protocol does not allow
    /// at this step.
    #[error("unexpected directory response {status}: {body}")]
    Protocol {
        /// HTTP status returned by the directory.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// The directory answered with a body that could not be parsed.
    #[error("malformed directory response: {0}")]
    MalformedResponse(String),

    /// Transport failure talking to the directory.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// An event could not be encoded to JSON.
    #[error("event encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RoomError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::RoomNotFound(_) => 2001,
            Self::Encode(_) => 3000,
            Self::Protocol { .. } => 3101,
            Self::MalformedResponse(_) => 3102,
            Self::Directory(_) => 3103,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::RoomNotFound(_) => StatusCode::NOT_FOUND,
            Self::Protocol { .. } | Self::MalformedResponse(_) | Self::Directory(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RoomError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            Self::Protocol { body, .. } if !body.is_empty() => Some(body.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
