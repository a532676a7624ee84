//! Error types for readalong-sync
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. The taxonomy is shallow on purpose: nothing in this service
//! is fatal, the worst case is degraded highlighting.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main error type for readalong-sync
#[derive(Error, Debug)]
pub enum Error {
    /// Transcript or chapter document unavailable or unparsable
    #[error("Data error: {0}")]
    Data(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// External player not initialized when a command needed it
    #[error("Player not ready: {0}")]
    PlayerNotReady(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using readalong-sync Error
pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Data(_) | Error::PlayerNotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Config(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "status": format!("error: {}", self),
        }));

        (status, body).into_response()
    }
}
