use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failures that end a capture job or keep the server from starting
#[derive(Error, Debug)]
pub enum Error {
    /// Shown as-is so the job reports the capture process's own message
    #[error(transparent)]
    Capture(#[from] fasthar_capture::Error),

    #[error("Capture produced an unusable HAR document: {0}")]
    Har(#[from] fasthar_core::Error),

    #[error("Failed to store snapshot: {0}")]
    Store(#[from] fasthar_store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Error returned from an HTTP handler, rendered as `{"error": "..."}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ApiError::Internal(m) => {
                tracing::error!("Internal error: {}", m);
                (StatusCode::INTERNAL_SERVER_ERROR, m.clone())
            }
        };
        (status, Json(json!({ "error": msg }))).into_response()
    }
}
