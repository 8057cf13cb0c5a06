use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OncoscopeError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, OncoscopeError>;

/// Errors surfaced to API clients, mapped to HTTP status codes.
///
/// Validation, format, and empty-cohort failures are the caller's fault
/// and become 400s with a descriptive message. Everything unexpected
/// becomes a 500 with a generic message; the detail goes to the log and
/// the `details` field only.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request-level validation failure (missing file, wrong type, oversized).
    #[error("{0}")]
    Validation(String),

    /// Uploaded CSV could not be interpreted at all.
    #[error("{0}")]
    Format(String),

    /// No patient survived parsing and scoring.
    #[error("{0}")]
    EmptyCohort(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(msg) | ApiError::Format(msg) | ApiError::EmptyCohort(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg }),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(detail = %msg, "internal error while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to process request", "details": msg }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}
