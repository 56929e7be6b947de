//! API error types for policypilot-server
//!
//! Every non-2xx response carries `{"error":{"code","message"}}` so clients
//! can branch on the code without parsing prose.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use policypilot_common::Error as CommonError;
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found, or scoped to another org (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or out-of-bounds input, caught before side effects (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Valid request against an invalid state transition (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Per-actor throttle tripped (429)
    #[error("Rate limited: retry in {retry_after_ms} ms")]
    RateLimited { retry_after_ms: u64 },

    /// Missing or insufficient credentials (401/403)
    #[error("Auth error: {0}")]
    Auth(String),

    /// Backing store failure, surfaced with the store's message (500)
    #[error("Database error: {0}")]
    Db(String),

    /// Object storage failure (500)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Db(err.to_string())
    }
}

impl From<CommonError> for ApiError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::NotFound(msg) => ApiError::NotFound(msg),
            CommonError::Validation(msg) => ApiError::Validation(msg),
            CommonError::Conflict(msg) => ApiError::Conflict(msg),
            CommonError::RateLimited { retry_after_ms } => {
                ApiError::RateLimited { retry_after_ms }
            }
            CommonError::Database(err) => ApiError::Db(err.to_string()),
            CommonError::Storage(msg) => ApiError::Storage(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::RateLimited { retry_after_ms } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                format!(
                    "Rate limit reached. Retry in {} seconds.",
                    retry_after_ms.div_ceil(1000)
                ),
            ),
            ApiError::Auth(msg) => (StatusCode::FORBIDDEN, "AUTH_ERROR", msg),
            ApiError::Db(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "DB_ERROR", msg),
            ApiError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", msg),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
