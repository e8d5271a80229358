//! Structured error responses.
//!
//! Every layer returns an [`AppError`] carrying an HTTP status, a short
//! user-visible message and (internally) the wrapped cause. Only the user
//! message is serialized to the client; causes are logged at the boundary.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

/// Standard error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error identifier (e.g. "FORBIDDEN")
    pub error: String,
    /// Human-readable error message
    pub message: String,
}

/// Application error type convertible to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl AppError {
    /// Wrap an internal cause with a source tag. The cause is logged here;
    /// the client only sees a generic message.
    pub fn internal(tag: &str, cause: impl std::fmt::Display) -> Self {
        tracing::error!("{}: {}", tag, cause);
        AppError::Internal("internal server error".to_string())
    }

    /// 403 naming the permission bit the caller is missing.
    pub fn missing_permission(bit: impl std::fmt::Display) -> Self {
        AppError::Forbidden(format!("missing permission: {}", bit))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", m),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", m),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "FORBIDDEN", m),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "NOT_FOUND", m),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "CONFLICT", m),
            AppError::PayloadTooLarge(m) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", m)
            }
            AppError::Internal(m) => {
                tracing::error!("internal error: {}", m);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal server error".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal server error".to_string(),
                )
            }
            AppError::JsonExtractorRejection(e) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", e.body_text())
            }
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", e.to_string()),
            AppError::SerdeJson(e) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", e.to_string()),
        };

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}
