//! Error handling module
//!
//! Centralized error types and HTTP response conversion. Storage and
//! internal failures are logged here and surfaced with a generic message.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::domain::DomainError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<crate::auth::AuthError> for AppError {
    fn from(err: crate::auth::AuthError) -> Self {
        use crate::auth::AuthError;
        match err {
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::MalformedHeader
            | AuthError::InvalidToken(_) => AppError::Unauthenticated(err.to_string()),
            AuthError::Hashing(msg) | AuthError::Signing(msg) => AppError::Internal(msg),
        }
    }
}

// Extractor rejections are client input errors.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Domain(DomainError::validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Domain(DomainError::validation(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Domain(DomainError::validation(rejection.body_text()))
    }
}

impl From<crate::domain::AmountError> for AppError {
    fn from(err: crate::domain::AmountError) -> Self {
        AppError::Domain(err.into())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Unique-key violations are client conflicts, not server failures.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

const GENERIC_SERVER_ERROR: &str = "Internal server error";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match &self {
            // 401 Unauthorized
            AppError::Unauthenticated(_) => {
                (StatusCode::UNAUTHORIZED, "unauthenticated", self.to_string(), None)
            }

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => match domain_err {
                DomainError::Validation(_) => (
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    domain_err.to_string(),
                    None,
                ),
                DomainError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "not_found", domain_err.to_string(), None)
                }
                DomainError::Conflict(_) => {
                    (StatusCode::CONFLICT, "conflict", domain_err.to_string(), None)
                }
                DomainError::InsufficientStock {
                    available,
                    requested,
                } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "insufficient_stock",
                    domain_err.to_string(),
                    Some(json!({ "available": available, "requested": requested })),
                ),
                DomainError::Forbidden(_) => {
                    (StatusCode::FORBIDDEN, "forbidden", domain_err.to_string(), None)
                }
            },

            // 409 for unique keys the pre-check raced past
            AppError::Database(e) if is_unique_violation(e) => {
                tracing::warn!("Unique constraint violation: {}", e);
                (
                    StatusCode::CONFLICT,
                    "conflict",
                    "Conflict: resource already exists".to_string(),
                    None,
                )
            }

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    GENERIC_SERVER_ERROR.to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    GENERIC_SERVER_ERROR.to_string(),
                    None,
                )
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    GENERIC_SERVER_ERROR.to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
