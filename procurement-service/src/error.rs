//! Error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::repository::RepositoryError;

/// Sanitize a connection URL for logging by redacting credentials
///
/// ```rust
/// use procurement_service::error::sanitize_url;
///
/// assert_eq!(
///     sanitize_url("postgres://app:secret@db:5432/erp"),
///     "postgres://<redacted>@db:5432/erp"
/// );
/// assert_eq!(sanitize_url("postgres://db/erp"), "postgres://db/erp");
/// ```
pub fn sanitize_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(scheme_end) = url.find("://") {
            let scheme = &url[..scheme_end + 3];
            let after_at = &url[at_pos + 1..];
            return format!("{}<redacted>@{}", scheme, after_at);
        }
    }
    url.to_string()
}

/// Result type alias using the service error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the service
///
/// Large error variants are boxed to reduce stack size
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Storage error
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(Box<axum::http::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Validation error (422)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// External service error (502)
    #[error("External service error: {0}")]
    External(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<axum::http::Error> for Error {
    fn from(err: axum::http::Error) -> Self {
        Self::Http(Box::new(err))
    }
}

/// Machine-readable part of an error envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Upper-case error code, e.g. `NOT_FOUND`
    pub code: String,
    /// Lower-case error kind, e.g. `not_found`
    pub kind: String,
}

/// Error response body shared by every endpoint
///
/// `{ "message": ..., "error": { "code", "kind" }, "metadata": { ... } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub error: ErrorDetail,
    pub metadata: Map<String, Value>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>, code: &str, kind: &str) -> Self {
        Self {
            message: message.into(),
            error: ErrorDetail {
                code: code.to_string(),
                kind: kind.to_string(),
            },
            metadata: Map::new(),
        }
    }

    /// Add a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

impl Error {
    /// Status code and kind for this error
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::Repository(e) if e.is_retriable() => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            Error::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            Error::Http(_) => (StatusCode::BAD_REQUEST, "http_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Error::ValidationError(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            Error::External(_) => (StatusCode::BAD_GATEWAY, "external_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();

        // Server-side failures get a generic message; the detail only goes to the log
        let message = match &self {
            Error::NotFound(msg) | Error::BadRequest(msg) | Error::ValidationError(msg) => {
                msg.clone()
            }
            Error::Http(e) => e.to_string(),
            Error::External(_) => {
                tracing::error!(error = %self, "External service error");
                "External service unavailable".to_string()
            }
            Error::Repository(e) => {
                tracing::error!(
                    operation = %e.operation,
                    kind = %e.kind,
                    table = ?e.table,
                    retriable = e.is_retriable(),
                    "Database error: {}", e.message
                );
                if e.is_retriable() {
                    "Service temporarily unavailable".to_string()
                } else {
                    "Database operation failed".to_string()
                }
            }
            _ => {
                tracing::error!(error = %self, "Internal error");
                "Internal server error".to_string()
            }
        };

        let body = ErrorBody::new(message, &kind.to_uppercase(), kind);
        (status, Json(body)).into_response()
    }
}
