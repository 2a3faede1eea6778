//! API error type for resource handlers
//!
//! Maps engine failures to HTTP statuses and the shared error envelope.
//!
//! ```rust
//! use procurement_service::handlers::{ApiError, ApiErrorKind, ApiOperation};
//! use procurement_service::resource::ResourceError;
//!
//! let error = ApiError::from_resource(ApiOperation::Delete, ResourceError::not_found("gone"));
//! assert_eq!(error.kind, ApiErrorKind::NotFound);
//! assert_eq!(error.message, "gone");
//! ```

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use super::response::METHODS;
use crate::error::ErrorBody;
use crate::repository::Record;
use crate::resource::ResourceError;

/// Operation being performed when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    Read,
    Create,
    Update,
    Delete,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Nothing active matched
    NotFound,
    /// Request validation failed
    ValidationFailed,
    /// Bulk update ids and bodies are not aligned
    CountMismatch,
    /// Update body has no mutable field
    EmptyUpdate,
    /// Malformed id parameter
    BadRequest,
    /// A query matched more than one record
    Conflict,
    /// Internal server error
    InternalError,
    /// Storage temporarily unavailable
    ServiceUnavailable,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::CountMismatch => write!(f, "count_mismatch"),
            Self::EmptyUpdate => write!(f, "empty_update"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::Conflict => write!(f, "conflict"),
            Self::InternalError => write!(f, "internal_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ValidationFailed | Self::CountMismatch | Self::EmptyUpdate => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code string for this error kind
    #[must_use]
    pub fn error_code(&self) -> String {
        format!("{}", self).to_uppercase()
    }

    /// Whether the detail must stay out of the response body
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::InternalError | Self::ServiceUnavailable)
    }
}

/// Structured API error with operation context
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// The operation being performed when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Resource slug, when known
    pub resource: Option<String>,
    /// Records a query matched, for ambiguous deletes
    pub candidates: Vec<Record>,
    /// Expected parameters, shown outside production
    pub hints: Option<Value>,
}

impl ApiError {
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            resource: None,
            candidates: Vec::new(),
            hints: None,
        }
    }

    /// Classify an engine failure
    pub fn from_resource(operation: ApiOperation, err: ResourceError) -> Self {
        let kind = match &err {
            ResourceError::Validation(_) => ApiErrorKind::ValidationFailed,
            ResourceError::NotFound(_) => ApiErrorKind::NotFound,
            ResourceError::AmbiguousMatch { .. } => ApiErrorKind::Conflict,
            ResourceError::CountMismatch { .. } => ApiErrorKind::CountMismatch,
            ResourceError::EmptyUpdate => ApiErrorKind::EmptyUpdate,
            ResourceError::InvalidIdFormat { .. } => ApiErrorKind::BadRequest,
            ResourceError::Storage(e) if e.is_retriable() => ApiErrorKind::ServiceUnavailable,
            ResourceError::Storage(_) => ApiErrorKind::InternalError,
        };

        // The storage detail goes to the log only
        if let ResourceError::Storage(e) = &err {
            tracing::error!(
                operation = %operation,
                storage_operation = %e.operation,
                table = ?e.table,
                retriable = e.is_retriable(),
                "Storage error: {}", e.message
            );
        }

        let message = match kind {
            ApiErrorKind::ServiceUnavailable => "Service temporarily unavailable".to_string(),
            ApiErrorKind::InternalError => "An internal error occurred".to_string(),
            _ => err.to_string(),
        };

        let candidates = match err {
            ResourceError::AmbiguousMatch { candidates, .. } => candidates,
            _ => Vec::new(),
        };

        Self {
            operation,
            kind,
            message,
            resource: None,
            candidates,
            hints: None,
        }
    }

    /// Attach the resource slug
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Attach parameter hints
    #[must_use]
    pub fn with_hints(mut self, hints: Value) -> Self {
        self.hints = Some(hints);
        self
    }

    /// Check if this error is retriable
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind, ApiErrorKind::ServiceUnavailable)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref resource) = self.resource {
            write!(f, " [{}]", resource)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        if self.kind.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                resource = ?self.resource,
                retriable = self.is_retriable(),
                "API error: {}", self.message
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                kind = %self.kind,
                resource = ?self.resource,
                "API error: {}", self.message
            );
        }

        let mut body = ErrorBody::new(
            self.message,
            &self.kind.error_code(),
            &self.kind.to_string(),
        )
        .with_metadata("methods", json!(METHODS));

        if !self.candidates.is_empty() {
            body = body.with_metadata("candidates", json!(self.candidates));
        }
        if let Some(hints) = self.hints {
            body = body.with_metadata("hints", hints);
        }

        (status, Json(body)).into_response()
    }
}
