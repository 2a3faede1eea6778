//! Resource engine errors

use thiserror::Error;

use crate::repository::{Record, RepositoryError};

/// Result type for resource engine operations
pub type ResourceResult<T> = std::result::Result<T, ResourceError>;

/// Failures that abort a whole resource request
///
/// Per-item failures inside bulk operations are not errors; they are carried
/// in the operation outcome.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Nothing active matched
    #[error("{0}")]
    NotFound(String),

    /// A query delete matched more than one record
    #[error("{message}")]
    AmbiguousMatch {
        message: String,
        candidates: Vec<Record>,
    },

    /// Bulk update ids and bodies are not aligned
    #[error("Number of IDs ({ids}) does not match number of update payloads ({bodies}).")]
    CountMismatch { ids: usize, bodies: usize },

    /// An update body carries no mutable field
    #[error("No valid fields provided for update.")]
    EmptyUpdate,

    /// An id token is not a positive integer
    #[error("Invalid ID format: '{token}'. IDs must be positive integers.")]
    InvalidIdFormat { token: String },

    /// Storage failure
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl ResourceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Short machine-readable kind, used in error envelopes and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::AmbiguousMatch { .. } => "ambiguous_match",
            Self::CountMismatch { .. } => "count_mismatch",
            Self::EmptyUpdate => "empty_update",
            Self::InvalidIdFormat { .. } => "invalid_id_format",
            Self::Storage(_) => "storage",
        }
    }

    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_retriable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryOperation;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ResourceError::CountMismatch { ids: 2, bodies: 3 }.to_string(),
            "Number of IDs (2) does not match number of update payloads (3)."
        );
        assert_eq!(
            ResourceError::InvalidIdFormat {
                token: "abc".to_string()
            }
            .to_string(),
            "Invalid ID format: 'abc'. IDs must be positive integers."
        );
        assert_eq!(
            ResourceError::not_found("Item unit not found.").to_string(),
            "Item unit not found."
        );
    }

    #[test]
    fn test_kind() {
        assert_eq!(ResourceError::EmptyUpdate.kind(), "empty_update");
        assert_eq!(ResourceError::validation("x").kind(), "validation");
        let storage: ResourceError =
            RepositoryError::timeout(RepositoryOperation::Count, "slow").into();
        assert_eq!(storage.kind(), "storage");
        assert!(storage.is_retriable());
        assert!(!ResourceError::EmptyUpdate.is_retriable());
    }
}
