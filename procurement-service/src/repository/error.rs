//! Repository error types
//!
//! Structured errors for storage operations, carrying the operation that
//! failed, a coarse category and the table involved.
//!
//! # Example
//!
//! ```rust
//! use procurement_service::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
//!
//! let error = RepositoryError::database_error(RepositoryOperation::Insert, "syntax error")
//!     .with_table("item_units");
//! assert!(matches!(error.kind, RepositoryErrorKind::DatabaseError));
//! assert_eq!(error.table.as_deref(), Some("item_units"));
//! ```

use std::fmt;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Reading active records with filters
    FindActive,
    /// Counting active records
    Count,
    /// Inserting a record
    Insert,
    /// Partially updating a record
    Update,
    /// Stamping `deleted_at` on a record
    SoftDelete,
    /// Creating the backing table
    EnsureSchema,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindActive => write!(f, "find_active"),
            Self::Count => write!(f, "count"),
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::SoftDelete => write!(f, "soft_delete"),
            Self::EnsureSchema => write!(f, "ensure_schema"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// Database constraint violation
    ConstraintViolation,
    /// Failed to connect to database
    ConnectionFailed,
    /// Operation timed out
    Timeout,
    /// Underlying database error
    DatabaseError,
    /// A stored row could not be decoded into a record
    SerializationError,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DatabaseError => write!(f, "database_error"),
            Self::SerializationError => write!(f, "serialization_error"),
        }
    }
}

/// Structured repository error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The table involved, when known
    pub table: Option<String>,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            table: None,
        }
    }

    /// Create a constraint violation error
    pub fn constraint_violation(
        operation: RepositoryOperation,
        message: impl Into<String>,
    ) -> Self {
        Self::new(operation, RepositoryErrorKind::ConstraintViolation, message)
    }

    /// Create a connection failed error
    pub fn connection_failed(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::ConnectionFailed, message)
    }

    /// Create a timeout error
    pub fn timeout(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::Timeout, message)
    }

    /// Create a database error
    pub fn database_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::DatabaseError, message)
    }

    /// Create a serialization error
    pub fn serialization_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::SerializationError, message)
    }

    /// Attach the table name
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Check if this error is retriable (transient errors that may succeed on retry)
    ///
    /// ```rust
    /// use procurement_service::repository::{RepositoryError, RepositoryOperation};
    ///
    /// assert!(RepositoryError::timeout(RepositoryOperation::Count, "slow").is_retriable());
    /// assert!(!RepositoryError::database_error(RepositoryOperation::Count, "bad").is_retriable());
    /// ```
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref table) = self.table {
            write!(f, " [table: {}]", table)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

#[cfg(feature = "database")]
impl RepositoryError {
    /// Classify a sqlx error raised while performing `operation`
    pub fn from_sqlx(operation: RepositoryOperation, err: sqlx::Error) -> Self {
        use sqlx::Error as E;
        match err {
            E::PoolTimedOut => Self::timeout(operation, "Connection pool timed out"),
            E::PoolClosed => Self::connection_failed(operation, "Connection pool is closed"),
            E::Io(e) => Self::connection_failed(operation, e.to_string()),
            E::Tls(e) => Self::connection_failed(operation, format!("TLS error: {}", e)),
            E::ColumnDecode { index, source } => Self::serialization_error(
                operation,
                format!("Failed to decode column {}: {}", index, source),
            ),
            E::Decode(e) => Self::serialization_error(operation, e.to_string()),
            E::Database(db) => {
                let message = db.message().to_string();
                match db.kind() {
                    sqlx::error::ErrorKind::UniqueViolation
                    | sqlx::error::ErrorKind::ForeignKeyViolation
                    | sqlx::error::ErrorKind::NotNullViolation
                    | sqlx::error::ErrorKind::CheckViolation => {
                        Self::constraint_violation(operation, message)
                    }
                    _ => Self::database_error(operation, message),
                }
            }
            other => Self::database_error(operation, other.to_string()),
        }
    }
}
