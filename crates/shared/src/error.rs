//! Application-wide error types.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Stable, transport-agnostic classification of a failure.
///
/// The API boundary maps categories to its own status codes; the ledger
/// never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The referenced entity does not exist.
    NotFound,
    /// A ledger or budget rule rejected the command.
    InvariantViolation,
    /// The operation id was already applied.
    DuplicateOperation,
    /// Lock wait, deadlock or serialization conflict; safe to resubmit.
    Transient,
    /// Anything else.
    Internal,
}

impl ErrorCategory {
    /// Returns the machine-readable name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvariantViolation => "invariant_violation",
            Self::DuplicateOperation => "duplicate_operation",
            Self::Transient => "transient",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation.
    #[error("Business rule violation: {message}")]
    BusinessRule {
        /// Stable code of the violated rule.
        code: &'static str,
        /// Human readable description.
        message: String,
    },

    /// The operation was already applied.
    #[error("Duplicate operation: {0}")]
    DuplicateOperation(String),

    /// Transient failure (lock wait, deadlock); the caller may resubmit.
    #[error("Resource busy: {0}")]
    Busy(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Validation(_) | Self::BusinessRule { .. } => ErrorCategory::InvariantViolation,
            Self::DuplicateOperation(_) => ErrorCategory::DuplicateOperation,
            Self::Busy(_) => ErrorCategory::Transient,
            Self::Database(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule { code, .. } => *code,
            Self::DuplicateOperation(_) => "DUPLICATE_OPERATION",
            Self::Busy(_) => "RESOURCE_BUSY",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if resubmitting the same command may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Transient)
    }
}
