//! Errors returned by ledger commands.

use caixa_core::budget::BudgetError;
use caixa_core::ledger::LedgerError;
use caixa_shared::{AppError, ErrorCategory};
use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;
use uuid::Uuid;

/// `lock_not_available`, raised when `lock_timeout` expires.
const SQLSTATE_LOCK_NOT_AVAILABLE: &str = "55P03";
/// `deadlock_detected`.
const SQLSTATE_DEADLOCK: &str = "40P01";
/// `serialization_failure`.
const SQLSTATE_SERIALIZATION: &str = "40001";

/// Failure of a ledger or budget command.
///
/// Every variant leaves the database as it was before the command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A ledger rule rejected the command, or an entity is missing.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A budget rule rejected the command.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// The operation id was already applied by an earlier command.
    #[error("Operation '{operation_id}' was already applied")]
    DuplicateOperation {
        /// The resubmitted operation id.
        operation_id: String,
        /// Entity produced by the original command.
        result_entity_id: Option<Uuid>,
    },

    /// A row lock could not be acquired in time.
    #[error("Lock timeout: {0}")]
    LockTimeout(String),

    /// Deadlock or serialization failure.
    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    /// A command result could not be serialized for the operation log.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(DbErr),
}

/// Result type for ledger commands.
pub type CommandResult<T> = Result<T, CommandError>;

impl From<DbErr> for CommandError {
    fn from(err: DbErr) -> Self {
        match sqlstate(&err).as_deref() {
            Some(SQLSTATE_LOCK_NOT_AVAILABLE) => Self::LockTimeout(err.to_string()),
            Some(SQLSTATE_DEADLOCK | SQLSTATE_SERIALIZATION) => Self::Conflict(err.to_string()),
            _ => Self::Database(err),
        }
    }
}

/// Extracts the Postgres SQLSTATE carried by a driver error, if any.
fn sqlstate(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Exec(e) | DbErr::Query(e) | DbErr::Conn(e) => e,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(e) => e
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned()),
        RuntimeErr::Internal(_) => None,
    }
}

impl CommandError {
    /// Returns the stable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Budget(e) => e.error_code(),
            Self::DuplicateOperation { .. } => "DUPLICATE_OPERATION",
            Self::LockTimeout(_) => "LOCK_TIMEOUT",
            Self::Conflict(_) => "CONCURRENT_UPDATE",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the category callers use to decide how to react.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Ledger(e) => e.category(),
            Self::Budget(e) => e.category(),
            Self::DuplicateOperation { .. } => ErrorCategory::DuplicateOperation,
            Self::LockTimeout(_) | Self::Conflict(_) => ErrorCategory::Transient,
            Self::Serialization(_) | Self::Database(_) => ErrorCategory::Internal,
        }
    }

    /// Returns true if resubmitting the same command may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Transient)
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        let code = err.error_code();
        match err.category() {
            ErrorCategory::NotFound => Self::NotFound(err.to_string()),
            ErrorCategory::InvariantViolation => Self::BusinessRule {
                code,
                message: err.to_string(),
            },
            ErrorCategory::DuplicateOperation => Self::DuplicateOperation(err.to_string()),
            ErrorCategory::Transient => Self::Busy(err.to_string()),
            ErrorCategory::Internal => Self::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ledger_errors_keep_their_code() {
        let err = CommandError::from(LedgerError::CreditLimitExceeded {
            account_id: Uuid::nil(),
            available: dec!(300),
            requested: dec!(301),
        });
        assert_eq!(err.error_code(), "CREDIT_LIMIT_EXCEEDED");
        assert_eq!(err.category(), ErrorCategory::InvariantViolation);
        assert!(!err.is_retryable());

        let app: AppError = err.into();
        assert_eq!(app.error_code(), "CREDIT_LIMIT_EXCEEDED");
    }

    #[test]
    fn test_missing_entities_map_to_not_found() {
        let err = CommandError::from(LedgerError::AccountNotFound(Uuid::nil()));
        assert!(matches!(AppError::from(err), AppError::NotFound(_)));

        let err = CommandError::from(BudgetError::NotFound(Uuid::nil()));
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_lock_failures_are_retryable() {
        let timeout = CommandError::LockTimeout("accounts".into());
        assert!(timeout.is_retryable());
        assert!(AppError::from(timeout).is_retryable());
        assert!(CommandError::Conflict("deadlock".into()).is_retryable());
    }

    #[test]
    fn test_duplicate_operation_is_not_retryable() {
        let err = CommandError::DuplicateOperation {
            operation_id: "op-1".into(),
            result_entity_id: Some(Uuid::nil()),
        };
        assert_eq!(err.category(), ErrorCategory::DuplicateOperation);
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Operation 'op-1' was already applied");
    }

    #[test]
    fn test_plain_db_errors_are_internal() {
        let err = CommandError::from(DbErr::RecordNotFound("accounts".into()));
        assert!(matches!(err, CommandError::Database(_)));
        assert_eq!(err.category(), ErrorCategory::Internal);
    }
}
