//! Ledger command coordinator.
//!
//! Every command runs in one [`UnitOfWork`]: check the operation id, lock
//! the rows it mutates, run the pure domain service, persist, record the
//! operation, commit. Any error rolls the unit of work back before it is
//! returned. Audit entries are written after commit and never affect the
//! outcome.

mod accounts;
mod budgets;
mod installments;
mod operations;
mod recurrence;
mod transactions;
mod transfers;

pub use recurrence::RecurrenceRun;
pub use transactions::ReceiptImport;
pub use transfers::InvoicePayment;

use std::sync::Arc;

use caixa_core::ledger::{AuditEntry, LedgerError, OperationRecord, OperationType};
use caixa_shared::{ErrorCategory, LedgerConfig};
use chrono::{Duration, Utc};
use sea_orm::{DatabaseConnection, DatabaseTransaction};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CommandError, CommandResult};
use crate::repositories::{
    AccountRepository, AuditLogRepository, AuditSink, BudgetRepository, CategoryRepository,
    OperationLogRepository, RecurrenceRepository, TransactionRepository,
};
use crate::unit_of_work::UnitOfWork;

/// Entry point for every ledger and budget write.
#[derive(Clone)]
pub struct LedgerCommands {
    db: DatabaseConnection,
    accounts: AccountRepository,
    transactions: TransactionRepository,
    categories: CategoryRepository,
    recurrences: RecurrenceRepository,
    budgets: BudgetRepository,
    operations: OperationLogRepository,
    audit: Arc<dyn AuditSink>,
    config: LedgerConfig,
}

impl std::fmt::Debug for LedgerCommands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerCommands")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LedgerCommands {
    /// Creates a coordinator writing audit entries to the `audit_logs` table.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: LedgerConfig) -> Self {
        Self {
            accounts: AccountRepository::new(db.clone()),
            transactions: TransactionRepository::new(db.clone()),
            categories: CategoryRepository::new(db.clone()),
            recurrences: RecurrenceRepository::new(db.clone()),
            budgets: BudgetRepository::new(db.clone()),
            operations: OperationLogRepository::new(db.clone()),
            audit: Arc::new(AuditLogRepository::new(db.clone())),
            db,
            config,
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Ledger settings in effect.
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    async fn begin(&self) -> CommandResult<UnitOfWork> {
        Ok(UnitOfWork::begin(&self.db, self.config.lock_timeout_ms).await?)
    }

    /// Commits on success; rolls back and reports on failure.
    async fn finish<T>(
        &self,
        uow: UnitOfWork,
        command: &'static str,
        result: CommandResult<T>,
    ) -> CommandResult<T> {
        match result {
            Ok(value) => {
                uow.commit().await?;
                debug!(command, "command committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(command, error = %rollback_err, "rollback failed");
                }
                let err = self.resolve_duplicate(err).await;
                match err.category() {
                    ErrorCategory::DuplicateOperation => {
                        info!(command, error = %err, "duplicate operation rejected");
                    }
                    ErrorCategory::Transient => {
                        warn!(
                            command,
                            code = err.error_code(),
                            error = %err,
                            "command rolled back"
                        );
                    }
                    ErrorCategory::Internal => {
                        warn!(command, error = %err, "command failed");
                    }
                    ErrorCategory::NotFound | ErrorCategory::InvariantViolation => {
                        debug!(command, code = err.error_code(), "command rejected");
                    }
                }
                Err(err)
            }
        }
    }

    /// Fills in the result entity of a duplicate detected by the primary key.
    ///
    /// The competing command has committed by the time our insert failed.
    async fn resolve_duplicate(&self, err: CommandError) -> CommandError {
        match err {
            CommandError::DuplicateOperation {
                operation_id,
                result_entity_id: None,
            } => {
                let result_entity_id = self
                    .operations
                    .find(self.operations.connection(), &operation_id)
                    .await
                    .ok()
                    .flatten()
                    .and_then(|record| record.result_entity_id);
                CommandError::DuplicateOperation {
                    operation_id,
                    result_entity_id,
                }
            }
            other => other,
        }
    }

    async fn ensure_new_operation(
        &self,
        txn: &DatabaseTransaction,
        operation_id: Option<&str>,
    ) -> CommandResult<()> {
        match operation_id {
            Some(id) => self.operations.ensure_new(txn, id).await,
            None => Ok(()),
        }
    }

    async fn record_operation<T: Serialize>(
        &self,
        txn: &DatabaseTransaction,
        operation_id: Option<&str>,
        operation_type: OperationType,
        result_entity_id: Option<Uuid>,
        result: &T,
    ) -> CommandResult<()> {
        let Some(operation_id) = operation_id else {
            return Ok(());
        };
        let record = OperationRecord::new(
            operation_id,
            operation_type,
            result_entity_id,
            serde_json::to_value(result)?,
            Utc::now(),
            self.retention(),
        );
        self.operations.record(txn, &record).await
    }

    async fn ensure_category(&self, txn: &DatabaseTransaction, id: Uuid) -> CommandResult<()> {
        if self.categories.exists(txn, id).await? {
            Ok(())
        } else {
            Err(LedgerError::CategoryNotFound(id).into())
        }
    }

    fn retention(&self) -> Duration {
        Duration::hours(i64::from(self.config.operation_log_retention_hours))
    }

    async fn audit(&self, entries: impl IntoIterator<Item = AuditEntry>) {
        for entry in entries {
            if let Err(err) = self.audit.log(&entry).await {
                warn!(
                    entity_type = entry.entity_type.as_str(),
                    entity_id = %entry.entity_id,
                    action = entry.action.as_str(),
                    error = %err,
                    "failed to write audit entry"
                );
            }
        }
    }
}
