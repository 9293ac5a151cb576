//! Operation log repository for idempotent commands.

use caixa_core::ledger::OperationRecord;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, SqlErr,
};
use tracing::debug;

use crate::entities::operation_logs;
use crate::error::{CommandError, CommandResult};

/// Operation log repository.
#[derive(Debug, Clone)]
pub struct OperationLogRepository {
    db: DatabaseConnection,
}

impl OperationLogRepository {
    /// Creates a new operation log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the record of an applied operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored type is unknown.
    pub async fn find<C: ConnectionTrait>(
        &self,
        conn: &C,
        operation_id: &str,
    ) -> Result<Option<OperationRecord>, DbErr> {
        operation_logs::Entity::find_by_id(operation_id.to_string())
            .one(conn)
            .await?
            .map(OperationRecord::try_from)
            .transpose()
    }

    /// Fails with `DuplicateOperation` if `operation_id` was already applied.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateOperation` or a database error.
    pub async fn ensure_new(
        &self,
        txn: &DatabaseTransaction,
        operation_id: &str,
    ) -> CommandResult<()> {
        match self.find(txn, operation_id).await? {
            Some(record) => Err(CommandError::DuplicateOperation {
                operation_id: record.operation_id,
                result_entity_id: record.result_entity_id,
            }),
            None => Ok(()),
        }
    }

    /// Records an applied operation in the command's transaction.
    ///
    /// A concurrent command that recorded the same id first wins; this one
    /// fails with `DuplicateOperation` and must roll back.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateOperation` or a database error.
    pub async fn record(
        &self,
        txn: &DatabaseTransaction,
        record: &OperationRecord,
    ) -> CommandResult<()> {
        match operation_logs::ActiveModel::from(record).insert(txn).await {
            Ok(_) => Ok(()),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!(operation_id = %record.operation_id, "operation recorded concurrently");
                Err(CommandError::DuplicateOperation {
                    operation_id: record.operation_id.clone(),
                    result_entity_id: None,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes records whose retention window has passed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = operation_logs::Entity::delete_many()
            .filter(operation_logs::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// The connection used for reads outside a command.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}
