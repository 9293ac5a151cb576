use caixa_core::ledger::OperationRecord;
use chrono::{DateTime, Utc};
use tracing::info;

use super::LedgerCommands;
use crate::error::CommandResult;

impl LedgerCommands {
    /// Fetches the stored result of an applied operation.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn find_operation(
        &self,
        operation_id: &str,
    ) -> CommandResult<Option<OperationRecord>> {
        Ok(self
            .operations
            .find(self.operations.connection(), operation_id)
            .await?)
    }

    /// Deletes operation records whose retention window ended before `now`.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn purge_expired_operations(&self, now: DateTime<Utc>) -> CommandResult<u64> {
        let purged = self.operations.purge_expired(now).await?;
        info!(purged, "expired operation records purged");
        Ok(purged)
    }
}
