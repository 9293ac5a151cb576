//! Database transaction scoped to a single ledger command.

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait,
};

/// One atomic ledger command.
///
/// Row locks taken through the transaction are held until [`commit`] or
/// [`rollback`]; dropping the unit of work rolls it back.
///
/// [`commit`]: UnitOfWork::commit
/// [`rollback`]: UnitOfWork::rollback
pub struct UnitOfWork {
    txn: DatabaseTransaction,
}

impl UnitOfWork {
    /// Begins a transaction, bounding lock waits to `lock_timeout_ms`.
    ///
    /// A timeout of zero waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    pub async fn begin(db: &DatabaseConnection, lock_timeout_ms: u64) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        if lock_timeout_ms > 0 {
            txn.execute_unprepared(&format!("SET LOCAL lock_timeout = '{lock_timeout_ms}ms'"))
                .await?;
        }
        Ok(Self { txn })
    }

    /// The underlying transaction.
    #[must_use]
    pub const fn txn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits every write and releases the locks.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; nothing is persisted then.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Discards every write and releases the locks.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback statement fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}
