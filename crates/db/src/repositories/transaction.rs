//! Transaction repository.

use caixa_core::ledger::{LedgerError, Transaction};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::entities::transactions;
use crate::error::CommandResult;

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert(&self, txn: &DatabaseTransaction, tx: &Transaction) -> Result<(), DbErr> {
        transactions::ActiveModel::from(tx).insert(txn).await?;
        Ok(())
    }

    /// Inserts several transactions in one statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_many(
        &self,
        txn: &DatabaseTransaction,
        rows: &[Transaction],
    ) -> Result<(), DbErr> {
        if rows.is_empty() {
            return Ok(());
        }
        transactions::Entity::insert_many(rows.iter().map(transactions::ActiveModel::from))
            .exec(txn)
            .await?;
        Ok(())
    }

    /// Persists status, adjustment and cancellation fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn save_state(
        &self,
        txn: &DatabaseTransaction,
        tx: &Transaction,
    ) -> Result<(), DbErr> {
        transactions::ActiveModel::state_change(tx).update(txn).await?;
        Ok(())
    }

    /// Reads a transaction without locking it.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>, DbErr> {
        Ok(transactions::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Transaction::from))
    }

    /// Loads a transaction holding its row lock.
    ///
    /// Callers lock the owning account first.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` or a lock timeout.
    pub async fn get_for_exclusive_mutation(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> CommandResult<Transaction> {
        let model = transactions::Entity::find_by_id(id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))?;
        Ok(model.into())
    }

    /// Locks every member of an installment group, ordered by number.
    ///
    /// # Errors
    ///
    /// Returns `InstallmentGroupNotFound` if the group has no members.
    pub async fn lock_installment_group(
        &self,
        txn: &DatabaseTransaction,
        group_id: Uuid,
    ) -> CommandResult<Vec<Transaction>> {
        let members = transactions::Entity::find()
            .filter(transactions::Column::InstallmentGroupId.eq(group_id))
            .order_by_asc(transactions::Column::InstallmentNumber)
            .order_by_asc(transactions::Column::CreatedAt)
            .lock_exclusive()
            .all(txn)
            .await?;
        if members.is_empty() {
            return Err(LedgerError::InstallmentGroupNotFound(group_id).into());
        }
        Ok(members.into_iter().map(Transaction::from).collect())
    }

    /// Locks both legs of a transfer.
    ///
    /// # Errors
    ///
    /// Returns `TransferNotFound` if the group has no members.
    pub async fn lock_transfer_group(
        &self,
        txn: &DatabaseTransaction,
        group_id: Uuid,
    ) -> CommandResult<Vec<Transaction>> {
        let legs = transactions::Entity::find()
            .filter(transactions::Column::TransferGroupId.eq(group_id))
            .order_by_asc(transactions::Column::Id)
            .lock_exclusive()
            .all(txn)
            .await?;
        if legs.is_empty() {
            return Err(LedgerError::TransferNotFound(group_id).into());
        }
        Ok(legs.into_iter().map(Transaction::from).collect())
    }

    /// Reads any member of a group to find the accounts it touches.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_transfer_group(&self, group_id: Uuid) -> Result<Vec<Transaction>, DbErr> {
        Ok(transactions::Entity::find()
            .filter(transactions::Column::TransferGroupId.eq(group_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(Transaction::from)
            .collect())
    }

    /// Reads the members of an installment group.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_installment_group(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<Transaction>, DbErr> {
        Ok(transactions::Entity::find()
            .filter(transactions::Column::InstallmentGroupId.eq(group_id))
            .order_by_asc(transactions::Column::InstallmentNumber)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Transaction::from)
            .collect())
    }

    /// Lists an account's transactions with competence in `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_in_period(
        &self,
        account_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>, DbErr> {
        Ok(transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id))
            .filter(transactions::Column::CompetenceDate.between(start, end))
            .order_by_asc(transactions::Column::CompetenceDate)
            .order_by_asc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Transaction::from)
            .collect())
    }
}
