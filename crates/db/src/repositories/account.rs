//! Account repository: persistence and row locking for balances.

use caixa_core::ledger::{Account, LedgerError};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QuerySelect,
    Set,
};
use uuid::Uuid;

use crate::entities::accounts;
use crate::error::CommandResult;

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a freshly opened account.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert(&self, txn: &DatabaseTransaction, account: &Account) -> Result<(), DbErr> {
        accounts::ActiveModel::from(account).insert(txn).await?;
        Ok(())
    }

    /// Reads an account without locking it.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DbErr> {
        Ok(accounts::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Account::from))
    }

    /// Loads an account holding its row lock until the transaction ends.
    ///
    /// Concurrent commands on the same account queue here, so the balance
    /// returned is the one every later write builds on.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, or a lock timeout if the row stays locked
    /// past the configured wait.
    pub async fn get_for_exclusive_mutation(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> CommandResult<Account> {
        let model = accounts::Entity::find_by_id(id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;
        Ok(model.into())
    }

    /// Locks two accounts in ascending id order and returns them in
    /// argument order.
    ///
    /// # Errors
    ///
    /// Same as [`AccountRepository::get_for_exclusive_mutation`].
    pub async fn lock_pair(
        &self,
        txn: &DatabaseTransaction,
        first: Uuid,
        second: Uuid,
    ) -> CommandResult<(Account, Account)> {
        if first <= second {
            let a = self.get_for_exclusive_mutation(txn, first).await?;
            let b = self.get_for_exclusive_mutation(txn, second).await?;
            Ok((a, b))
        } else {
            let b = self.get_for_exclusive_mutation(txn, second).await?;
            let a = self.get_for_exclusive_mutation(txn, first).await?;
            Ok((a, b))
        }
    }

    /// Persists the mutable state of a locked account.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn save(&self, txn: &DatabaseTransaction, account: &Account) -> Result<(), DbErr> {
        accounts::ActiveModel {
            id: Set(account.id),
            balance: Set(account.balance),
            is_active: Set(account.is_active),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(txn)
        .await?;
        Ok(())
    }
}
