use caixa_core::ledger::{
    Account, AuditAction, AuditEntityType, AuditEntry, LedgerError, NewAccount,
};
use sea_orm::DatabaseTransaction;
use tracing::info;
use uuid::Uuid;

use super::LedgerCommands;
use crate::error::CommandResult;

impl LedgerCommands {
    /// Opens an account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccount` for inconsistent details, or
    /// `AccountNotFound` when the card's paying account does not exist.
    pub async fn open_account(&self, input: NewAccount, user_id: Uuid) -> CommandResult<Account> {
        let account = Account::new(input)?;

        let uow = self.begin().await?;
        let result = self.insert_account(uow.txn(), &account).await;
        self.finish(uow, "open_account", result).await?;

        info!(account_id = %account.id, account_type = ?account.account_type, "account opened");
        self.audit([AuditEntry::created(
            AuditEntityType::Account,
            account.id,
            user_id,
        )])
        .await;
        Ok(account)
    }

    async fn insert_account(
        &self,
        txn: &DatabaseTransaction,
        account: &Account,
    ) -> CommandResult<()> {
        let paying_account = account
            .credit_card
            .as_ref()
            .and_then(|card| card.debit_account_id);
        if let Some(debit_account_id) = paying_account
            && self.accounts.find_by_id(debit_account_id).await?.is_none()
        {
            return Err(LedgerError::AccountNotFound(debit_account_id).into());
        }
        self.accounts.insert(txn, account).await?;
        Ok(())
    }

    /// Deactivates an account. Its history stays in place.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a lock timeout.
    pub async fn deactivate_account(
        &self,
        account_id: Uuid,
        user_id: Uuid,
    ) -> CommandResult<Account> {
        let uow = self.begin().await?;
        let result = self.deactivate_account_in(uow.txn(), account_id).await;
        let (account, previous) = self.finish(uow, "deactivate_account", result).await?;

        info!(%account_id, "account deactivated");
        self.audit([AuditEntry::changed(
            AuditEntityType::Account,
            account_id,
            AuditAction::Updated,
            user_id,
            &previous,
        )])
        .await;
        Ok(account)
    }

    async fn deactivate_account_in(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
    ) -> CommandResult<(Account, Account)> {
        let mut account = self.accounts.get_for_exclusive_mutation(txn, account_id).await?;
        let previous = account.clone();
        account.deactivate();
        self.accounts.save(txn, &account).await?;
        Ok((account, previous))
    }

    /// Reads an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a database error.
    pub async fn get_account(&self, account_id: Uuid) -> CommandResult<Account> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id).into())
    }
}
