use caixa_core::ledger::{
    Account, AuditAction, AuditEntityType, AuditEntry, LedgerError, NewTransaction,
    OperationType, Transaction, TransactionDomainService, TransactionStatus, TransactionType,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseTransaction;
use tracing::info;
use uuid::Uuid;

use super::LedgerCommands;
use crate::error::CommandResult;

/// A purchase read from a fiscal receipt, recorded as a paid debit.
#[derive(Debug, Clone)]
pub struct ReceiptImport {
    /// Account charged.
    pub account_id: Uuid,
    /// Category of the purchase.
    pub category_id: Uuid,
    /// Receipt total.
    pub amount: Decimal,
    /// Merchant or receipt description.
    pub description: String,
    /// Purchase date.
    pub purchase_date: NaiveDate,
    /// Acting user.
    pub user_id: Uuid,
    /// Idempotency key.
    pub operation_id: Option<String>,
}

/// Transaction state change applied under lock, with the state before it.
struct Changed {
    account: Account,
    transaction: Transaction,
    previous: Transaction,
}

impl LedgerCommands {
    /// Records a transaction, applying its effect when it is paid.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateOperation`, a lookup error, a validation error,
    /// `InsufficientBalance`/`CreditLimitExceeded`, or a lock timeout.
    pub async fn create_transaction(
        &self,
        account_id: Uuid,
        input: NewTransaction,
    ) -> CommandResult<Transaction> {
        self.record_new_transaction(
            "create_transaction",
            OperationType::CreateTransaction,
            account_id,
            input,
        )
        .await
    }

    /// Records an imported receipt as a paid debit.
    ///
    /// # Errors
    ///
    /// Same as [`LedgerCommands::create_transaction`].
    pub async fn import_receipt(&self, receipt: ReceiptImport) -> CommandResult<Transaction> {
        let input = NewTransaction {
            category_id: receipt.category_id,
            transaction_type: TransactionType::Debit,
            amount: receipt.amount,
            description: receipt.description,
            competence_date: receipt.purchase_date,
            due_date: None,
            status: TransactionStatus::Paid,
            user_id: receipt.user_id,
            operation_id: receipt.operation_id,
        };
        self.record_new_transaction(
            "import_receipt",
            OperationType::ImportReceipt,
            receipt.account_id,
            input,
        )
        .await
    }

    async fn record_new_transaction(
        &self,
        command: &'static str,
        operation_type: OperationType,
        account_id: Uuid,
        input: NewTransaction,
    ) -> CommandResult<Transaction> {
        let uow = self.begin().await?;
        let result = self
            .create_transaction_in(uow.txn(), operation_type, account_id, input)
            .await;
        let tx = self.finish(uow, command, result).await?;

        info!(
            transaction_id = %tx.id,
            %account_id,
            amount = %tx.amount,
            status = ?tx.status,
            "transaction created"
        );
        self.audit([AuditEntry::created(
            AuditEntityType::Transaction,
            tx.id,
            tx.created_by,
        )])
        .await;
        Ok(tx)
    }

    async fn create_transaction_in(
        &self,
        txn: &DatabaseTransaction,
        operation_type: OperationType,
        account_id: Uuid,
        input: NewTransaction,
    ) -> CommandResult<Transaction> {
        let operation_id = input.operation_id.clone();
        self.ensure_new_operation(txn, operation_id.as_deref()).await?;
        self.ensure_category(txn, input.category_id).await?;

        let mut account = self.accounts.get_for_exclusive_mutation(txn, account_id).await?;
        let tx = TransactionDomainService::create_transaction(&mut account, input)?;

        self.transactions.insert(txn, &tx).await?;
        if tx.affects_balance() {
            self.accounts.save(txn, &account).await?;
        }
        self.record_operation(txn, operation_id.as_deref(), operation_type, Some(tx.id), &tx)
            .await?;
        Ok(tx)
    }

    /// Locks a transaction and its account, account first.
    async fn lock_transaction(
        &self,
        txn: &DatabaseTransaction,
        transaction_id: Uuid,
    ) -> CommandResult<(Account, Transaction)> {
        let account_id = self
            .transactions
            .find_by_id(transaction_id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(transaction_id))?
            .account_id;
        let account = self.accounts.get_for_exclusive_mutation(txn, account_id).await?;
        let tx = self
            .transactions
            .get_for_exclusive_mutation(txn, transaction_id)
            .await?;
        Ok((account, tx))
    }

    /// Marks a pending transaction as paid and applies its effect.
    ///
    /// # Errors
    ///
    /// Returns `NotPending`, a balance rule violation, or a lock timeout.
    pub async fn settle_transaction(
        &self,
        transaction_id: Uuid,
        user_id: Uuid,
        operation_id: Option<String>,
    ) -> CommandResult<Transaction> {
        let uow = self.begin().await?;
        let result = self
            .settle_in(uow.txn(), transaction_id, operation_id.as_deref())
            .await;
        let changed = self.finish(uow, "settle_transaction", result).await?;

        info!(%transaction_id, balance = %changed.account.balance, "transaction settled");
        self.audit([AuditEntry::changed(
            AuditEntityType::Transaction,
            transaction_id,
            AuditAction::Settled,
            user_id,
            &changed.previous,
        )])
        .await;
        Ok(changed.transaction)
    }

    async fn settle_in(
        &self,
        txn: &DatabaseTransaction,
        transaction_id: Uuid,
        operation_id: Option<&str>,
    ) -> CommandResult<Changed> {
        self.ensure_new_operation(txn, operation_id).await?;
        let (mut account, mut tx) = self.lock_transaction(txn, transaction_id).await?;
        let previous = tx.clone();

        TransactionDomainService::settle(&mut account, &mut tx)?;

        self.transactions.save_state(txn, &tx).await?;
        self.accounts.save(txn, &account).await?;
        self.record_operation(
            txn,
            operation_id,
            OperationType::SettleTransaction,
            Some(tx.id),
            &tx,
        )
        .await?;
        Ok(Changed {
            account,
            transaction: tx,
            previous,
        })
    }

    /// Replaces a transaction's amount by appending an adjustment.
    ///
    /// Returns the replacement; the original stays in place, flagged as
    /// adjusted, and the account moves by the net difference.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCancelled`, `AlreadyAdjusted`, `TransferLegImmutable`,
    /// a balance rule violation on the net difference, or a lock timeout.
    pub async fn adjust_transaction(
        &self,
        transaction_id: Uuid,
        new_amount: Decimal,
        user_id: Uuid,
        operation_id: Option<String>,
    ) -> CommandResult<Transaction> {
        let uow = self.begin().await?;
        let result = self
            .adjust_in(uow.txn(), transaction_id, new_amount, user_id, operation_id)
            .await;
        let (replacement, changed) = self.finish(uow, "adjust_transaction", result).await?;

        info!(
            %transaction_id,
            replacement_id = %replacement.id,
            old_amount = %changed.previous.amount,
            new_amount = %replacement.amount,
            balance = %changed.account.balance,
            "transaction adjusted"
        );
        self.audit([
            AuditEntry::changed(
                AuditEntityType::Transaction,
                transaction_id,
                AuditAction::Adjusted,
                user_id,
                &changed.previous,
            ),
            AuditEntry::created(AuditEntityType::Transaction, replacement.id, user_id),
        ])
        .await;
        Ok(replacement)
    }

    async fn adjust_in(
        &self,
        txn: &DatabaseTransaction,
        transaction_id: Uuid,
        new_amount: Decimal,
        user_id: Uuid,
        operation_id: Option<String>,
    ) -> CommandResult<(Transaction, Changed)> {
        self.ensure_new_operation(txn, operation_id.as_deref()).await?;
        let (mut account, mut original) = self.lock_transaction(txn, transaction_id).await?;
        let previous = original.clone();

        let replacement = TransactionDomainService::adjust(
            &mut account,
            &mut original,
            new_amount,
            user_id,
            operation_id.clone(),
        )?;

        self.transactions.save_state(txn, &original).await?;
        self.transactions.insert(txn, &replacement).await?;
        self.accounts.save(txn, &account).await?;
        self.record_operation(
            txn,
            operation_id.as_deref(),
            OperationType::AdjustTransaction,
            Some(replacement.id),
            &replacement,
        )
        .await?;
        Ok((
            replacement,
            Changed {
                account,
                transaction: original,
                previous,
            },
        ))
    }

    /// Cancels a transaction, reversing its effect if it was applied.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCancelled`, `AlreadyAdjusted`, `TransferLegImmutable`,
    /// a balance rule violation on the reversal, or a lock timeout.
    pub async fn cancel_transaction(
        &self,
        transaction_id: Uuid,
        reason: Option<String>,
        user_id: Uuid,
        operation_id: Option<String>,
    ) -> CommandResult<Transaction> {
        let uow = self.begin().await?;
        let result = self
            .cancel_in(uow.txn(), transaction_id, reason, user_id, operation_id.as_deref())
            .await;
        let changed = self.finish(uow, "cancel_transaction", result).await?;

        info!(%transaction_id, balance = %changed.account.balance, "transaction cancelled");
        self.audit([AuditEntry::changed(
            AuditEntityType::Transaction,
            transaction_id,
            AuditAction::Cancelled,
            user_id,
            &changed.previous,
        )])
        .await;
        Ok(changed.transaction)
    }

    async fn cancel_in(
        &self,
        txn: &DatabaseTransaction,
        transaction_id: Uuid,
        reason: Option<String>,
        user_id: Uuid,
        operation_id: Option<&str>,
    ) -> CommandResult<Changed> {
        self.ensure_new_operation(txn, operation_id).await?;
        let (mut account, mut tx) = self.lock_transaction(txn, transaction_id).await?;
        let previous = tx.clone();

        TransactionDomainService::cancel(&mut account, &mut tx, reason, user_id, Utc::now())?;

        self.transactions.save_state(txn, &tx).await?;
        if previous.affects_balance() {
            self.accounts.save(txn, &account).await?;
        }
        self.record_operation(
            txn,
            operation_id,
            OperationType::CancelTransaction,
            Some(tx.id),
            &tx,
        )
        .await?;
        Ok(Changed {
            account,
            transaction: tx,
            previous,
        })
    }

    /// Reads a transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` or a database error.
    pub async fn get_transaction(&self, transaction_id: Uuid) -> CommandResult<Transaction> {
        self.transactions
            .find_by_id(transaction_id)
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id).into())
    }
}
