use caixa_core::ledger::{
    Account, AuditAction, AuditEntityType, AuditEntry, CreditCardDomainService, InvoiceSummary,
    LedgerError, NewInvoicePayment, NewTransfer, OperationType, Transaction, TransactionType,
    TransferDomainService, TransferLegs,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseTransaction;
use tracing::info;
use uuid::Uuid;

use super::LedgerCommands;
use crate::error::CommandResult;

/// Payment of a credit-card invoice from another account.
#[derive(Debug, Clone)]
pub struct InvoicePayment {
    /// Account the money leaves.
    pub debit_account_id: Uuid,
    /// Credit card being paid.
    pub credit_card_id: Uuid,
    /// Amount paid.
    pub amount: Decimal,
    /// Payment date.
    pub competence_date: NaiveDate,
    /// Acting user.
    pub user_id: Uuid,
    /// Idempotency key.
    pub operation_id: Option<String>,
}

impl LedgerCommands {
    /// Moves money between two accounts.
    ///
    /// Both rows are locked in id order; either both legs commit or neither.
    ///
    /// # Errors
    ///
    /// Returns `SameAccountTransfer`, `InactiveAccount`, a balance rule
    /// violation on the source, or a lock timeout.
    pub async fn create_transfer(
        &self,
        source_id: Uuid,
        destination_id: Uuid,
        input: NewTransfer,
    ) -> CommandResult<TransferLegs> {
        let uow = self.begin().await?;
        let result = self
            .create_transfer_in(uow.txn(), source_id, destination_id, input)
            .await;
        let legs = self.finish(uow, "create_transfer", result).await?;

        info!(
            group_id = ?legs.group_id(),
            %source_id,
            %destination_id,
            amount = %legs.debit.amount,
            "transfer created"
        );
        self.audit_legs(&legs).await;
        Ok(legs)
    }

    async fn create_transfer_in(
        &self,
        txn: &DatabaseTransaction,
        source_id: Uuid,
        destination_id: Uuid,
        input: NewTransfer,
    ) -> CommandResult<TransferLegs> {
        let operation_id = input.operation_id.clone();
        self.ensure_new_operation(txn, operation_id.as_deref()).await?;
        self.ensure_category(txn, input.category_id).await?;

        let (mut source, mut destination) =
            self.accounts.lock_pair(txn, source_id, destination_id).await?;
        let legs = TransferDomainService::create_transfer(&mut source, &mut destination, input)?;

        self.persist_transfer(txn, &legs, &source, &destination).await?;
        self.record_operation(
            txn,
            operation_id.as_deref(),
            OperationType::CreateTransfer,
            legs.group_id(),
            &legs,
        )
        .await?;
        Ok(legs)
    }

    /// Pays a credit-card invoice with the system invoice-payment category.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceCategoryMissing`, `AccountIsNotCreditCard`,
    /// `InactiveAccount`, a balance rule violation on the paying account,
    /// or a lock timeout.
    pub async fn pay_invoice(&self, payment: InvoicePayment) -> CommandResult<TransferLegs> {
        let uow = self.begin().await?;
        let result = self.pay_invoice_in(uow.txn(), payment).await;
        let legs = self.finish(uow, "pay_invoice", result).await?;

        info!(
            group_id = ?legs.group_id(),
            card_id = %legs.credit.account_id,
            amount = %legs.credit.amount,
            "invoice paid"
        );
        self.audit_legs(&legs).await;
        Ok(legs)
    }

    async fn pay_invoice_in(
        &self,
        txn: &DatabaseTransaction,
        payment: InvoicePayment,
    ) -> CommandResult<TransferLegs> {
        self.ensure_new_operation(txn, payment.operation_id.as_deref()).await?;
        let category_name = &self.config.invoice_category_name;
        let invoice_category_id = self
            .categories
            .find_system_by_name(txn, category_name)
            .await?
            .ok_or_else(|| LedgerError::InvoiceCategoryMissing(category_name.clone()))?;

        let (mut debit_account, mut card) = self
            .accounts
            .lock_pair(txn, payment.debit_account_id, payment.credit_card_id)
            .await?;
        let legs = TransferDomainService::create_invoice_payment(
            &mut debit_account,
            &mut card,
            NewInvoicePayment {
                amount: payment.amount,
                competence_date: payment.competence_date,
                invoice_category_id,
                user_id: payment.user_id,
                operation_id: payment.operation_id.clone(),
            },
        )?;

        self.persist_transfer(txn, &legs, &debit_account, &card).await?;
        self.record_operation(
            txn,
            payment.operation_id.as_deref(),
            OperationType::PayInvoice,
            legs.group_id(),
            &legs,
        )
        .await?;
        Ok(legs)
    }

    async fn persist_transfer(
        &self,
        txn: &DatabaseTransaction,
        legs: &TransferLegs,
        source: &Account,
        destination: &Account,
    ) -> CommandResult<()> {
        self.transactions
            .insert_many(txn, &[legs.debit.clone(), legs.credit.clone()])
            .await?;
        self.accounts.save(txn, source).await?;
        self.accounts.save(txn, destination).await?;
        Ok(())
    }

    async fn audit_legs(&self, legs: &TransferLegs) {
        self.audit([
            AuditEntry::created(AuditEntityType::Transaction, legs.debit.id, legs.debit.created_by),
            AuditEntry::created(
                AuditEntityType::Transaction,
                legs.credit.id,
                legs.credit.created_by,
            ),
        ])
        .await;
    }

    /// Cancels both legs of a transfer and reverses both effects.
    ///
    /// # Errors
    ///
    /// Returns `TransferNotFound`, `AlreadyCancelled`, a balance rule
    /// violation on the destination, or a lock timeout.
    pub async fn cancel_transfer(
        &self,
        group_id: Uuid,
        reason: Option<String>,
        user_id: Uuid,
        operation_id: Option<String>,
    ) -> CommandResult<TransferLegs> {
        let uow = self.begin().await?;
        let result = self
            .cancel_transfer_in(
                uow.txn(),
                group_id,
                reason.as_deref(),
                user_id,
                operation_id.as_deref(),
            )
            .await;
        let (legs, previous) = self.finish(uow, "cancel_transfer", result).await?;

        info!(%group_id, "transfer cancelled");
        self.audit(previous.into_array().map(|leg| {
            AuditEntry::changed(
                AuditEntityType::Transaction,
                leg.id,
                AuditAction::Cancelled,
                user_id,
                &leg,
            )
        }))
        .await;
        Ok(legs)
    }

    async fn cancel_transfer_in(
        &self,
        txn: &DatabaseTransaction,
        group_id: Uuid,
        reason: Option<&str>,
        user_id: Uuid,
        operation_id: Option<&str>,
    ) -> CommandResult<(TransferLegs, TransferLegs)> {
        self.ensure_new_operation(txn, operation_id).await?;
        let unlocked = Self::pair_legs(
            group_id,
            self.transactions.find_by_transfer_group(group_id).await?,
        )?;

        let (mut source, mut destination) = self
            .accounts
            .lock_pair(txn, unlocked.debit.account_id, unlocked.credit.account_id)
            .await?;
        let mut legs = Self::pair_legs(
            group_id,
            self.transactions.lock_transfer_group(txn, group_id).await?,
        )?;
        let previous = legs.clone();

        TransferDomainService::cancel_transfer(
            &mut source,
            &mut destination,
            &mut legs,
            reason,
            user_id,
            Utc::now(),
        )?;

        self.transactions.save_state(txn, &legs.debit).await?;
        self.transactions.save_state(txn, &legs.credit).await?;
        self.accounts.save(txn, &source).await?;
        self.accounts.save(txn, &destination).await?;
        self.record_operation(
            txn,
            operation_id,
            OperationType::CancelTransfer,
            Some(group_id),
            &legs,
        )
        .await?;
        Ok((legs, previous))
    }

    /// Splits a transfer group into its debit and credit legs.
    fn pair_legs(group_id: Uuid, rows: Vec<Transaction>) -> CommandResult<TransferLegs> {
        let mut debit = None;
        let mut credit = None;
        for row in rows {
            match row.transaction_type {
                TransactionType::Debit if debit.is_none() => debit = Some(row),
                TransactionType::Credit if credit.is_none() => credit = Some(row),
                _ => return Err(LedgerError::TransferNotFound(group_id).into()),
            }
        }
        match (debit, credit) {
            (Some(debit), Some(credit)) => Ok(TransferLegs { debit, credit }),
            _ => Err(LedgerError::TransferNotFound(group_id).into()),
        }
    }

    /// Builds the invoice of a credit card closing in `month`/`year`.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `AccountIsNotCreditCard`, or a date error.
    pub async fn invoice_summary(
        &self,
        card_id: Uuid,
        month: u32,
        year: i32,
    ) -> CommandResult<InvoiceSummary> {
        let card = self.get_account(card_id).await?;
        let closing_day = card
            .credit_card
            .as_ref()
            .map(|details| details.closing_day)
            .ok_or(LedgerError::AccountIsNotCreditCard(card_id))?;
        let period = CreditCardDomainService::calculate_invoice_period(closing_day, month, year)?;
        let transactions = self
            .transactions
            .find_in_period(card_id, period.start, period.end)
            .await?;
        Ok(CreditCardDomainService::summarize_invoice(
            &card,
            &transactions,
            month,
            year,
        )?)
    }
}
