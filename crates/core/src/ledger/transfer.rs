//! Transfers between two accounts and credit-card invoice payments.
//!
//! A transfer is a paid debit on the source and a paid credit on the
//! destination linked by a shared `transfer_group_id`. Both legs are created
//! and cancelled together.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::Account;
use super::error::LedgerError;
use super::service::TransactionDomainService;
use super::transaction::{NewTransaction, Transaction, validate_amount};
use super::types::{TransactionStatus, TransactionType};

/// Input for a transfer between two accounts.
#[derive(Debug, Clone)]
pub struct NewTransfer {
    /// Category of both legs.
    pub category_id: Uuid,
    /// Amount moved.
    pub amount: Decimal,
    /// Description of both legs.
    pub description: String,
    /// Competence date of both legs.
    pub competence_date: NaiveDate,
    /// Acting user.
    pub user_id: Uuid,
    /// Idempotency key.
    pub operation_id: Option<String>,
}

/// Input for paying a credit-card invoice.
#[derive(Debug, Clone)]
pub struct NewInvoicePayment {
    /// Amount paid.
    pub amount: Decimal,
    /// Payment date.
    pub competence_date: NaiveDate,
    /// The system invoice-payment category.
    pub invoice_category_id: Uuid,
    /// Acting user.
    pub user_id: Uuid,
    /// Idempotency key.
    pub operation_id: Option<String>,
}

/// The two legs of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLegs {
    /// Paid debit on the source account.
    pub debit: Transaction,
    /// Paid credit on the destination account.
    pub credit: Transaction,
}

impl TransferLegs {
    /// Shared transfer group ID.
    #[must_use]
    pub fn group_id(&self) -> Option<Uuid> {
        self.debit.transfer_group_id
    }

    /// Returns both legs, debit first.
    #[must_use]
    pub fn into_array(self) -> [Transaction; 2] {
        [self.debit, self.credit]
    }
}

/// Moves money between accounts.
pub struct TransferDomainService;

impl TransferDomainService {
    /// Creates a transfer from `source` to `destination`.
    ///
    /// The source debit is checked before either balance changes.
    ///
    /// # Errors
    ///
    /// Returns an amount error, `SameAccountTransfer`, `InactiveAccount` or
    /// a balance invariant error on the source.
    pub fn create_transfer(
        source: &mut Account,
        destination: &mut Account,
        input: NewTransfer,
    ) -> Result<TransferLegs, LedgerError> {
        validate_amount(input.amount)?;
        if source.id == destination.id {
            return Err(LedgerError::SameAccountTransfer(source.id));
        }
        source.ensure_active()?;
        destination.ensure_active()?;
        source.ensure_can_apply(-input.amount)?;

        let group_id = Uuid::new_v4();
        let leg = |transaction_type| NewTransaction {
            category_id: input.category_id,
            transaction_type,
            amount: input.amount,
            description: input.description.clone(),
            competence_date: input.competence_date,
            due_date: None,
            status: TransactionStatus::Paid,
            user_id: input.user_id,
            operation_id: input.operation_id.clone(),
        };

        let mut debit =
            TransactionDomainService::create_transaction(source, leg(TransactionType::Debit))?;
        let mut credit = TransactionDomainService::create_transaction(
            destination,
            leg(TransactionType::Credit),
        )?;
        debit.transfer_group_id = Some(group_id);
        credit.transfer_group_id = Some(group_id);

        Ok(TransferLegs { debit, credit })
    }

    /// Pays the invoice of `credit_card` from `debit_account`.
    ///
    /// The credit leg lands on the card and reduces its debt.
    ///
    /// # Errors
    ///
    /// Returns `AccountIsNotCreditCard`, `InactiveAccount`, or any transfer
    /// error.
    pub fn create_invoice_payment(
        debit_account: &mut Account,
        credit_card: &mut Account,
        input: NewInvoicePayment,
    ) -> Result<TransferLegs, LedgerError> {
        if !credit_card.is_credit_card() {
            return Err(LedgerError::AccountIsNotCreditCard(credit_card.id));
        }
        debit_account.ensure_active()?;

        let description = format!("Pagamento de fatura - {}", credit_card.name);
        Self::create_transfer(
            debit_account,
            credit_card,
            NewTransfer {
                category_id: input.invoice_category_id,
                amount: input.amount,
                description,
                competence_date: input.competence_date,
                user_id: input.user_id,
                operation_id: input.operation_id,
            },
        )
    }

    /// Cancels both legs of a transfer and reverses both effects.
    ///
    /// The destination reversal is checked first, since taking the money
    /// back out is the only half that can fail.
    ///
    /// # Errors
    ///
    /// Returns `TransferNotFound` when the legs do not form one transfer,
    /// `AccountMismatch`, `AlreadyCancelled`, or a balance invariant error
    /// on the destination.
    pub fn cancel_transfer(
        source: &mut Account,
        destination: &mut Account,
        legs: &mut TransferLegs,
        reason: Option<&str>,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let group_id = legs
            .group_id()
            .ok_or(LedgerError::TransferNotFound(legs.debit.id))?;
        if legs.credit.transfer_group_id != Some(group_id)
            || legs.debit.transaction_type != TransactionType::Debit
            || legs.credit.transaction_type != TransactionType::Credit
        {
            return Err(LedgerError::TransferNotFound(group_id));
        }
        legs.debit.ensure_belongs_to(source.id)?;
        legs.credit.ensure_belongs_to(destination.id)?;
        legs.debit.ensure_mutable()?;
        legs.credit.ensure_mutable()?;
        destination.ensure_can_apply(-legs.credit.balance_effect())?;

        TransactionDomainService::reverse_and_cancel(
            destination,
            &mut legs.credit,
            reason.map(str::to_owned),
            user_id,
            now,
        )?;
        TransactionDomainService::reverse_and_cancel(
            source,
            &mut legs.debit,
            reason.map(str::to_owned),
            user_id,
            now,
        )?;
        Ok(())
    }
}
