//! Transaction aggregate.
//!
//! Transactions form an append-only chain: an adjustment creates a new row
//! pointing at the original, a cancellation is a terminal status change.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::LedgerError;
use super::types::{TransactionStatus, TransactionType};

/// A single money movement on one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: Uuid,
    /// Account the movement belongs to.
    pub account_id: Uuid,
    /// Category ID.
    pub category_id: Uuid,
    /// Debit or credit.
    pub transaction_type: TransactionType,
    /// Always positive; direction comes from `transaction_type`.
    pub amount: Decimal,
    /// Free text description.
    pub description: String,
    /// Date the movement belongs to for reporting and invoices.
    pub competence_date: NaiveDate,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Lifecycle state.
    pub status: TransactionStatus,
    /// Shared by all installments of one purchase.
    pub installment_group_id: Option<Uuid>,
    /// 1-based position inside the installment group.
    pub installment_number: Option<u32>,
    /// Number of installments in the group.
    pub total_installments: Option<u32>,
    /// Shared by both legs of a transfer.
    pub transfer_group_id: Option<Uuid>,
    /// Template that generated this transaction.
    pub recurrence_template_id: Option<Uuid>,
    /// Transaction this one replaces.
    pub original_transaction_id: Option<Uuid>,
    /// Set once a replacement exists; the balance effect moved to it.
    pub has_adjustment: bool,
    /// Why the transaction was cancelled.
    pub cancellation_reason: Option<String>,
    /// Who cancelled the transaction.
    pub cancelled_by: Option<Uuid>,
    /// When the transaction was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Idempotency key of the command that created it.
    pub operation_id: Option<String>,
    /// Creating user.
    pub created_by: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for recording a single transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Category ID.
    pub category_id: Uuid,
    /// Debit or credit.
    pub transaction_type: TransactionType,
    /// Amount, must be positive.
    pub amount: Decimal,
    /// Description.
    pub description: String,
    /// Competence date.
    pub competence_date: NaiveDate,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Paid or pending.
    pub status: TransactionStatus,
    /// Acting user.
    pub user_id: Uuid,
    /// Idempotency key.
    pub operation_id: Option<String>,
}

impl Transaction {
    /// Builds a fresh transaction on `account_id` with no group linkage.
    pub(crate) fn draft(account_id: Uuid, input: NewTransaction) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            category_id: input.category_id,
            transaction_type: input.transaction_type,
            amount: input.amount,
            description: input.description,
            competence_date: input.competence_date,
            due_date: input.due_date,
            status: input.status,
            installment_group_id: None,
            installment_number: None,
            total_installments: None,
            transfer_group_id: None,
            recurrence_template_id: None,
            original_transaction_id: None,
            has_adjustment: false,
            cancellation_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            operation_id: input.operation_id,
            created_by: input.user_id,
            created_at: Utc::now(),
        }
    }

    /// Returns true if the transaction currently counts toward the balance.
    #[must_use]
    pub fn affects_balance(&self) -> bool {
        self.status == TransactionStatus::Paid && !self.has_adjustment
    }

    /// Returns the signed amount this transaction contributes to the balance.
    #[must_use]
    pub fn balance_effect(&self) -> Decimal {
        if self.affects_balance() {
            self.transaction_type.signed(self.amount)
        } else {
            Decimal::ZERO
        }
    }

    /// Returns true if the transaction is one leg of a transfer.
    #[must_use]
    pub const fn is_transfer_leg(&self) -> bool {
        self.transfer_group_id.is_some()
    }

    /// Fails unless the transaction belongs to `account_id`.
    pub(crate) fn ensure_belongs_to(&self, account_id: Uuid) -> Result<(), LedgerError> {
        if self.account_id == account_id {
            Ok(())
        } else {
            Err(LedgerError::AccountMismatch {
                transaction_id: self.id,
                account_id,
            })
        }
    }

    /// Fails if the transaction is cancelled or superseded.
    pub(crate) fn ensure_mutable(&self) -> Result<(), LedgerError> {
        if self.status.is_terminal() {
            return Err(LedgerError::AlreadyCancelled(self.id));
        }
        if self.has_adjustment {
            return Err(LedgerError::AlreadyAdjusted(self.id));
        }
        Ok(())
    }

    /// Moves the transaction to `Cancelled` and stamps the cancellation.
    pub(crate) fn mark_cancelled(
        &mut self,
        reason: Option<String>,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) {
        self.status = TransactionStatus::Cancelled;
        self.cancellation_reason = reason;
        self.cancelled_by = Some(user_id);
        self.cancelled_at = Some(now);
    }
}

/// Decimal places money is stored with.
pub const MONEY_SCALE: u32 = 2;

/// Fails with `InvalidAmountScale` if `amount` has sub-cent digits.
///
/// Trailing zeros do not count: `1.500` is accepted.
pub fn validate_scale(amount: Decimal) -> Result<(), LedgerError> {
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(LedgerError::InvalidAmountScale(amount));
    }
    Ok(())
}

/// Rejects zero, negative and sub-cent amounts.
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount.is_zero() {
        Err(LedgerError::ZeroAmount)
    } else if amount.is_sign_negative() {
        Err(LedgerError::NegativeAmount)
    } else {
        validate_scale(amount)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn new_transaction(
        transaction_type: TransactionType,
        amount: Decimal,
        status: TransactionStatus,
    ) -> NewTransaction {
        NewTransaction {
            category_id: Uuid::new_v4(),
            transaction_type,
            amount,
            description: "Mercado".into(),
            competence_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            due_date: None,
            status,
            user_id: Uuid::new_v4(),
            operation_id: None,
        }
    }
}
