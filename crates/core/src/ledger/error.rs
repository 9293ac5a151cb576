//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur during ledger operations,
//! including amount validation, account state, balance invariants,
//! transaction lifecycle, installment and recurrence errors.

use caixa_shared::ErrorCategory;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Lookup Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    /// Category not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    /// Recurrence template not found.
    #[error("Recurrence template not found: {0}")]
    RecurrenceTemplateNotFound(Uuid),

    /// No transactions belong to the installment group.
    #[error("Installment group not found: {0}")]
    InstallmentGroupNotFound(Uuid),

    /// No transactions belong to the transfer group.
    #[error("Transfer not found: {0}")]
    TransferNotFound(Uuid),

    /// The system category used for invoice payments does not exist.
    #[error("System category '{0}' is missing")]
    InvoiceCategoryMissing(String),

    // ========== Validation Errors ==========
    /// Amount cannot be zero.
    #[error("Amount cannot be zero")]
    ZeroAmount,

    /// Amount cannot be negative.
    #[error("Amount cannot be negative")]
    NegativeAmount,

    /// Amount carries more decimal places than money is stored with.
    #[error("Amount {0} has more than two decimal places")]
    InvalidAmountScale(Decimal),

    /// Account attributes are inconsistent.
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// Day of month outside 1..=31.
    #[error("Invalid day of month: {0}")]
    InvalidDayOfMonth(u32),

    /// Month outside 1..=12.
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),

    /// Date arithmetic left the supported calendar range.
    #[error("Date out of range")]
    DateOutOfRange,

    /// Transactions cannot be created already cancelled.
    #[error("Cannot create a cancelled transaction")]
    CannotCreateCancelled,

    /// Installment count outside the supported range.
    #[error(
        "Installment count must be between 2 and {max}, got {0}",
        max = super::installment::MAX_INSTALLMENTS
    )]
    InvalidInstallmentCount(u32),

    /// Splitting the total leaves an installment at or below zero.
    #[error("Amount {total} is too small to split into {count} installments")]
    InstallmentAmountTooSmall {
        /// Total purchase amount.
        total: Decimal,
        /// Requested number of installments.
        count: u32,
    },

    // ========== Account Errors ==========
    /// Account is inactive and cannot take new movements.
    #[error("Account {0} is inactive")]
    InactiveAccount(Uuid),

    /// Account is not a credit card.
    #[error("Account {0} is not a credit card")]
    AccountIsNotCreditCard(Uuid),

    /// Source and destination of a transfer are the same account.
    #[error("Cannot transfer from account {0} to itself")]
    SameAccountTransfer(Uuid),

    /// Transaction does not belong to the account it was submitted with.
    #[error("Transaction {transaction_id} does not belong to account {account_id}")]
    AccountMismatch {
        /// The transaction ID.
        transaction_id: Uuid,
        /// The account ID supplied by the caller.
        account_id: Uuid,
    },

    // ========== Balance Invariants ==========
    /// Debit would take a non-overdraft account below zero.
    #[error(
        "Insufficient balance in account {account_id}: balance {balance}, requested {requested}"
    )]
    InsufficientBalance {
        /// The account ID.
        account_id: Uuid,
        /// Balance before the movement.
        balance: Decimal,
        /// Amount the movement would take out.
        requested: Decimal,
    },

    /// Debit exceeds the available credit of a card.
    #[error(
        "Credit limit exceeded on {account_id}: available {available}, requested {requested}"
    )]
    CreditLimitExceeded {
        /// The credit-card account ID.
        account_id: Uuid,
        /// Credit still available before the movement.
        available: Decimal,
        /// Amount the movement would take out.
        requested: Decimal,
    },

    // ========== Transaction State Errors ==========
    /// Transaction is already cancelled.
    #[error("Transaction {0} is already cancelled")]
    AlreadyCancelled(Uuid),

    /// Transaction was already superseded by an adjustment.
    #[error("Transaction {0} has already been adjusted")]
    AlreadyAdjusted(Uuid),

    /// Only pending transactions can be settled.
    #[error("Transaction {0} is not pending")]
    NotPending(Uuid),

    /// Transfer legs change only through transfer cancellation.
    #[error("Transaction {0} is a transfer leg")]
    TransferLegImmutable(Uuid),
}

impl LedgerError {
    /// Returns the stable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::RecurrenceTemplateNotFound(_) => "RECURRENCE_TEMPLATE_NOT_FOUND",
            Self::InstallmentGroupNotFound(_) => "INSTALLMENT_GROUP_NOT_FOUND",
            Self::TransferNotFound(_) => "TRANSFER_NOT_FOUND",
            Self::InvoiceCategoryMissing(_) => "INVOICE_CATEGORY_MISSING",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::InvalidAmountScale(_) => "INVALID_AMOUNT_SCALE",
            Self::InvalidAccount(_) => "INVALID_ACCOUNT",
            Self::InvalidDayOfMonth(_) => "INVALID_DAY_OF_MONTH",
            Self::InvalidMonth(_) => "INVALID_MONTH",
            Self::DateOutOfRange => "DATE_OUT_OF_RANGE",
            Self::CannotCreateCancelled => "CANNOT_CREATE_CANCELLED",
            Self::InvalidInstallmentCount(_) => "INVALID_INSTALLMENT_COUNT",
            Self::InstallmentAmountTooSmall { .. } => "INSTALLMENT_AMOUNT_TOO_SMALL",
            Self::InactiveAccount(_) => "INACTIVE_ACCOUNT",
            Self::AccountIsNotCreditCard(_) => "ACCOUNT_IS_NOT_CREDIT_CARD",
            Self::SameAccountTransfer(_) => "SAME_ACCOUNT_TRANSFER",
            Self::AccountMismatch { .. } => "ACCOUNT_MISMATCH",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::CreditLimitExceeded { .. } => "CREDIT_LIMIT_EXCEEDED",
            Self::AlreadyCancelled(_) => "ALREADY_CANCELLED",
            Self::AlreadyAdjusted(_) => "ALREADY_ADJUSTED",
            Self::NotPending(_) => "NOT_PENDING",
            Self::TransferLegImmutable(_) => "TRANSFER_LEG_IMMUTABLE",
        }
    }

    /// Returns the category used by callers to decide how to react.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::AccountNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::CategoryNotFound(_)
            | Self::RecurrenceTemplateNotFound(_)
            | Self::InstallmentGroupNotFound(_)
            | Self::TransferNotFound(_)
            | Self::InvoiceCategoryMissing(_) => ErrorCategory::NotFound,
            _ => ErrorCategory::InvariantViolation,
        }
    }
}
