//! Ledger domain enumerations.
//!
//! Kinds of accounts, directions and lifecycle states of transactions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of account held by the household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Checking (current) account.
    Checking,
    /// Credit card; carries `CreditCardDetails`.
    CreditCard,
    /// Investment account.
    Investment,
    /// Cash wallet.
    Wallet,
}

impl AccountType {
    /// Returns true for credit-card accounts.
    #[must_use]
    pub const fn is_credit_card(self) -> bool {
        matches!(self, Self::CreditCard)
    }
}

/// Direction of a money movement.
///
/// A debit takes money out of the account, a credit puts money in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money leaves the account.
    Debit,
    /// Money enters the account.
    Credit,
}

impl TransactionType {
    /// Returns the signed balance effect of `amount` moving in this direction.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Debit => -amount,
            Self::Credit => amount,
        }
    }

    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

/// Lifecycle state of a transaction.
///
/// `Pending` may become `Paid` or `Cancelled`; `Paid` may become `Cancelled`.
/// `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Settled; affects the account balance.
    Paid,
    /// Scheduled or awaiting settlement; no balance effect.
    Pending,
    /// Cancelled; never affects the balance again.
    Cancelled,
}

impl TransactionStatus {
    /// Returns true if the transaction can no longer change state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
