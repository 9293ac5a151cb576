//! Account aggregate and its balance invariants.
//!
//! The balance of an account is only ever changed through
//! [`Account::apply_delta`], which checks the overdraft policy (or the credit
//! limit for cards) before touching anything.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::credit_card::CreditCardDomainService;
use super::error::LedgerError;
use super::transaction::validate_scale;
use super::types::AccountType;

/// Credit-card specific attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCardDetails {
    /// Maximum outstanding debt.
    pub credit_limit: Decimal,
    /// Day of month the invoice closes (1..=31, clamped to month length).
    pub closing_day: u32,
    /// Day of month the invoice is due (1..=31, clamped to month length).
    pub due_day: u32,
    /// Account that usually pays the invoice.
    pub debit_account_id: Option<Uuid>,
    /// Whether debits beyond the available credit are rejected.
    pub enforce_credit_limit: bool,
}

/// Input for opening a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Display name.
    pub name: String,
    /// Account kind.
    pub account_type: AccountType,
    /// Starting balance.
    pub opening_balance: Decimal,
    /// Whether the balance may go below zero.
    pub allow_negative_balance: bool,
    /// Required for credit cards, forbidden otherwise.
    pub credit_card: Option<CreditCardDetails>,
}

/// A household account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Account kind.
    pub account_type: AccountType,
    /// Signed balance. Negative on a credit card means outstanding debt.
    pub balance: Decimal,
    /// Whether the balance may go below zero.
    pub allow_negative_balance: bool,
    /// Inactive accounts accept no new movements.
    pub is_active: bool,
    /// Present iff `account_type` is `CreditCard`.
    pub credit_card: Option<CreditCardDetails>,
}

impl Account {
    /// Opens a new account after validating its attributes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccount` when the name is blank, credit-card details
    /// are missing or unexpected, or the opening balance already breaks the
    /// overdraft policy. Returns `InvalidDayOfMonth` for closing or due days
    /// outside 1..=31, and `InvalidAmountScale` when the opening balance or
    /// credit limit has sub-cent digits.
    pub fn new(input: NewAccount) -> Result<Self, LedgerError> {
        if input.name.trim().is_empty() {
            return Err(LedgerError::InvalidAccount("name is required".into()));
        }
        validate_scale(input.opening_balance)?;

        match (&input.credit_card, input.account_type.is_credit_card()) {
            (Some(details), true) => Self::validate_card_details(details)?,
            (None, true) => {
                return Err(LedgerError::InvalidAccount(
                    "credit card accounts require card details".into(),
                ));
            }
            (Some(_), false) => {
                return Err(LedgerError::InvalidAccount(
                    "card details are only allowed on credit card accounts".into(),
                ));
            }
            (None, false) => {}
        }

        let account = Self {
            id: Uuid::new_v4(),
            name: input.name,
            account_type: input.account_type,
            balance: Decimal::ZERO,
            allow_negative_balance: input.allow_negative_balance,
            is_active: true,
            credit_card: input.credit_card,
        };

        if account.ensure_can_apply(input.opening_balance).is_err() {
            return Err(LedgerError::InvalidAccount(
                "opening balance violates the overdraft policy".into(),
            ));
        }

        Ok(Self {
            balance: input.opening_balance,
            ..account
        })
    }

    fn validate_card_details(details: &CreditCardDetails) -> Result<(), LedgerError> {
        if details.credit_limit < Decimal::ZERO {
            return Err(LedgerError::InvalidAccount(
                "credit limit cannot be negative".into(),
            ));
        }
        validate_scale(details.credit_limit)?;
        for day in [details.closing_day, details.due_day] {
            if !(1..=31).contains(&day) {
                return Err(LedgerError::InvalidDayOfMonth(day));
            }
        }
        Ok(())
    }

    /// Returns true for credit-card accounts.
    #[must_use]
    pub const fn is_credit_card(&self) -> bool {
        self.credit_card.is_some()
    }

    /// Fails with `InactiveAccount` if the account was deactivated.
    pub fn ensure_active(&self) -> Result<(), LedgerError> {
        if self.is_active {
            Ok(())
        } else {
            Err(LedgerError::InactiveAccount(self.id))
        }
    }

    /// Checks that adding `delta` to the balance keeps every invariant.
    ///
    /// Positive deltas always pass. Credit cards are checked against their
    /// limit when `enforce_credit_limit` is set and may otherwise go
    /// negative freely; other accounts need `allow_negative_balance` to end
    /// below zero.
    ///
    /// # Errors
    ///
    /// Returns `CreditLimitExceeded` or `InsufficientBalance`.
    pub fn ensure_can_apply(&self, delta: Decimal) -> Result<(), LedgerError> {
        if delta >= Decimal::ZERO {
            return Ok(());
        }
        let requested = -delta;

        if self.is_credit_card() {
            return CreditCardDomainService::ensure_within_limit(self, requested);
        }

        if !self.allow_negative_balance && self.balance + delta < Decimal::ZERO {
            return Err(LedgerError::InsufficientBalance {
                account_id: self.id,
                balance: self.balance,
                requested,
            });
        }
        Ok(())
    }

    /// Applies `delta` to the balance after checking invariants.
    ///
    /// On error the balance is left untouched.
    pub fn apply_delta(&mut self, delta: Decimal) -> Result<Decimal, LedgerError> {
        self.ensure_can_apply(delta)?;
        self.balance += delta;
        Ok(self.balance)
    }

    /// Marks the account inactive. Accounts are never deleted.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}
