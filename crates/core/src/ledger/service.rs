//! Transaction domain service.
//!
//! Stateless operations over an already-locked [`Account`] and its
//! transactions. Every operation validates first and mutates last, so an
//! `Err` never leaves the account or the transaction half-changed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::account::Account;
use super::error::LedgerError;
use super::transaction::{NewTransaction, Transaction, validate_amount};
use super::types::TransactionStatus;

/// Creates, settles, adjusts and cancels single transactions.
pub struct TransactionDomainService;

impl TransactionDomainService {
    /// Records a new transaction on `account`.
    ///
    /// A paid transaction moves the balance immediately; a pending one
    /// does not.
    ///
    /// # Errors
    ///
    /// Returns `ZeroAmount`/`NegativeAmount`, `CannotCreateCancelled`,
    /// `InactiveAccount`, or a balance invariant error.
    pub fn create_transaction(
        account: &mut Account,
        input: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        validate_amount(input.amount)?;
        if input.status == TransactionStatus::Cancelled {
            return Err(LedgerError::CannotCreateCancelled);
        }
        account.ensure_active()?;

        let transaction = Transaction::draft(account.id, input);
        account.apply_delta(transaction.balance_effect())?;
        Ok(transaction)
    }

    /// Settles a pending transaction, applying its balance effect.
    ///
    /// # Errors
    ///
    /// Returns `NotPending`, `AlreadyCancelled`, `AlreadyAdjusted`,
    /// `InactiveAccount`, or a balance invariant error.
    pub fn settle(account: &mut Account, transaction: &mut Transaction) -> Result<(), LedgerError> {
        transaction.ensure_belongs_to(account.id)?;
        transaction.ensure_mutable()?;
        if transaction.status != TransactionStatus::Pending {
            return Err(LedgerError::NotPending(transaction.id));
        }
        account.ensure_active()?;

        let effect = transaction.transaction_type.signed(transaction.amount);
        account.apply_delta(effect)?;
        transaction.status = TransactionStatus::Paid;
        Ok(())
    }

    /// Replaces `original` with a copy carrying `new_amount`.
    ///
    /// The net delta (new effect minus old effect) is checked against the
    /// account invariants once and then applied. On success `original` is
    /// flagged `has_adjustment` and the returned replacement points back to
    /// it.
    ///
    /// # Errors
    ///
    /// Returns an amount error, `InactiveAccount`, `AlreadyCancelled`,
    /// `AlreadyAdjusted`, `TransferLegImmutable`, `AccountMismatch`, or a
    /// balance invariant error.
    pub fn adjust(
        account: &mut Account,
        original: &mut Transaction,
        new_amount: Decimal,
        user_id: Uuid,
        operation_id: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        validate_amount(new_amount)?;
        original.ensure_belongs_to(account.id)?;
        original.ensure_mutable()?;
        if original.is_transfer_leg() {
            return Err(LedgerError::TransferLegImmutable(original.id));
        }
        account.ensure_active()?;

        let replacement = Transaction {
            id: Uuid::new_v4(),
            amount: new_amount,
            original_transaction_id: Some(original.id),
            has_adjustment: false,
            cancellation_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            operation_id,
            created_by: user_id,
            created_at: Utc::now(),
            ..original.clone()
        };

        let net_delta = replacement.balance_effect() - original.balance_effect();
        account.apply_delta(net_delta)?;
        original.has_adjustment = true;
        Ok(replacement)
    }

    /// Cancels `transaction`, reversing its balance effect if it had one.
    ///
    /// Pending transactions on a deactivated account may still be cancelled;
    /// paid ones may not, since that would move the balance.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCancelled`, `AlreadyAdjusted`, `TransferLegImmutable`,
    /// `AccountMismatch`, `InactiveAccount`, or a balance invariant error when
    /// reversing a credit would break the overdraft policy.
    pub fn cancel(
        account: &mut Account,
        transaction: &mut Transaction,
        reason: Option<String>,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if transaction.is_transfer_leg() {
            return Err(LedgerError::TransferLegImmutable(transaction.id));
        }
        Self::reverse_and_cancel(account, transaction, reason, user_id, now)
    }

    /// Cancellation without the transfer-leg guard, for group operations.
    pub(crate) fn reverse_and_cancel(
        account: &mut Account,
        transaction: &mut Transaction,
        reason: Option<String>,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        transaction.ensure_belongs_to(account.id)?;
        transaction.ensure_mutable()?;

        let reversal = -transaction.balance_effect();
        if !reversal.is_zero() {
            account.ensure_active()?;
        }
        account.apply_delta(reversal)?;
        transaction.mark_cancelled(reason, user_id, now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::account::fixtures::{checking, credit_card, overdraft};
    use crate::ledger::transaction::fixtures::new_transaction;
    use crate::ledger::types::TransactionType;
    use rust_decimal_macros::dec;

    fn paid_debit(amount: Decimal) -> NewTransaction {
        new_transaction(TransactionType::Debit, amount, TransactionStatus::Paid)
    }

    // ========== create_transaction ==========

    #[test]
    fn test_paid_debit_decreases_balance() {
        let mut account = checking(dec!(100));
        let tx = TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(30)))
            .unwrap();
        assert_eq!(account.balance, dec!(70));
        assert_eq!(tx.account_id, account.id);
        assert_eq!(tx.status, TransactionStatus::Paid);
    }

    #[test]
    fn test_paid_credit_increases_balance() {
        let mut account = checking(dec!(100));
        let input = new_transaction(TransactionType::Credit, dec!(25.50), TransactionStatus::Paid);
        TransactionDomainService::create_transaction(&mut account, input).unwrap();
        assert_eq!(account.balance, dec!(125.50));
    }

    #[test]
    fn test_pending_has_no_effect() {
        let mut account = checking(dec!(0));
        let input = new_transaction(TransactionType::Debit, dec!(500), TransactionStatus::Pending);
        TransactionDomainService::create_transaction(&mut account, input).unwrap();
        assert_eq!(account.balance, dec!(0));
    }

    #[test]
    fn test_insufficient_balance_leaves_account_untouched() {
        let mut account = checking(dec!(50));
        let err = TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(80)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(account.balance, dec!(50));
    }

    #[test]
    fn test_overdraft_allowed() {
        let mut account = overdraft(dec!(50));
        TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(80))).unwrap();
        assert_eq!(account.balance, dec!(-30));
    }

    #[test]
    fn test_rejects_zero_amount_and_cancelled_status() {
        let mut account = checking(dec!(50));
        assert_eq!(
            TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(0))),
            Err(LedgerError::ZeroAmount)
        );
        let input = new_transaction(TransactionType::Debit, dec!(1), TransactionStatus::Cancelled);
        assert_eq!(
            TransactionDomainService::create_transaction(&mut account, input),
            Err(LedgerError::CannotCreateCancelled)
        );
    }

    #[test]
    fn test_inactive_account_rejected() {
        let mut account = checking(dec!(50));
        account.deactivate();
        assert_eq!(
            TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(1))),
            Err(LedgerError::InactiveAccount(account.id))
        );
    }

    // ========== credit limit ==========

    #[test]
    fn test_credit_limit_boundary() {
        // limit 5000, debt 4700: exactly 300 available
        let mut card = credit_card(dec!(5000), dec!(-4700));
        TransactionDomainService::create_transaction(&mut card, paid_debit(dec!(300))).unwrap();
        assert_eq!(card.balance, dec!(-5000));
    }

    #[test]
    fn test_credit_limit_exceeded_by_one_cent_more() {
        let mut card = credit_card(dec!(5000), dec!(-4700));
        let err = TransactionDomainService::create_transaction(&mut card, paid_debit(dec!(300.01)))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::CreditLimitExceeded {
                account_id: card.id,
                available: dec!(300),
                requested: dec!(300.01),
            }
        );
        assert_eq!(card.balance, dec!(-4700));
    }

    #[test]
    fn test_credit_limit_rejects_301() {
        let mut card = credit_card(dec!(5000), dec!(-4700));
        assert!(
            TransactionDomainService::create_transaction(&mut card, paid_debit(dec!(301))).is_err()
        );
        assert_eq!(card.balance, dec!(-4700));
    }

    // ========== settle ==========

    #[test]
    fn test_settle_applies_effect() {
        let mut account = checking(dec!(100));
        let input = new_transaction(TransactionType::Debit, dec!(40), TransactionStatus::Pending);
        let mut tx = TransactionDomainService::create_transaction(&mut account, input).unwrap();

        TransactionDomainService::settle(&mut account, &mut tx).unwrap();
        assert_eq!(tx.status, TransactionStatus::Paid);
        assert_eq!(account.balance, dec!(60));

        assert_eq!(
            TransactionDomainService::settle(&mut account, &mut tx),
            Err(LedgerError::NotPending(tx.id))
        );
    }

    #[test]
    fn test_settle_checks_balance() {
        let mut account = checking(dec!(10));
        let input = new_transaction(TransactionType::Debit, dec!(40), TransactionStatus::Pending);
        let mut tx = TransactionDomainService::create_transaction(&mut account, input).unwrap();
        assert!(TransactionDomainService::settle(&mut account, &mut tx).is_err());
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(account.balance, dec!(10));
    }

    // ========== adjust ==========

    #[test]
    fn test_adjust_paid_debit_down() {
        let mut account = checking(dec!(500));
        let mut original =
            TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(100)))
                .unwrap();
        assert_eq!(account.balance, dec!(400));

        let user = Uuid::new_v4();
        let replacement =
            TransactionDomainService::adjust(&mut account, &mut original, dec!(70), user, None)
                .unwrap();

        assert_eq!(account.balance, dec!(430));
        assert!(original.has_adjustment);
        assert_eq!(replacement.original_transaction_id, Some(original.id));
        assert_eq!(replacement.amount, dec!(70));
        assert_eq!(replacement.category_id, original.category_id);
        assert_eq!(replacement.description, original.description);
        assert_eq!(replacement.status, TransactionStatus::Paid);
        assert_eq!(replacement.created_by, user);
        assert!(!replacement.has_adjustment);
    }

    #[test]
    fn test_adjust_chain_uses_latest() {
        let mut account = checking(dec!(500));
        let mut first =
            TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(100)))
                .unwrap();
        let user = Uuid::new_v4();
        let mut second =
            TransactionDomainService::adjust(&mut account, &mut first, dec!(70), user, None)
                .unwrap();

        assert_eq!(
            TransactionDomainService::adjust(&mut account, &mut first, dec!(60), user, None),
            Err(LedgerError::AlreadyAdjusted(first.id))
        );

        TransactionDomainService::adjust(&mut account, &mut second, dec!(120), user, None)
            .unwrap();
        assert_eq!(account.balance, dec!(380));
    }

    #[test]
    fn test_adjust_rejects_net_overdraft() {
        let mut account = checking(dec!(100));
        let mut original =
            TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(100)))
                .unwrap();
        let err = TransactionDomainService::adjust(
            &mut account,
            &mut original,
            dec!(150),
            Uuid::new_v4(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(account.balance, dec!(0));
        assert!(!original.has_adjustment);
    }

    #[test]
    fn test_adjust_pending_has_no_balance_effect() {
        let mut account = checking(dec!(10));
        let input = new_transaction(TransactionType::Debit, dec!(5), TransactionStatus::Pending);
        let mut original =
            TransactionDomainService::create_transaction(&mut account, input).unwrap();
        let replacement = TransactionDomainService::adjust(
            &mut account,
            &mut original,
            dec!(500),
            Uuid::new_v4(),
            None,
        )
        .unwrap();
        assert_eq!(account.balance, dec!(10));
        assert_eq!(replacement.status, TransactionStatus::Pending);
    }

    #[test]
    fn test_adjust_rejects_transfer_leg() {
        let mut account = checking(dec!(100));
        let mut tx =
            TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(10)))
                .unwrap();
        tx.transfer_group_id = Some(Uuid::new_v4());
        assert_eq!(
            TransactionDomainService::adjust(&mut account, &mut tx, dec!(5), Uuid::new_v4(), None),
            Err(LedgerError::TransferLegImmutable(tx.id))
        );
    }

    #[test]
    fn test_adjust_rejects_foreign_account() {
        let mut account = checking(dec!(100));
        let mut other = checking(dec!(100));
        let mut tx =
            TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(10)))
                .unwrap();
        assert!(matches!(
            TransactionDomainService::adjust(&mut other, &mut tx, dec!(5), Uuid::new_v4(), None),
            Err(LedgerError::AccountMismatch { .. })
        ));
    }

    #[test]
    fn test_adjust_on_inactive_account_rejected() {
        let mut account = checking(dec!(100));
        let mut tx =
            TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(30)))
                .unwrap();
        account.deactivate();

        assert_eq!(
            TransactionDomainService::adjust(&mut account, &mut tx, dec!(10), Uuid::new_v4(), None),
            Err(LedgerError::InactiveAccount(account.id))
        );
        assert_eq!(account.balance, dec!(70));
        assert!(!tx.has_adjustment);
    }

    // ========== cancel ==========

    #[test]
    fn test_cancel_paid_reverses_effect() {
        let mut account = checking(dec!(100));
        let mut tx =
            TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(30)))
                .unwrap();
        let user = Uuid::new_v4();
        let now = Utc::now();

        TransactionDomainService::cancel(&mut account, &mut tx, Some("duplicada".into()), user, now)
            .unwrap();

        assert_eq!(account.balance, dec!(100));
        assert_eq!(tx.status, TransactionStatus::Cancelled);
        assert_eq!(tx.cancellation_reason.as_deref(), Some("duplicada"));
        assert_eq!(tx.cancelled_by, Some(user));
        assert_eq!(tx.cancelled_at, Some(now));
    }

    #[test]
    fn test_cancel_is_terminal() {
        let mut account = checking(dec!(100));
        let mut tx =
            TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(30)))
                .unwrap();
        let user = Uuid::new_v4();
        TransactionDomainService::cancel(&mut account, &mut tx, None, user, Utc::now()).unwrap();
        assert_eq!(
            TransactionDomainService::cancel(&mut account, &mut tx, None, user, Utc::now()),
            Err(LedgerError::AlreadyCancelled(tx.id))
        );
        assert_eq!(account.balance, dec!(100));
    }

    #[test]
    fn test_cancel_pending_has_no_effect() {
        let mut account = checking(dec!(100));
        let input = new_transaction(TransactionType::Debit, dec!(30), TransactionStatus::Pending);
        let mut tx = TransactionDomainService::create_transaction(&mut account, input).unwrap();
        TransactionDomainService::cancel(&mut account, &mut tx, None, Uuid::new_v4(), Utc::now())
            .unwrap();
        assert_eq!(account.balance, dec!(100));
    }

    #[test]
    fn test_cancel_on_inactive_account_only_without_balance_effect() {
        let mut account = checking(dec!(100));
        let mut paid =
            TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(30)))
                .unwrap();
        let input = new_transaction(TransactionType::Debit, dec!(20), TransactionStatus::Pending);
        let mut pending =
            TransactionDomainService::create_transaction(&mut account, input).unwrap();
        account.deactivate();
        let user = Uuid::new_v4();

        assert_eq!(
            TransactionDomainService::cancel(&mut account, &mut paid, None, user, Utc::now()),
            Err(LedgerError::InactiveAccount(account.id))
        );
        assert_eq!(paid.status, TransactionStatus::Paid);
        assert_eq!(account.balance, dec!(70));

        TransactionDomainService::cancel(&mut account, &mut pending, None, user, Utc::now())
            .unwrap();
        assert_eq!(pending.status, TransactionStatus::Cancelled);
        assert_eq!(account.balance, dec!(70));
    }

    #[test]
    fn test_cancel_credit_checks_overdraft() {
        let mut account = checking(dec!(0));
        let input = new_transaction(TransactionType::Credit, dec!(50), TransactionStatus::Paid);
        let mut tx = TransactionDomainService::create_transaction(&mut account, input).unwrap();
        TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(40))).unwrap();

        let user = Uuid::new_v4();
        let err = TransactionDomainService::cancel(&mut account, &mut tx, None, user, Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(tx.status, TransactionStatus::Paid);
        assert_eq!(account.balance, dec!(10));
    }

    #[test]
    fn test_cancel_adjusted_original_rejected() {
        let mut account = checking(dec!(100));
        let mut original =
            TransactionDomainService::create_transaction(&mut account, paid_debit(dec!(30)))
                .unwrap();
        let user = Uuid::new_v4();
        let mut replacement =
            TransactionDomainService::adjust(&mut account, &mut original, dec!(20), user, None)
                .unwrap();

        assert_eq!(
            TransactionDomainService::cancel(&mut account, &mut original, None, user, Utc::now()),
            Err(LedgerError::AlreadyAdjusted(original.id))
        );
        TransactionDomainService::cancel(&mut account, &mut replacement, None, user, Utc::now())
            .unwrap();
        assert_eq!(account.balance, dec!(100));
    }
}
