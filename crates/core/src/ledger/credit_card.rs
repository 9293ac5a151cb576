//! Credit-card invoice periods, totals and limit enforcement.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::Account;
use super::dates::{clamped_date, next_month, previous_month};
use super::error::LedgerError;
use super::transaction::Transaction;
use super::types::TransactionStatus;

/// Date range billed on one invoice, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicePeriod {
    /// First day of the period.
    pub start: NaiveDate,
    /// Closing day of the period.
    pub end: NaiveDate,
}

impl InvoicePeriod {
    /// Returns true if `date` falls inside the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Invoice of one card for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    /// Credit-card account ID.
    pub account_id: Uuid,
    /// Billed period.
    pub period: InvoicePeriod,
    /// Due date of the invoice.
    pub due_date: NaiveDate,
    /// Debits minus credits inside the period.
    pub total: Decimal,
    /// Number of transactions counted in the total.
    pub transaction_count: usize,
}

/// Invoice arithmetic for credit-card accounts.
pub struct CreditCardDomainService;

impl CreditCardDomainService {
    /// Returns the invoice period that closes in `month`/`year`.
    ///
    /// The period ends on `closing_day` of that month and starts the day
    /// after the previous month's closing day, each clamped to its month's
    /// length.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDayOfMonth` or `InvalidMonth`.
    pub fn calculate_invoice_period(
        closing_day: u32,
        month: u32,
        year: i32,
    ) -> Result<InvoicePeriod, LedgerError> {
        let end = clamped_date(year, month, closing_day)?;
        let (prev_year, prev_month) = previous_month(year, month);
        let previous_close = clamped_date(prev_year, prev_month, closing_day)?;
        let start = previous_close
            .checked_add_signed(Duration::days(1))
            .ok_or(LedgerError::DateOutOfRange)?;
        Ok(InvoicePeriod { start, end })
    }

    /// Returns the due date of the invoice closing in `month`/`year`.
    ///
    /// A due day after the closing day falls in the same month; otherwise
    /// the invoice is due the following month.
    pub fn invoice_due_date(
        closing_day: u32,
        due_day: u32,
        month: u32,
        year: i32,
    ) -> Result<NaiveDate, LedgerError> {
        if due_day > closing_day {
            clamped_date(year, month, due_day)
        } else {
            let (due_year, due_month) = next_month(year, month);
            clamped_date(due_year, due_month, due_day)
        }
    }

    /// Sums debits minus credits, skipping cancelled and superseded rows.
    #[must_use]
    pub fn calculate_invoice_total(transactions: &[Transaction]) -> Decimal {
        Self::billable(transactions)
            .map(|tx| -tx.transaction_type.signed(tx.amount))
            .sum()
    }

    fn billable(transactions: &[Transaction]) -> impl Iterator<Item = &Transaction> {
        transactions
            .iter()
            .filter(|tx| tx.status != TransactionStatus::Cancelled && !tx.has_adjustment)
    }

    /// Credit still available on a card: limit minus the absolute balance.
    ///
    /// A positive balance counts against the limit the same way debt does.
    /// Returns `None` for accounts without card details.
    #[must_use]
    pub fn available_limit(account: &Account) -> Option<Decimal> {
        account
            .credit_card
            .as_ref()
            .map(|card| card.credit_limit - account.balance.abs())
    }

    /// Fails if a debit of `requested` would exceed the card's limit.
    ///
    /// Cards without `enforce_credit_limit` accept any debit.
    ///
    /// # Errors
    ///
    /// Returns `AccountIsNotCreditCard` or `CreditLimitExceeded`.
    pub fn ensure_within_limit(account: &Account, requested: Decimal) -> Result<(), LedgerError> {
        let card = account
            .credit_card
            .as_ref()
            .ok_or(LedgerError::AccountIsNotCreditCard(account.id))?;
        if !card.enforce_credit_limit {
            return Ok(());
        }
        let available = card.credit_limit - account.balance.abs();
        if requested > available {
            return Err(LedgerError::CreditLimitExceeded {
                account_id: account.id,
                available,
                requested,
            });
        }
        Ok(())
    }

    /// Builds the invoice of `account` closing in `month`/`year`.
    ///
    /// `transactions` may include rows outside the period; only those whose
    /// competence date falls inside it are counted.
    ///
    /// # Errors
    ///
    /// Returns `AccountIsNotCreditCard` or a date error.
    pub fn summarize_invoice(
        account: &Account,
        transactions: &[Transaction],
        month: u32,
        year: i32,
    ) -> Result<InvoiceSummary, LedgerError> {
        let card = account
            .credit_card
            .as_ref()
            .ok_or(LedgerError::AccountIsNotCreditCard(account.id))?;
        let period = Self::calculate_invoice_period(card.closing_day, month, year)?;
        let due_date = Self::invoice_due_date(card.closing_day, card.due_day, month, year)?;

        let in_period: Vec<Transaction> = transactions
            .iter()
            .filter(|tx| tx.account_id == account.id && period.contains(tx.competence_date))
            .cloned()
            .collect();

        Ok(InvoiceSummary {
            account_id: account.id,
            period,
            due_date,
            total: Self::calculate_invoice_total(&in_period),
            transaction_count: Self::billable(&in_period).count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::account::fixtures::{checking, credit_card};
    use crate::ledger::service::TransactionDomainService;
    use crate::ledger::transaction::fixtures::new_transaction;
    use crate::ledger::types::TransactionType;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(5, 12, 2025, date(2025, 11, 6), date(2025, 12, 5))]
    #[case(5, 1, 2026, date(2025, 12, 6), date(2026, 1, 5))]
    #[case(31, 2, 2025, date(2025, 2, 1), date(2025, 2, 28))]
    #[case(31, 3, 2025, date(2025, 3, 1), date(2025, 3, 31))]
    #[case(30, 3, 2024, date(2024, 3, 1), date(2024, 3, 30))]
    #[case(1, 6, 2025, date(2025, 5, 2), date(2025, 6, 1))]
    fn test_invoice_period(
        #[case] closing_day: u32,
        #[case] month: u32,
        #[case] year: i32,
        #[case] start: NaiveDate,
        #[case] end: NaiveDate,
    ) {
        let period =
            CreditCardDomainService::calculate_invoice_period(closing_day, month, year).unwrap();
        assert_eq!(period, InvoicePeriod { start, end });
    }

    #[test]
    fn test_invoice_period_rejects_bad_input() {
        assert_eq!(
            CreditCardDomainService::calculate_invoice_period(0, 5, 2025),
            Err(LedgerError::InvalidDayOfMonth(0))
        );
        assert_eq!(
            CreditCardDomainService::calculate_invoice_period(5, 13, 2025),
            Err(LedgerError::InvalidMonth(13))
        );
    }

    #[rstest]
    #[case(5, 12, 11, 2025, date(2025, 11, 12))]
    #[case(25, 5, 11, 2025, date(2025, 12, 5))]
    #[case(5, 5, 12, 2025, date(2026, 1, 5))]
    #[case(28, 31, 2, 2025, date(2025, 2, 28))]
    fn test_invoice_due_date(
        #[case] closing_day: u32,
        #[case] due_day: u32,
        #[case] month: u32,
        #[case] year: i32,
        #[case] expected: NaiveDate,
    ) {
        assert_eq!(
            CreditCardDomainService::invoice_due_date(closing_day, due_day, month, year).unwrap(),
            expected
        );
    }

    #[test]
    fn test_invoice_total_skips_cancelled_and_adjusted() {
        let mut card = credit_card(dec!(5000), dec!(0));
        let purchase =
            |amount| new_transaction(TransactionType::Debit, amount, TransactionStatus::Paid);

        let a =
            TransactionDomainService::create_transaction(&mut card, purchase(dec!(120))).unwrap();
        let mut b =
            TransactionDomainService::create_transaction(&mut card, purchase(dec!(80))).unwrap();
        let mut c =
            TransactionDomainService::create_transaction(&mut card, purchase(dec!(50))).unwrap();
        let refund = TransactionDomainService::create_transaction(
            &mut card,
            new_transaction(TransactionType::Credit, dec!(20), TransactionStatus::Paid),
        )
        .unwrap();

        let user = Uuid::new_v4();
        TransactionDomainService::cancel(&mut card, &mut b, None, user, chrono::Utc::now())
            .unwrap();
        let c2 = TransactionDomainService::adjust(&mut card, &mut c, dec!(45), user, None).unwrap();

        let total = CreditCardDomainService::calculate_invoice_total(&[a, b, c, c2, refund]);
        assert_eq!(total, dec!(145));
    }

    #[test]
    fn test_available_limit() {
        assert_eq!(
            CreditCardDomainService::available_limit(&credit_card(dec!(5000), dec!(-4800))),
            Some(dec!(200))
        );
        assert_eq!(CreditCardDomainService::available_limit(&checking(dec!(10))), None);
    }

    #[test]
    fn test_positive_card_balance_reduces_available_limit() {
        let card = credit_card(dec!(1000), dec!(200));
        assert_eq!(
            CreditCardDomainService::available_limit(&card),
            Some(dec!(800))
        );
        assert_eq!(
            CreditCardDomainService::ensure_within_limit(&card, dec!(1000)),
            Err(LedgerError::CreditLimitExceeded {
                account_id: card.id,
                available: dec!(800),
                requested: dec!(1000),
            })
        );
        assert!(CreditCardDomainService::ensure_within_limit(&card, dec!(800)).is_ok());
    }

    #[test]
    fn test_unenforced_limit_accepts_any_debit() {
        let mut card = credit_card(dec!(100), dec!(0));
        if let Some(details) = card.credit_card.as_mut() {
            details.enforce_credit_limit = false;
        }
        assert!(CreditCardDomainService::ensure_within_limit(&card, dec!(1000)).is_ok());
    }

    #[test]
    fn test_summarize_invoice_filters_period() {
        let mut card = credit_card(dec!(5000), dec!(0));
        let mut inside = new_transaction(TransactionType::Debit, dec!(60), TransactionStatus::Paid);
        inside.competence_date = date(2025, 12, 5);
        let mut outside =
            new_transaction(TransactionType::Debit, dec!(99), TransactionStatus::Paid);
        outside.competence_date = date(2025, 12, 6);

        let a = TransactionDomainService::create_transaction(&mut card, inside).unwrap();
        let b = TransactionDomainService::create_transaction(&mut card, outside).unwrap();

        let summary = CreditCardDomainService::summarize_invoice(&card, &[a, b], 12, 2025).unwrap();
        assert_eq!(summary.total, dec!(60));
        assert_eq!(summary.transaction_count, 1);
        assert_eq!(summary.due_date, date(2025, 12, 12));
        assert_eq!(summary.period.start, date(2025, 11, 6));
    }

    #[test]
    fn test_summarize_invoice_requires_card() {
        let account = checking(dec!(0));
        assert_eq!(
            CreditCardDomainService::summarize_invoice(&account, &[], 1, 2025),
            Err(LedgerError::AccountIsNotCreditCard(account.id))
        );
    }
}
