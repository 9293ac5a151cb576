//! Property-based tests for the ledger domain services.
//!
//! - Property 1: Installment Sum Integrity
//! - Property 2: Balance Invariants Hold After Any Accepted Command
//! - Property 3: Rejected Commands Leave State Untouched
//! - Property 4: Invoice Periods Tile The Calendar
//! - Property 5: Adjustment Chain Net Effect

use chrono::{Duration, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::account::fixtures::{checking, credit_card};
use super::credit_card::CreditCardDomainService;
use super::dates::next_month;
use super::error::LedgerError;
use super::installment::{InstallmentDomainService, NewInstallmentPlan};
use super::service::TransactionDomainService;
use super::transaction::NewTransaction;
use super::types::{TransactionStatus, TransactionType};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate non-negative balances (0.00 to 10,000.00).
fn balance() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn transaction_type() -> impl Strategy<Value = TransactionType> {
    prop_oneof![Just(TransactionType::Debit), Just(TransactionType::Credit)]
}

fn paid(transaction_type: TransactionType, amount: Decimal) -> NewTransaction {
    NewTransaction {
        category_id: Uuid::new_v4(),
        transaction_type,
        amount,
        description: "prop".to_string(),
        competence_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        due_date: None,
        status: TransactionStatus::Paid,
        user_id: Uuid::new_v4(),
        operation_id: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: Installment Sum Integrity
    // =========================================================================

    /// *For any* total and count where every share is positive, the
    /// installment amounts SHALL sum exactly to the total and all but the
    /// last SHALL be equal.
    #[test]
    fn prop_installments_sum_to_total(
        total in positive_amount(),
        count in 2u32..=48,
    ) {
        match InstallmentDomainService::split_amount(total, count) {
            Ok(amounts) => {
                prop_assert_eq!(amounts.len(), count as usize);
                let sum: Decimal = amounts.iter().copied().sum();
                prop_assert_eq!(sum, total);
                prop_assert!(amounts.iter().all(|a| *a > Decimal::ZERO));
                prop_assert!(amounts.iter().all(|a| a.scale() <= 2));
                let first = amounts[0];
                prop_assert!(amounts[..amounts.len() - 1].iter().all(|a| *a == first));
            }
            Err(err) => {
                let is_too_small = matches!(err, LedgerError::InstallmentAmountTooSmall { .. });
                prop_assert!(is_too_small);
            }
        }
    }

    /// *For any* installment plan, the created installments SHALL be numbered
    /// 1..=count in one group and only the first MAY be paid.
    #[test]
    fn prop_installment_plan_structure(
        total in positive_amount(),
        count in 2u32..=24,
        day in 1u32..=31,
    ) {
        let mut account = checking(Decimal::ZERO);
        let first = super::dates::clamped_date(2025, 1, day).unwrap();
        let plan = NewInstallmentPlan {
            category_id: Uuid::new_v4(),
            transaction_type: TransactionType::Debit,
            total_amount: total,
            count,
            description: "prop".to_string(),
            first_competence_date: first,
            first_due_date: None,
            first_status: TransactionStatus::Pending,
            user_id: Uuid::new_v4(),
            operation_id: None,
        };
        if let Ok(installments) =
            InstallmentDomainService::create_installments(&mut account, plan)
        {
            let group = installments[0].installment_group_id;
            for (n, tx) in (1u32..).zip(&installments) {
                prop_assert_eq!(tx.installment_number, Some(n));
                prop_assert_eq!(tx.installment_group_id, group);
                prop_assert_eq!(tx.status, TransactionStatus::Pending);
            }
            prop_assert_eq!(account.balance, Decimal::ZERO);
        }
    }

    // =========================================================================
    // Property 2 & 3: Balance Invariants
    // =========================================================================

    /// *For any* sequence of paid movements on a non-overdraft account, the
    /// balance SHALL never go below zero and SHALL equal the sum of accepted
    /// effects; rejected movements SHALL leave it unchanged.
    #[test]
    fn prop_non_overdraft_never_negative(
        opening in balance(),
        movements in prop::collection::vec((transaction_type(), positive_amount()), 1..20),
    ) {
        let mut account = checking(opening);
        let mut expected = opening;
        for (kind, amount) in movements {
            let before = account.balance;
            match TransactionDomainService::create_transaction(&mut account, paid(kind, amount)) {
                Ok(tx) => expected += tx.balance_effect(),
                Err(_) => prop_assert_eq!(account.balance, before),
            }
            prop_assert!(account.balance >= Decimal::ZERO);
        }
        prop_assert_eq!(account.balance, expected);
    }

    /// *For any* enforced credit card, outstanding debt SHALL never exceed
    /// the credit limit.
    #[test]
    fn prop_card_debt_within_limit(
        limit in balance(),
        purchases in prop::collection::vec(positive_amount(), 1..20),
    ) {
        let mut card = credit_card(limit, Decimal::ZERO);
        for amount in purchases {
            let before = card.balance;
            let result = TransactionDomainService::create_transaction(
                &mut card,
                paid(TransactionType::Debit, amount),
            );
            if result.is_err() {
                prop_assert_eq!(card.balance, before);
            }
            prop_assert!(-card.balance <= limit);
        }
    }

    // =========================================================================
    // Property 4: Invoice Periods Tile The Calendar
    // =========================================================================

    /// *For any* closing day, consecutive invoice periods SHALL be contiguous
    /// and non-empty, and each SHALL end on the clamped closing day.
    #[test]
    fn prop_invoice_periods_contiguous(
        closing_day in 1u32..=31,
        month in 1u32..=12,
        year in 2000i32..2100,
    ) {
        let current =
            CreditCardDomainService::calculate_invoice_period(closing_day, month, year).unwrap();
        let (next_year, following) = next_month(year, month);
        let next =
            CreditCardDomainService::calculate_invoice_period(closing_day, following, next_year)
                .unwrap();

        prop_assert!(current.start <= current.end);
        prop_assert_eq!(current.end + Duration::days(1), next.start);
        prop_assert_eq!(
            current.end,
            super::dates::clamped_date(year, month, closing_day).unwrap()
        );
    }

    // =========================================================================
    // Property 5: Adjustment Chain Net Effect
    // =========================================================================

    /// *For any* paid transaction adjusted any number of times, the balance
    /// SHALL reflect only the latest amount in the chain.
    #[test]
    fn prop_adjustment_chain_reflects_latest(
        kind in transaction_type(),
        amounts in prop::collection::vec(positive_amount(), 2..6),
    ) {
        let mut account = super::account::fixtures::overdraft(Decimal::ZERO);
        let user = Uuid::new_v4();
        let mut current =
            TransactionDomainService::create_transaction(&mut account, paid(kind, amounts[0]))
                .unwrap();
        for amount in &amounts[1..] {
            let next =
                TransactionDomainService::adjust(&mut account, &mut current, *amount, user, None)
                    .unwrap();
            prop_assert!(current.has_adjustment);
            prop_assert_eq!(next.original_transaction_id, Some(current.id));
            current = next;
        }
        let latest = amounts[amounts.len() - 1];
        prop_assert_eq!(account.balance, kind.signed(latest));

        TransactionDomainService::cancel(&mut account, &mut current, None, user, Utc::now())
            .unwrap();
        prop_assert_eq!(account.balance, Decimal::ZERO);
    }
}
