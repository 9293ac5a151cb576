//! Tests for the budget allocation engine.

use std::collections::BTreeSet;

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::error::BudgetError;
use super::service::BudgetService;
use super::types::{Budget, CreateBudgetInput, UpdateBudgetInput, YearMonth};

fn budget(percentage: Decimal, reference: YearMonth, is_recurrent: bool) -> Budget {
    BudgetService::build(
        CreateBudgetInput {
            name: "Moradia".to_string(),
            percentage,
            reference,
            category_ids: BTreeSet::from([Uuid::new_v4()]),
            is_recurrent,
        },
        Uuid::new_v4(),
    )
    .unwrap()
}

const MARCH: YearMonth = YearMonth::new(2025, 3);

#[test]
fn test_ceiling_rejects_overflow_and_accepts_exact_fill() {
    let existing = vec![budget(dec!(80), MARCH, false)];

    let too_much = budget(dec!(25), MARCH, false);
    assert_eq!(
        BudgetService::validate_budget(&too_much, &existing),
        Err(BudgetError::PercentageExceeded {
            period: MARCH,
            used: dec!(80),
            requested: dec!(25),
            available: dec!(20),
        })
    );

    let exact = budget(dec!(20), MARCH, false);
    assert!(BudgetService::validate_budget(&exact, &existing).is_ok());

    let mut all = existing;
    all.push(exact);
    let allocation = BudgetService::get_available_percentage(&all, MARCH, None);
    assert_eq!(allocation.used_percentage, dec!(100));
    assert_eq!(allocation.available_percentage, Decimal::ZERO);
}

#[test]
fn test_recurrent_budget_covers_later_months() {
    let recurrent = budget(dec!(60), YearMonth::new(2025, 1), true);
    let existing = vec![recurrent];

    let june = BudgetService::get_available_percentage(&existing, YearMonth::new(2025, 6), None);
    assert_eq!(june.used_percentage, dec!(60));

    let before = BudgetService::get_available_percentage(&existing, YearMonth::new(2024, 12), None);
    assert_eq!(before.used_percentage, Decimal::ZERO);

    let candidate = budget(dec!(50), YearMonth::new(2025, 6), false);
    assert!(matches!(
        BudgetService::validate_budget(&candidate, &existing),
        Err(BudgetError::PercentageExceeded { .. })
    ));
}

#[test]
fn test_recurrent_candidate_checked_against_later_budgets() {
    let later = budget(dec!(70), YearMonth::new(2025, 9), false);
    let existing = vec![later];

    let candidate = budget(dec!(40), MARCH, true);
    assert_eq!(
        BudgetService::validate_budget(&candidate, &existing),
        Err(BudgetError::PercentageExceeded {
            period: YearMonth::new(2025, 9),
            used: dec!(70),
            requested: dec!(40),
            available: dec!(30),
        })
    );

    let one_off = budget(dec!(40), MARCH, false);
    assert!(BudgetService::validate_budget(&one_off, &existing).is_ok());
}

#[test]
fn test_category_claimed_once_per_month() {
    let first = budget(dec!(10), MARCH, false);
    let shared = *first.category_ids.iter().next().unwrap();

    let mut second = budget(dec!(10), MARCH, false);
    second.category_ids.insert(shared);

    assert_eq!(
        BudgetService::validate_budget(&second, &[first]),
        Err(BudgetError::CategoryAlreadyBudgeted {
            category_id: shared,
            period: MARCH,
        })
    );
}

#[test]
fn test_update_excludes_itself() {
    let original = budget(dec!(80), MARCH, false);
    let updated = BudgetService::apply_update(
        &original,
        UpdateBudgetInput {
            percentage: Some(dec!(90)),
            ..UpdateBudgetInput::default()
        },
    );
    assert_eq!(updated.id, original.id);
    assert!(BudgetService::validate_budget(&updated, &[original]).is_ok());
}

#[test]
fn test_field_validation() {
    let mut candidate = budget(dec!(10), MARCH, false);
    candidate.percentage = Decimal::ZERO;
    assert_eq!(
        BudgetService::validate_budget(&candidate, &[]),
        Err(BudgetError::InvalidPercentage(Decimal::ZERO))
    );

    candidate.percentage = dec!(100.01);
    assert!(matches!(
        BudgetService::validate_budget(&candidate, &[]),
        Err(BudgetError::InvalidPercentage(_))
    ));

    candidate.percentage = dec!(33.335);
    assert_eq!(
        BudgetService::validate_budget(&candidate, &[]),
        Err(BudgetError::InvalidPercentageScale(dec!(33.335)))
    );

    candidate.percentage = dec!(33.330);
    assert!(BudgetService::validate_budget(&candidate, &[]).is_ok());

    candidate.percentage = dec!(100);
    candidate.category_ids.clear();
    assert_eq!(
        BudgetService::validate_budget(&candidate, &[]),
        Err(BudgetError::EmptyCategories)
    );
}

#[test]
fn test_build_rejects_sub_hundredth_percentage() {
    let result = BudgetService::build(
        CreateBudgetInput {
            name: "Lazer".to_string(),
            percentage: dec!(33.335),
            reference: MARCH,
            category_ids: BTreeSet::from([Uuid::new_v4()]),
            is_recurrent: false,
        },
        Uuid::new_v4(),
    );
    assert_eq!(result, Err(BudgetError::InvalidPercentageScale(dec!(33.335))));
    assert_eq!(
        BudgetError::InvalidPercentageScale(dec!(33.335)).error_code(),
        "INVALID_PERCENTAGE_SCALE"
    );
}

fn percentage() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000i64).prop_map(|v| Decimal::new(v, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* sequence of budget proposals, accepting only those that
    /// validate SHALL keep every month at or below 100%.
    #[test]
    fn prop_accepted_budgets_never_exceed_ceiling(
        proposals in prop::collection::vec((percentage(), 1u32..=12, any::<bool>()), 1..15),
    ) {
        let mut accepted: Vec<Budget> = Vec::new();
        for (pct, month, recurrent) in proposals {
            let candidate = budget(pct, YearMonth::new(2025, month), recurrent);
            if BudgetService::validate_budget(&candidate, &accepted).is_ok() {
                accepted.push(candidate);
            }
        }
        for month in 1..=12 {
            let allocation = BudgetService::get_available_percentage(
                &accepted,
                YearMonth::new(2025, month),
                None,
            );
            prop_assert!(allocation.used_percentage <= dec!(100));
            prop_assert!(allocation.available_percentage >= Decimal::ZERO);
        }
        let next_year =
            BudgetService::get_available_percentage(&accepted, YearMonth::new(2026, 1), None);
        prop_assert!(next_year.used_percentage <= dec!(100));
    }
}
