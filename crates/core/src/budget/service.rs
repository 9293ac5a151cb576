//! Budget allocation engine.
//!
//! For any month, the budgets covering it may claim at most 100% of income
//! and each category may be claimed by at most one of them.

use std::collections::BTreeSet;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::BudgetError;
use super::types::{Allocation, Budget, CreateBudgetInput, UpdateBudgetInput, YearMonth};

/// Decimal places percentages are stored with.
pub const PERCENTAGE_SCALE: u32 = 2;

/// Budget service for business logic.
pub struct BudgetService;

impl BudgetService {
    /// Returns how much of `period` is allocated by `budgets`.
    ///
    /// Only budgets covering the month count; `exclude` skips one budget,
    /// typically the one being updated.
    #[must_use]
    pub fn get_available_percentage(
        budgets: &[Budget],
        period: YearMonth,
        exclude: Option<Uuid>,
    ) -> Allocation {
        let covering = budgets
            .iter()
            .filter(|b| Some(b.id) != exclude && b.covers(period));

        let mut used_percentage = Decimal::ZERO;
        let mut used_category_ids = BTreeSet::new();
        for budget in covering {
            used_percentage += budget.percentage;
            used_category_ids.extend(budget.category_ids.iter().copied());
        }

        Allocation {
            period,
            used_percentage,
            available_percentage: Decimal::ONE_HUNDRED - used_percentage,
            used_category_ids,
        }
    }

    /// Checks that `candidate` fits next to `existing`.
    ///
    /// The candidate's reference month is always checked. A recurrent
    /// candidate is also checked at every later month where another budget
    /// starts, which is where coverage can change. `existing` may contain
    /// the candidate itself; it is skipped.
    ///
    /// # Errors
    ///
    /// Returns a field validation error, `PercentageExceeded` or
    /// `CategoryAlreadyBudgeted`.
    pub fn validate_budget(candidate: &Budget, existing: &[Budget]) -> Result<(), BudgetError> {
        Self::validate_fields(
            &candidate.name,
            candidate.percentage,
            candidate.reference,
            &candidate.category_ids,
        )?;

        for period in Self::periods_to_check(candidate, existing) {
            let allocation = Self::get_available_percentage(existing, period, Some(candidate.id));

            if candidate.percentage > allocation.available_percentage {
                return Err(BudgetError::PercentageExceeded {
                    period,
                    used: allocation.used_percentage,
                    requested: candidate.percentage,
                    available: allocation.available_percentage,
                });
            }

            if let Some(category_id) = candidate
                .category_ids
                .intersection(&allocation.used_category_ids)
                .next()
            {
                return Err(BudgetError::CategoryAlreadyBudgeted {
                    category_id: *category_id,
                    period,
                });
            }
        }
        Ok(())
    }

    /// Months where the candidate's coverage overlaps a possibly different
    /// set of budgets, in chronological order.
    fn periods_to_check(candidate: &Budget, existing: &[Budget]) -> BTreeSet<YearMonth> {
        let mut periods = BTreeSet::from([candidate.reference]);
        if candidate.is_recurrent {
            periods.extend(
                existing
                    .iter()
                    .filter(|b| b.id != candidate.id && b.reference > candidate.reference)
                    .map(|b| b.reference),
            );
        }
        periods
    }

    fn validate_fields(
        name: &str,
        percentage: Decimal,
        reference: YearMonth,
        category_ids: &BTreeSet<Uuid>,
    ) -> Result<(), BudgetError> {
        if name.trim().is_empty() {
            return Err(BudgetError::EmptyName);
        }
        if percentage <= Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            return Err(BudgetError::InvalidPercentage(percentage));
        }
        if percentage.normalize().scale() > PERCENTAGE_SCALE {
            return Err(BudgetError::InvalidPercentageScale(percentage));
        }
        if !(1..=12).contains(&reference.month) {
            return Err(BudgetError::InvalidMonth(reference.month));
        }
        if category_ids.is_empty() {
            return Err(BudgetError::EmptyCategories);
        }
        Ok(())
    }

    /// Builds a new budget from validated input.
    ///
    /// Only field-level rules are checked here; allocation against other
    /// budgets is [`BudgetService::validate_budget`].
    ///
    /// # Errors
    ///
    /// Returns `EmptyName`, `InvalidPercentage`, `InvalidPercentageScale`,
    /// `InvalidMonth` or `EmptyCategories`.
    pub fn build(input: CreateBudgetInput, user_id: Uuid) -> Result<Budget, BudgetError> {
        Self::validate_fields(
            &input.name,
            input.percentage,
            input.reference,
            &input.category_ids,
        )?;
        Ok(Budget {
            id: Uuid::new_v4(),
            name: input.name,
            percentage: input.percentage,
            reference: input.reference,
            category_ids: input.category_ids,
            is_recurrent: input.is_recurrent,
            created_by: user_id,
            created_at: Utc::now(),
        })
    }

    /// Returns `budget` with the fields present in `input` replaced.
    #[must_use]
    pub fn apply_update(budget: &Budget, input: UpdateBudgetInput) -> Budget {
        Budget {
            name: input.name.unwrap_or_else(|| budget.name.clone()),
            percentage: input.percentage.unwrap_or(budget.percentage),
            category_ids: input
                .category_ids
                .unwrap_or_else(|| budget.category_ids.clone()),
            is_recurrent: input.is_recurrent.unwrap_or(budget.is_recurrent),
            ..budget.clone()
        }
    }
}
