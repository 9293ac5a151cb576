//! Budget data types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    /// Calendar year.
    pub year: i32,
    /// Month, 1..=12.
    pub month: u32,
}

impl YearMonth {
    /// Creates a year-month pair.
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A share of monthly income reserved for a set of categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Budget ID.
    pub id: Uuid,
    /// Budget name.
    pub name: String,
    /// Share of income, 0 < p <= 100.
    pub percentage: Decimal,
    /// First month the budget covers.
    pub reference: YearMonth,
    /// Categories counted against the budget.
    pub category_ids: BTreeSet<Uuid>,
    /// Recurrent budgets also cover every month after `reference`.
    pub is_recurrent: bool,
    /// User who created the budget.
    pub created_by: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Budget {
    /// Returns true if the budget applies to `period`.
    #[must_use]
    pub fn covers(&self, period: YearMonth) -> bool {
        period == self.reference || (self.is_recurrent && period > self.reference)
    }
}

/// Input for creating a budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBudgetInput {
    /// Budget name.
    pub name: String,
    /// Share of income, 0 < p <= 100.
    pub percentage: Decimal,
    /// First month the budget covers.
    pub reference: YearMonth,
    /// Categories counted against the budget.
    pub category_ids: BTreeSet<Uuid>,
    /// Whether the budget repeats every later month.
    pub is_recurrent: bool,
}

/// Input for updating a budget. Absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBudgetInput {
    /// New name.
    pub name: Option<String>,
    /// New percentage.
    pub percentage: Option<Decimal>,
    /// New category set.
    pub category_ids: Option<BTreeSet<Uuid>>,
    /// New recurrence flag.
    pub is_recurrent: Option<bool>,
}

/// Percentage allocation of one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// The month.
    pub period: YearMonth,
    /// Sum of covering budgets' percentages.
    pub used_percentage: Decimal,
    /// `100 - used_percentage`.
    pub available_percentage: Decimal,
    /// Categories already claimed by a covering budget.
    pub used_category_ids: BTreeSet<Uuid>,
}
