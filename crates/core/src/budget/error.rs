//! Budget error types.

use caixa_shared::ErrorCategory;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::types::YearMonth;

/// Budget-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    /// Budget not found.
    #[error("Budget not found: {0}")]
    NotFound(Uuid),

    /// Budget name is blank.
    #[error("Budget name is required")]
    EmptyName,

    /// Percentage outside (0, 100].
    #[error("Percentage must be greater than 0 and at most 100, got {0}")]
    InvalidPercentage(Decimal),

    /// Percentage with more than two decimal places.
    #[error("Percentage must have at most two decimal places, got {0}")]
    InvalidPercentageScale(Decimal),

    /// Month outside 1..=12.
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),

    /// A budget needs at least one category.
    #[error("Budget must have at least one category")]
    EmptyCategories,

    /// Category does not exist.
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    /// The month would be allocated beyond 100%.
    #[error(
        "Budget over 100% for {period}: used {used}, requested {requested}, available {available}"
    )]
    PercentageExceeded {
        /// Month that would overflow.
        period: YearMonth,
        /// Percentage already allocated.
        used: Decimal,
        /// Percentage of the candidate budget.
        requested: Decimal,
        /// Percentage still free.
        available: Decimal,
    },

    /// Category already belongs to another budget covering the month.
    #[error("Category {category_id} is already budgeted in {period}")]
    CategoryAlreadyBudgeted {
        /// The category ID.
        category_id: Uuid,
        /// Month where it is claimed.
        period: YearMonth,
    },
}

impl BudgetError {
    /// Returns the stable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "BUDGET_NOT_FOUND",
            Self::EmptyName => "EMPTY_NAME",
            Self::InvalidPercentage(_) => "INVALID_PERCENTAGE",
            Self::InvalidPercentageScale(_) => "INVALID_PERCENTAGE_SCALE",
            Self::InvalidMonth(_) => "INVALID_MONTH",
            Self::EmptyCategories => "EMPTY_CATEGORIES",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::PercentageExceeded { .. } => "PERCENTAGE_EXCEEDED",
            Self::CategoryAlreadyBudgeted { .. } => "CATEGORY_ALREADY_BUDGETED",
        }
    }

    /// Returns the category used by callers to decide how to react.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) | Self::CategoryNotFound(_) => ErrorCategory::NotFound,
            _ => ErrorCategory::InvariantViolation,
        }
    }
}
