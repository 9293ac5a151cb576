//! Monthly budget percentage allocation.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::BudgetError;
pub use service::{BudgetService, PERCENTAGE_SCALE};
pub use types::{Allocation, Budget, CreateBudgetInput, UpdateBudgetInput, YearMonth};
