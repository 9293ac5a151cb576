//! Calendar helpers shared by installments, recurrences and invoices.
//!
//! All functions clamp a requested day to the length of the target month,
//! so day 31 in February lands on the 28th (or 29th).

use chrono::{Months, NaiveDate};

use super::error::LedgerError;

/// Returns the number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> Result<u32, LedgerError> {
    let first = first_day_of_month(year, month)?;
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or(LedgerError::DateOutOfRange)?;
    let days = next.signed_duration_since(first).num_days();
    u32::try_from(days).map_err(|_| LedgerError::DateOutOfRange)
}

/// Returns the first day of the given month.
pub fn first_day_of_month(year: i32, month: u32) -> Result<NaiveDate, LedgerError> {
    if !(1..=12).contains(&month) {
        return Err(LedgerError::InvalidMonth(month));
    }
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(LedgerError::DateOutOfRange)
}

/// Returns `day` of the given month, clamped to the month's last day.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, LedgerError> {
    if !(1..=31).contains(&day) {
        return Err(LedgerError::InvalidDayOfMonth(day));
    }
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last)).ok_or(LedgerError::DateOutOfRange)
}

/// Adds `months` to `anchor`, clamping to the end of the target month.
///
/// Always computed from the anchor: `add_months(Jan 31, 2)` is Mar 31,
/// not Mar 28.
pub fn add_months(anchor: NaiveDate, months: u32) -> Result<NaiveDate, LedgerError> {
    anchor
        .checked_add_months(Months::new(months))
        .ok_or(LedgerError::DateOutOfRange)
}

/// Returns the (year, month) immediately before the given one.
#[must_use]
pub const fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 { (year - 1, 12) } else { (year, month - 1) }
}

/// Returns the (year, month) immediately after the given one.
#[must_use]
pub const fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 { (year + 1, 1) } else { (year, month + 1) }
}
