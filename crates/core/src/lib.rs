//! Core business logic for Caixa.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, invariants and calculations live here; the `caixa-db`
//! crate loads entities under lock, hands them to these services and persists
//! the result.
//!
//! # Modules
//!
//! - `ledger` - Accounts, transactions and the domain services that move money
//! - `budget` - Monthly percentage allocation across category budgets

pub mod budget;
pub mod ledger;
