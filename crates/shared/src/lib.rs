//! Shared configuration and error types for Caixa.
//!
//! This crate provides common types used across all other crates:
//! - Application configuration (database and ledger settings)
//! - Application-wide error type with stable error categories

pub mod config;
pub mod error;

pub use config::{AppConfig, DatabaseConfig, LedgerConfig};
pub use error::{AppError, AppResult, ErrorCategory};
