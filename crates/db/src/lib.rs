//! Database layer with `SeaORM` entities, repositories and ledger commands.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories, including the exclusive-lock fetch used for balances
//! - The unit of work and the [`LedgerCommands`] coordinator
//! - Database migrations

pub mod commands;
pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;
pub mod unit_of_work;

pub use commands::{InvoicePayment, LedgerCommands, ReceiptImport, RecurrenceRun};
pub use error::{CommandError, CommandResult};
pub use repositories::{
    AccountRepository, AuditLogRepository, AuditSink, BudgetRepository, CategoryRepository,
    OperationLogRepository, RecurrenceRepository, TransactionRepository,
};
pub use unit_of_work::UnitOfWork;

use std::time::Duration;

use caixa_shared::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    Database::connect(options).await
}
