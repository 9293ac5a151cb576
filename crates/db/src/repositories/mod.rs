//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Writes take the command's `DatabaseTransaction`; plain reads use the pool.

pub mod account;
pub mod audit_log;
pub mod budget;
pub mod category;
pub mod operation_log;
pub mod recurrence;
pub mod transaction;

pub use account::AccountRepository;
pub use audit_log::{AuditLogRepository, AuditSink};
pub use budget::BudgetRepository;
pub use category::CategoryRepository;
pub use operation_log::OperationLogRepository;
pub use recurrence::RecurrenceRepository;
pub use transaction::TransactionRepository;
