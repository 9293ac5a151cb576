//! `SeaORM` entity definitions.
//!
//! Each entity converts to and from its `caixa-core` domain type so
//! repositories never hand raw models to the domain services.

pub mod accounts;
pub mod audit_logs;
pub mod budget_categories;
pub mod budgets;
pub mod categories;
pub mod operation_logs;
pub mod recurrence_templates;
pub mod sea_orm_active_enums;
pub mod transactions;
