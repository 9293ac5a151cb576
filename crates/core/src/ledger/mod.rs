//! Household ledger logic.
//!
//! This module implements the core ledger functionality:
//! - Accounts and their balance invariants (overdraft, credit limit)
//! - Transactions and their append-only adjustment/cancellation chain
//! - Domain services for single transactions, installments, recurrences,
//!   transfers and credit-card invoices
//! - Operation log and audit value types
//! - Error types for ledger operations

pub mod account;
pub mod audit;
pub mod credit_card;
pub mod dates;
pub mod error;
pub mod installment;
pub mod operation;
pub mod recurrence;
pub mod service;
pub mod transaction;
pub mod transfer;
pub mod types;

#[cfg(test)]
mod service_props;

pub use account::{Account, CreditCardDetails, NewAccount};
pub use audit::{AuditAction, AuditEntityType, AuditEntry};
pub use credit_card::{CreditCardDomainService, InvoicePeriod, InvoiceSummary};
pub use error::LedgerError;
pub use installment::{
    GroupCancellation, InstallmentDomainService, MAX_INSTALLMENTS, NewInstallmentPlan,
};
pub use operation::{OperationRecord, OperationType};
pub use recurrence::{NewRecurrenceTemplate, RecurrenceDomainService, RecurrenceTemplate};
pub use service::TransactionDomainService;
pub use transaction::{NewTransaction, Transaction};
pub use types::{AccountType, TransactionStatus, TransactionType};
pub use transfer::{NewInvoicePayment, NewTransfer, TransferDomainService, TransferLegs};
