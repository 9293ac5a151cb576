//! `SeaORM` active enums mapped to Postgres enum types.

use caixa_core::ledger;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "checking")]
    Checking,
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
    #[sea_orm(string_value = "investment")]
    Investment,
    #[sea_orm(string_value = "wallet")]
    Wallet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    #[sea_orm(string_value = "debit")]
    Debit,
    #[sea_orm(string_value = "credit")]
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<AccountType> for ledger::AccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Checking => Self::Checking,
            AccountType::CreditCard => Self::CreditCard,
            AccountType::Investment => Self::Investment,
            AccountType::Wallet => Self::Wallet,
        }
    }
}

impl From<ledger::AccountType> for AccountType {
    fn from(value: ledger::AccountType) -> Self {
        match value {
            ledger::AccountType::Checking => Self::Checking,
            ledger::AccountType::CreditCard => Self::CreditCard,
            ledger::AccountType::Investment => Self::Investment,
            ledger::AccountType::Wallet => Self::Wallet,
        }
    }
}

impl From<TransactionType> for ledger::TransactionType {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Debit => Self::Debit,
            TransactionType::Credit => Self::Credit,
        }
    }
}

impl From<ledger::TransactionType> for TransactionType {
    fn from(value: ledger::TransactionType) -> Self {
        match value {
            ledger::TransactionType::Debit => Self::Debit,
            ledger::TransactionType::Credit => Self::Credit,
        }
    }
}

impl From<TransactionStatus> for ledger::TransactionStatus {
    fn from(value: TransactionStatus) -> Self {
        match value {
            TransactionStatus::Paid => Self::Paid,
            TransactionStatus::Pending => Self::Pending,
            TransactionStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<ledger::TransactionStatus> for TransactionStatus {
    fn from(value: ledger::TransactionStatus) -> Self {
        match value {
            ledger::TransactionStatus::Paid => Self::Paid,
            ledger::TransactionStatus::Pending => Self::Pending,
            ledger::TransactionStatus::Cancelled => Self::Cancelled,
        }
    }
}
