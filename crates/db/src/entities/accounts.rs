//! `SeaORM` Entity for accounts table.

use caixa_core::ledger::{Account, CreditCardDetails};
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::AccountType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub account_type: AccountType,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub balance: Decimal,
    pub allow_negative_balance: bool,
    pub is_active: bool,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))", nullable)]
    pub credit_limit: Option<Decimal>,
    pub closing_day: Option<i16>,
    pub due_day: Option<i16>,
    pub debit_account_id: Option<Uuid>,
    pub enforce_credit_limit: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Account {
    fn from(model: Model) -> Self {
        let credit_card = match (model.credit_limit, model.closing_day, model.due_day) {
            (Some(credit_limit), Some(closing_day), Some(due_day)) => Some(CreditCardDetails {
                credit_limit,
                closing_day: u32::from(closing_day.unsigned_abs()),
                due_day: u32::from(due_day.unsigned_abs()),
                debit_account_id: model.debit_account_id,
                enforce_credit_limit: model.enforce_credit_limit,
            }),
            _ => None,
        };
        Self {
            id: model.id,
            name: model.name,
            account_type: model.account_type.into(),
            balance: model.balance,
            allow_negative_balance: model.allow_negative_balance,
            is_active: model.is_active,
            credit_card,
        }
    }
}

/// Days are validated to 1..=31 by the domain factory.
fn day_column(day: u32) -> Option<i16> {
    i16::try_from(day).ok()
}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        let card = account.credit_card.as_ref();
        Self {
            id: Set(account.id),
            name: Set(account.name.clone()),
            account_type: Set(account.account_type.into()),
            balance: Set(account.balance),
            allow_negative_balance: Set(account.allow_negative_balance),
            is_active: Set(account.is_active),
            credit_limit: Set(card.map(|c| c.credit_limit)),
            closing_day: Set(card.and_then(|c| day_column(c.closing_day))),
            due_day: Set(card.and_then(|c| day_column(c.due_day))),
            debit_account_id: Set(card.and_then(|c| c.debit_account_id)),
            enforce_credit_limit: Set(card.is_some_and(|c| c.enforce_credit_limit)),
            created_at: NotSet,
            updated_at: Set(Utc::now()),
        }
    }
}
