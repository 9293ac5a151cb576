//! `SeaORM` Entity for recurrence_templates table.

use caixa_core::ledger::RecurrenceTemplate;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{TransactionStatus, TransactionType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "recurrence_templates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub transaction_type: TransactionType,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    pub description: String,
    pub day_of_month: i16,
    pub is_active: bool,
    pub last_generated_date: Option<Date>,
    pub default_status: TransactionStatus,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for RecurrenceTemplate {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            category_id: model.category_id,
            transaction_type: model.transaction_type.into(),
            amount: model.amount,
            description: model.description,
            day_of_month: u32::from(model.day_of_month.unsigned_abs()),
            is_active: model.is_active,
            last_generated_date: model.last_generated_date,
            default_status: model.default_status.into(),
            created_by: model.created_by,
            created_at: model.created_at,
        }
    }
}

impl From<&RecurrenceTemplate> for ActiveModel {
    fn from(template: &RecurrenceTemplate) -> Self {
        Self {
            id: Set(template.id),
            account_id: Set(template.account_id),
            category_id: Set(template.category_id),
            transaction_type: Set(template.transaction_type.into()),
            amount: Set(template.amount),
            description: Set(template.description.clone()),
            // Validated to 1..=31 on construction.
            day_of_month: Set(i16::try_from(template.day_of_month).unwrap_or(31)),
            is_active: Set(template.is_active),
            last_generated_date: Set(template.last_generated_date),
            default_status: Set(template.default_status.into()),
            created_by: Set(template.created_by),
            created_at: Set(template.created_at),
            updated_at: NotSet,
        }
    }
}

impl ActiveModel {
    /// Active model carrying the fields that change after creation.
    #[must_use]
    pub fn progress(template: &RecurrenceTemplate) -> Self {
        Self {
            id: Set(template.id),
            is_active: Set(template.is_active),
            last_generated_date: Set(template.last_generated_date),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
    }
}
