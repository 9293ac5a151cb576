//! `SeaORM` Entity for transactions table.

use caixa_core::ledger::Transaction;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{TransactionStatus, TransactionType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub transaction_type: TransactionType,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    pub description: String,
    pub competence_date: Date,
    pub due_date: Option<Date>,
    pub status: TransactionStatus,
    pub installment_group_id: Option<Uuid>,
    pub installment_number: Option<i32>,
    pub total_installments: Option<i32>,
    pub transfer_group_id: Option<Uuid>,
    pub recurrence_template_id: Option<Uuid>,
    pub original_transaction_id: Option<Uuid>,
    pub has_adjustment: bool,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_at: Option<DateTimeUtc>,
    pub operation_id: Option<String>,
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
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Categories,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Transaction {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            category_id: model.category_id,
            transaction_type: model.transaction_type.into(),
            amount: model.amount,
            description: model.description,
            competence_date: model.competence_date,
            due_date: model.due_date,
            status: model.status.into(),
            installment_group_id: model.installment_group_id,
            installment_number: model.installment_number.map(i32::unsigned_abs),
            total_installments: model.total_installments.map(i32::unsigned_abs),
            transfer_group_id: model.transfer_group_id,
            recurrence_template_id: model.recurrence_template_id,
            original_transaction_id: model.original_transaction_id,
            has_adjustment: model.has_adjustment,
            cancellation_reason: model.cancellation_reason,
            cancelled_by: model.cancelled_by,
            cancelled_at: model.cancelled_at,
            operation_id: model.operation_id,
            created_by: model.created_by,
            created_at: model.created_at,
        }
    }
}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: Set(tx.id),
            account_id: Set(tx.account_id),
            category_id: Set(tx.category_id),
            transaction_type: Set(tx.transaction_type.into()),
            amount: Set(tx.amount),
            description: Set(tx.description.clone()),
            competence_date: Set(tx.competence_date),
            due_date: Set(tx.due_date),
            status: Set(tx.status.into()),
            installment_group_id: Set(tx.installment_group_id),
            installment_number: Set(tx.installment_number.and_then(|n| i32::try_from(n).ok())),
            total_installments: Set(tx.total_installments.and_then(|n| i32::try_from(n).ok())),
            transfer_group_id: Set(tx.transfer_group_id),
            recurrence_template_id: Set(tx.recurrence_template_id),
            original_transaction_id: Set(tx.original_transaction_id),
            has_adjustment: Set(tx.has_adjustment),
            cancellation_reason: Set(tx.cancellation_reason.clone()),
            cancelled_by: Set(tx.cancelled_by),
            cancelled_at: Set(tx.cancelled_at),
            operation_id: Set(tx.operation_id.clone()),
            created_by: Set(tx.created_by),
            created_at: Set(tx.created_at),
            updated_at: NotSet,
        }
    }
}

impl ActiveModel {
    /// Active model carrying only the fields a state change may touch.
    #[must_use]
    pub fn state_change(tx: &Transaction) -> Self {
        Self {
            id: Set(tx.id),
            status: Set(tx.status.into()),
            has_adjustment: Set(tx.has_adjustment),
            cancellation_reason: Set(tx.cancellation_reason.clone()),
            cancelled_by: Set(tx.cancelled_by),
            cancelled_at: Set(tx.cancelled_at),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
    }
}
