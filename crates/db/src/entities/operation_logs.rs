//! `SeaORM` Entity for operation_logs table.

use caixa_core::ledger::{OperationRecord, OperationType};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "operation_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub operation_id: String,
    pub operation_type: String,
    pub result_entity_id: Option<Uuid>,
    #[sea_orm(column_type = "JsonBinary")]
    pub result_payload: Json,
    pub created_at: DateTimeUtc,
    pub expires_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for OperationRecord {
    type Error = DbErr;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let operation_type = OperationType::parse(&model.operation_type).ok_or_else(|| {
            DbErr::Type(format!("unknown operation type: {}", model.operation_type))
        })?;
        Ok(Self {
            operation_id: model.operation_id,
            operation_type,
            result_entity_id: model.result_entity_id,
            result_payload: model.result_payload,
            created_at: model.created_at,
            expires_at: model.expires_at,
        })
    }
}

impl From<&OperationRecord> for ActiveModel {
    fn from(record: &OperationRecord) -> Self {
        Self {
            operation_id: Set(record.operation_id.clone()),
            operation_type: Set(record.operation_type.as_str().to_string()),
            result_entity_id: Set(record.result_entity_id),
            result_payload: Set(record.result_payload.clone()),
            created_at: Set(record.created_at),
            expires_at: Set(record.expires_at),
        }
    }
}
