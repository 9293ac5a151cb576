//! Audit log repository.

use async_trait::async_trait;
use caixa_core::ledger::{AuditEntityType, AuditEntry};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::audit_logs;

/// Destination for audit entries written after a command commits.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persists one entry.
    async fn log(&self, entry: &AuditEntry) -> Result<(), DbErr>;
}

/// Audit log repository backed by the `audit_logs` table.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    db: DatabaseConnection,
}

impl AuditLogRepository {
    /// Creates a new audit log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// History of one entity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_entity(
        &self,
        entity_type: AuditEntityType,
        entity_id: Uuid,
    ) -> Result<Vec<audit_logs::Model>, DbErr> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::EntityType.eq(entity_type.as_str()))
            .filter(audit_logs::Column::EntityId.eq(entity_id))
            .order_by_asc(audit_logs::Column::CreatedAt)
            .all(&self.db)
            .await
    }
}

#[async_trait]
impl AuditSink for AuditLogRepository {
    async fn log(&self, entry: &AuditEntry) -> Result<(), DbErr> {
        audit_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            entity_type: Set(entry.entity_type.as_str().to_string()),
            entity_id: Set(entry.entity_id),
            action: Set(entry.action.as_str().to_string()),
            user_id: Set(entry.user_id),
            previous_data: Set(entry.previous_data.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }
}
