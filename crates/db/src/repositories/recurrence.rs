//! Recurrence template repository.

use caixa_core::ledger::{LedgerError, RecurrenceTemplate};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::entities::recurrence_templates;
use crate::error::CommandResult;

/// Recurrence template repository.
#[derive(Debug, Clone)]
pub struct RecurrenceRepository {
    db: DatabaseConnection,
}

impl RecurrenceRepository {
    /// Creates a new recurrence repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a template.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert(
        &self,
        txn: &DatabaseTransaction,
        template: &RecurrenceTemplate,
    ) -> Result<(), DbErr> {
        recurrence_templates::ActiveModel::from(template)
            .insert(txn)
            .await?;
        Ok(())
    }

    /// Reads a template without locking it.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RecurrenceTemplate>, DbErr> {
        Ok(recurrence_templates::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(RecurrenceTemplate::from))
    }

    /// Ids and owning accounts of every active template.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn active(&self) -> Result<Vec<(Uuid, Uuid)>, DbErr> {
        Ok(recurrence_templates::Entity::find()
            .filter(recurrence_templates::Column::IsActive.eq(true))
            .order_by_asc(recurrence_templates::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|t| (t.id, t.account_id))
            .collect())
    }

    /// Loads a template holding its row lock.
    ///
    /// # Errors
    ///
    /// Returns `RecurrenceTemplateNotFound` or a lock timeout.
    pub async fn get_for_exclusive_mutation(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> CommandResult<RecurrenceTemplate> {
        let model = recurrence_templates::Entity::find_by_id(id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(LedgerError::RecurrenceTemplateNotFound(id))?;
        Ok(model.into())
    }

    /// Persists activity and generation progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn save(
        &self,
        txn: &DatabaseTransaction,
        template: &RecurrenceTemplate,
    ) -> Result<(), DbErr> {
        recurrence_templates::ActiveModel::progress(template)
            .update(txn)
            .await?;
        Ok(())
    }
}
