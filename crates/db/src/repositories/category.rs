//! Category repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::categories;

/// Category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a user category and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the insert fails.
    pub async fn create(&self, name: &str) -> Result<Uuid, DbErr> {
        let model = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            is_system: Set(false),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;
        Ok(model.id)
    }

    /// Returns true if an active category with `id` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn exists<C: ConnectionTrait>(&self, conn: &C, id: Uuid) -> Result<bool, DbErr> {
        let count = categories::Entity::find_by_id(id)
            .filter(categories::Column::IsActive.eq(true))
            .count(conn)
            .await?;
        Ok(count > 0)
    }

    /// Returns the first id in `ids` that is not an active category.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn first_missing<C: ConnectionTrait>(
        &self,
        conn: &C,
        ids: impl IntoIterator<Item = Uuid>,
    ) -> Result<Option<Uuid>, DbErr> {
        for id in ids {
            if !self.exists(conn, id).await? {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Finds a system category by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_system_by_name<C: ConnectionTrait>(
        &self,
        conn: &C,
        name: &str,
    ) -> Result<Option<Uuid>, DbErr> {
        Ok(categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .filter(categories::Column::IsSystem.eq(true))
            .one(conn)
            .await?
            .map(|c| c.id))
    }
}
