//! Budget repository.
//!
//! Budget allocation is checked against every other budget, so writers
//! serialize on a transaction-scoped advisory lock instead of row locks.

use std::collections::{BTreeSet, HashMap};

use caixa_core::budget::Budget;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, Statement,
};
use uuid::Uuid;

use crate::entities::{budget_categories, budgets};

/// Advisory lock key guarding budget allocation ("CAIXABDG").
const BUDGET_ALLOCATION_LOCK: i64 = 0x4341_4958_4142_4447;

/// Budget repository.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Serializes budget writers until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be acquired in time.
    pub async fn lock_allocation(&self, txn: &DatabaseTransaction) -> Result<(), DbErr> {
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT pg_advisory_xact_lock($1)",
            [BUDGET_ALLOCATION_LOCK.into()],
        ))
        .await?;
        Ok(())
    }

    /// Loads every budget with its categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_all<C: ConnectionTrait>(&self, conn: &C) -> Result<Vec<Budget>, DbErr> {
        let rows = budgets::Entity::find()
            .order_by_asc(budgets::Column::ReferenceYear)
            .order_by_asc(budgets::Column::ReferenceMonth)
            .all(conn)
            .await?;

        let mut links: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
        for link in budget_categories::Entity::find().all(conn).await? {
            links
                .entry(link.budget_id)
                .or_default()
                .insert(link.category_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let categories = links.remove(&row.id).unwrap_or_default();
                row.into_budget(categories)
            })
            .collect())
    }

    /// Loads every budget outside a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<Budget>, DbErr> {
        self.list_all(&self.db).await
    }

    /// Finds one budget with its categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<Budget>, DbErr> {
        let Some(row) = budgets::Entity::find_by_id(id).one(conn).await? else {
            return Ok(None);
        };
        let categories = budget_categories::Entity::find()
            .filter(budget_categories::Column::BudgetId.eq(id))
            .all(conn)
            .await?
            .into_iter()
            .map(|link| link.category_id)
            .collect();
        Ok(Some(row.into_budget(categories)))
    }

    /// Inserts a budget and its category links.
    ///
    /// # Errors
    ///
    /// Returns an error if an insert fails.
    pub async fn insert(&self, txn: &DatabaseTransaction, budget: &Budget) -> Result<(), DbErr> {
        budgets::ActiveModel::from(budget).insert(txn).await?;
        Self::insert_links(txn, budget).await
    }

    /// Replaces a budget's fields and category links.
    ///
    /// # Errors
    ///
    /// Returns an error if a statement fails.
    pub async fn update(&self, txn: &DatabaseTransaction, budget: &Budget) -> Result<(), DbErr> {
        let mut model = budgets::ActiveModel::from(budget);
        model.created_at = sea_orm::ActiveValue::NotSet;
        model.update(txn).await?;

        budget_categories::Entity::delete_many()
            .filter(budget_categories::Column::BudgetId.eq(budget.id))
            .exec(txn)
            .await?;
        Self::insert_links(txn, budget).await
    }

    async fn insert_links(txn: &DatabaseTransaction, budget: &Budget) -> Result<(), DbErr> {
        if budget.category_ids.is_empty() {
            return Ok(());
        }
        let links = budget
            .category_ids
            .iter()
            .map(|category_id| budget_categories::ActiveModel {
                budget_id: Set(budget.id),
                category_id: Set(*category_id),
            });
        budget_categories::Entity::insert_many(links)
            .exec(txn)
            .await?;
        Ok(())
    }
}
