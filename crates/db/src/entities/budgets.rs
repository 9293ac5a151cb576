//! `SeaORM` Entity for budgets table.

use std::collections::BTreeSet;

use caixa_core::budget::{Budget, YearMonth};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub percentage: Decimal,
    pub reference_year: i32,
    pub reference_month: i16,
    pub is_recurrent: bool,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budget_categories::Entity")]
    BudgetCategories,
}

impl Related<super::budget_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Builds the domain budget from the row and its category links.
    #[must_use]
    pub fn into_budget(self, category_ids: BTreeSet<Uuid>) -> Budget {
        Budget {
            id: self.id,
            name: self.name,
            percentage: self.percentage,
            reference: YearMonth::new(
                self.reference_year,
                u32::from(self.reference_month.unsigned_abs()),
            ),
            category_ids,
            is_recurrent: self.is_recurrent,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

impl From<&Budget> for ActiveModel {
    fn from(budget: &Budget) -> Self {
        Self {
            id: Set(budget.id),
            name: Set(budget.name.clone()),
            percentage: Set(budget.percentage),
            reference_year: Set(budget.reference.year),
            // Month is validated to 1..=12 before persisting.
            reference_month: Set(i16::try_from(budget.reference.month).unwrap_or(12)),
            is_recurrent: Set(budget.is_recurrent),
            created_by: Set(budget.created_by),
            created_at: Set(budget.created_at),
            updated_at: Set(chrono::Utc::now()),
        }
    }
}
