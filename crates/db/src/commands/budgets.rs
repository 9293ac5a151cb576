use caixa_core::budget::{
    Allocation, Budget, BudgetError, BudgetService, CreateBudgetInput, UpdateBudgetInput,
    YearMonth,
};
use caixa_core::ledger::{AuditAction, AuditEntityType, AuditEntry, OperationType};
use sea_orm::DatabaseTransaction;
use tracing::info;
use uuid::Uuid;

use super::LedgerCommands;
use crate::error::CommandResult;

impl LedgerCommands {
    /// Creates a budget after checking it against every other budget.
    ///
    /// # Errors
    ///
    /// Returns a field validation error, `CategoryNotFound`,
    /// `PercentageExceeded`, `CategoryAlreadyBudgeted`, or
    /// `DuplicateOperation`.
    pub async fn create_budget(
        &self,
        input: CreateBudgetInput,
        user_id: Uuid,
        operation_id: Option<String>,
    ) -> CommandResult<Budget> {
        let uow = self.begin().await?;
        let result = self
            .create_budget_in(uow.txn(), input, user_id, operation_id.as_deref())
            .await;
        let budget = self.finish(uow, "create_budget", result).await?;

        info!(
            budget_id = %budget.id,
            reference = %budget.reference,
            percentage = %budget.percentage,
            "budget created"
        );
        self.audit([AuditEntry::created(
            AuditEntityType::Budget,
            budget.id,
            user_id,
        )])
        .await;
        Ok(budget)
    }

    async fn create_budget_in(
        &self,
        txn: &DatabaseTransaction,
        input: CreateBudgetInput,
        user_id: Uuid,
        operation_id: Option<&str>,
    ) -> CommandResult<Budget> {
        self.ensure_new_operation(txn, operation_id).await?;
        let budget = BudgetService::build(input, user_id)?;
        self.budgets.lock_allocation(txn).await?;
        self.check_allocation(txn, &budget).await?;

        self.budgets.insert(txn, &budget).await?;
        self.record_operation(
            txn,
            operation_id,
            OperationType::CreateBudget,
            Some(budget.id),
            &budget,
        )
        .await?;
        Ok(budget)
    }

    /// Updates a budget; it is checked as if it were new, excluding itself.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or any error of [`LedgerCommands::create_budget`].
    pub async fn update_budget(
        &self,
        budget_id: Uuid,
        input: UpdateBudgetInput,
        user_id: Uuid,
        operation_id: Option<String>,
    ) -> CommandResult<Budget> {
        let uow = self.begin().await?;
        let result = self
            .update_budget_in(uow.txn(), budget_id, input, operation_id.as_deref())
            .await;
        let (budget, previous) = self.finish(uow, "update_budget", result).await?;

        info!(%budget_id, percentage = %budget.percentage, "budget updated");
        self.audit([AuditEntry::changed(
            AuditEntityType::Budget,
            budget_id,
            AuditAction::Updated,
            user_id,
            &previous,
        )])
        .await;
        Ok(budget)
    }

    async fn update_budget_in(
        &self,
        txn: &DatabaseTransaction,
        budget_id: Uuid,
        input: UpdateBudgetInput,
        operation_id: Option<&str>,
    ) -> CommandResult<(Budget, Budget)> {
        self.ensure_new_operation(txn, operation_id).await?;
        self.budgets.lock_allocation(txn).await?;
        let previous = self
            .budgets
            .find_by_id(txn, budget_id)
            .await?
            .ok_or(BudgetError::NotFound(budget_id))?;
        let budget = BudgetService::apply_update(&previous, input);
        self.check_allocation(txn, &budget).await?;

        self.budgets.update(txn, &budget).await?;
        self.record_operation(
            txn,
            operation_id,
            OperationType::UpdateBudget,
            Some(budget.id),
            &budget,
        )
        .await?;
        Ok((budget, previous))
    }

    /// Validates `budget` against the rest; the allocation lock must be held.
    async fn check_allocation(
        &self,
        txn: &DatabaseTransaction,
        budget: &Budget,
    ) -> CommandResult<()> {
        if let Some(missing) = self
            .categories
            .first_missing(txn, budget.category_ids.iter().copied())
            .await?
        {
            return Err(BudgetError::CategoryNotFound(missing).into());
        }
        let existing = self.budgets.list_all(txn).await?;
        BudgetService::validate_budget(budget, &existing)?;
        Ok(())
    }

    /// Percentage allocation of one month.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn available_percentage(&self, period: YearMonth) -> CommandResult<Allocation> {
        let budgets = self.budgets.list().await?;
        Ok(BudgetService::get_available_percentage(&budgets, period, None))
    }
}
