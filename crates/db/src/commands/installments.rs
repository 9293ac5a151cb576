use caixa_core::ledger::{
    AuditAction, AuditEntityType, AuditEntry, GroupCancellation, InstallmentDomainService,
    LedgerError, NewInstallmentPlan, OperationType, Transaction,
};
use chrono::Utc;
use sea_orm::DatabaseTransaction;
use tracing::info;
use uuid::Uuid;

use super::LedgerCommands;
use crate::error::CommandResult;

impl LedgerCommands {
    /// Splits a purchase into monthly installments in one unit of work.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInstallmentCount`, `InstallmentAmountTooSmall`, a
    /// balance rule violation for a paid first installment, or a lock timeout.
    pub async fn create_installments(
        &self,
        account_id: Uuid,
        plan: NewInstallmentPlan,
    ) -> CommandResult<Vec<Transaction>> {
        let uow = self.begin().await?;
        let result = self.create_installments_in(uow.txn(), account_id, plan).await;
        let installments = self.finish(uow, "create_installments", result).await?;

        if let Some(first) = installments.first() {
            info!(
                %account_id,
                group_id = ?first.installment_group_id,
                count = installments.len(),
                "installments created"
            );
        }
        self.audit(installments.iter().map(|tx| {
            AuditEntry::created(AuditEntityType::Transaction, tx.id, tx.created_by)
        }))
        .await;
        Ok(installments)
    }

    async fn create_installments_in(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        plan: NewInstallmentPlan,
    ) -> CommandResult<Vec<Transaction>> {
        let operation_id = plan.operation_id.clone();
        self.ensure_new_operation(txn, operation_id.as_deref()).await?;
        self.ensure_category(txn, plan.category_id).await?;

        let mut account = self.accounts.get_for_exclusive_mutation(txn, account_id).await?;
        let installments = InstallmentDomainService::create_installments(&mut account, plan)?;

        self.transactions.insert_many(txn, &installments).await?;
        self.accounts.save(txn, &account).await?;
        self.record_operation(
            txn,
            operation_id.as_deref(),
            OperationType::CreateInstallments,
            installments.first().and_then(|tx| tx.installment_group_id),
            &installments,
        )
        .await?;
        Ok(installments)
    }

    /// Cancels the pending installments of a group.
    ///
    /// Paid installments are left alone and reported in `skipped_paid`.
    ///
    /// # Errors
    ///
    /// Returns `InstallmentGroupNotFound` or a lock timeout.
    pub async fn cancel_installment_group(
        &self,
        group_id: Uuid,
        reason: Option<String>,
        user_id: Uuid,
        operation_id: Option<String>,
    ) -> CommandResult<GroupCancellation> {
        let uow = self.begin().await?;
        let result = self
            .cancel_group_in(
                uow.txn(),
                group_id,
                reason.as_deref(),
                user_id,
                operation_id.as_deref(),
            )
            .await;
        let (outcome, previous) = self.finish(uow, "cancel_installment_group", result).await?;

        info!(
            %group_id,
            cancelled = outcome.cancelled.len(),
            skipped_paid = outcome.skipped_paid.len(),
            "installment group cancelled"
        );
        self.audit(
            previous
                .iter()
                .filter(|tx| outcome.cancelled.contains(&tx.id))
                .map(|tx| {
                    AuditEntry::changed(
                        AuditEntityType::Transaction,
                        tx.id,
                        AuditAction::Cancelled,
                        user_id,
                        tx,
                    )
                })
                .collect::<Vec<_>>(),
        )
        .await;
        Ok(outcome)
    }

    async fn cancel_group_in(
        &self,
        txn: &DatabaseTransaction,
        group_id: Uuid,
        reason: Option<&str>,
        user_id: Uuid,
        operation_id: Option<&str>,
    ) -> CommandResult<(GroupCancellation, Vec<Transaction>)> {
        self.ensure_new_operation(txn, operation_id).await?;
        let account_id = self
            .transactions
            .find_by_installment_group(group_id)
            .await?
            .first()
            .map(|tx| tx.account_id)
            .ok_or(LedgerError::InstallmentGroupNotFound(group_id))?;

        let mut account = self.accounts.get_for_exclusive_mutation(txn, account_id).await?;
        let mut members = self.transactions.lock_installment_group(txn, group_id).await?;
        let previous = members.clone();

        let outcome = InstallmentDomainService::cancel_group(
            &mut account,
            &mut members,
            reason,
            user_id,
            Utc::now(),
        )?;

        for member in members.iter().filter(|tx| outcome.cancelled.contains(&tx.id)) {
            self.transactions.save_state(txn, member).await?;
        }
        self.record_operation(
            txn,
            operation_id,
            OperationType::CancelInstallmentGroup,
            Some(group_id),
            &outcome,
        )
        .await?;
        Ok((outcome, previous))
    }
}
