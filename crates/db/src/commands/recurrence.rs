use caixa_core::ledger::{
    AuditAction, AuditEntityType, AuditEntry, LedgerError, NewRecurrenceTemplate,
    RecurrenceDomainService, RecurrenceTemplate, Transaction,
};
use chrono::NaiveDate;
use sea_orm::DatabaseTransaction;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::LedgerCommands;
use crate::error::{CommandError, CommandResult};

/// Outcome of one recurrence generation run.
#[derive(Debug, Default)]
pub struct RecurrenceRun {
    /// Transactions generated, one per template at most.
    pub generated: Vec<Transaction>,
    /// Templates whose occurrence could not be generated, with the reason.
    /// They are retried on the next run.
    pub failed: Vec<(Uuid, CommandError)>,
}

impl LedgerCommands {
    /// Registers a recurrence template.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `AccountNotFound` or `CategoryNotFound`.
    pub async fn create_recurrence_template(
        &self,
        input: NewRecurrenceTemplate,
    ) -> CommandResult<RecurrenceTemplate> {
        let template = RecurrenceTemplate::new(input)?;

        let uow = self.begin().await?;
        let result = self.insert_template(uow.txn(), &template).await;
        self.finish(uow, "create_recurrence_template", result).await?;

        info!(
            template_id = %template.id,
            day = template.day_of_month,
            "recurrence template created"
        );
        self.audit([AuditEntry::created(
            AuditEntityType::RecurrenceTemplate,
            template.id,
            template.created_by,
        )])
        .await;
        Ok(template)
    }

    async fn insert_template(
        &self,
        txn: &DatabaseTransaction,
        template: &RecurrenceTemplate,
    ) -> CommandResult<()> {
        if self.accounts.find_by_id(template.account_id).await?.is_none() {
            return Err(LedgerError::AccountNotFound(template.account_id).into());
        }
        self.ensure_category(txn, template.category_id).await?;
        self.recurrences.insert(txn, template).await?;
        Ok(())
    }

    /// Stops a template from generating further transactions.
    ///
    /// # Errors
    ///
    /// Returns `RecurrenceTemplateNotFound` or a lock timeout.
    pub async fn deactivate_recurrence_template(
        &self,
        template_id: Uuid,
        user_id: Uuid,
    ) -> CommandResult<RecurrenceTemplate> {
        let uow = self.begin().await?;
        let result = self.deactivate_template_in(uow.txn(), template_id).await;
        let (template, previous) = self
            .finish(uow, "deactivate_recurrence_template", result)
            .await?;

        info!(%template_id, "recurrence template deactivated");
        self.audit([AuditEntry::changed(
            AuditEntityType::RecurrenceTemplate,
            template_id,
            AuditAction::Updated,
            user_id,
            &previous,
        )])
        .await;
        Ok(template)
    }

    async fn deactivate_template_in(
        &self,
        txn: &DatabaseTransaction,
        template_id: Uuid,
    ) -> CommandResult<(RecurrenceTemplate, RecurrenceTemplate)> {
        let mut template = self
            .recurrences
            .get_for_exclusive_mutation(txn, template_id)
            .await?;
        let previous = template.clone();
        template.deactivate();
        self.recurrences.save(txn, &template).await?;
        Ok((template, previous))
    }

    /// Reads a recurrence template.
    ///
    /// # Errors
    ///
    /// Returns `RecurrenceTemplateNotFound` or a database error.
    pub async fn get_recurrence_template(
        &self,
        template_id: Uuid,
    ) -> CommandResult<RecurrenceTemplate> {
        self.recurrences
            .find_by_id(template_id)
            .await?
            .ok_or_else(|| LedgerError::RecurrenceTemplateNotFound(template_id).into())
    }

    /// Generates the occurrences owed by every active template as of `as_of`.
    ///
    /// Each template runs in its own unit of work, so one failure does not
    /// block the others.
    ///
    /// # Errors
    ///
    /// Returns an error only if the templates cannot be listed.
    pub async fn generate_recurring_transactions(
        &self,
        as_of: NaiveDate,
    ) -> CommandResult<RecurrenceRun> {
        let mut run = RecurrenceRun::default();
        for (template_id, account_id) in self.recurrences.active().await? {
            match self.generate_one(template_id, account_id, as_of).await {
                Ok(Some(tx)) => run.generated.push(tx),
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        %template_id,
                        code = err.error_code(),
                        error = %err,
                        "recurrence generation failed"
                    );
                    run.failed.push((template_id, err));
                }
            }
        }
        info!(
            %as_of,
            generated = run.generated.len(),
            failed = run.failed.len(),
            "recurrence run finished"
        );
        Ok(run)
    }

    async fn generate_one(
        &self,
        template_id: Uuid,
        account_id: Uuid,
        as_of: NaiveDate,
    ) -> CommandResult<Option<Transaction>> {
        let uow = self.begin().await?;
        let result = self
            .generate_one_in(uow.txn(), template_id, account_id, as_of)
            .await;
        let generated = self.finish(uow, "generate_recurring_transaction", result).await?;

        match &generated {
            Some(tx) => {
                debug!(
                    %template_id,
                    transaction_id = %tx.id,
                    date = %tx.competence_date,
                    "occurrence generated"
                );
                self.audit([AuditEntry::created(
                    AuditEntityType::Transaction,
                    tx.id,
                    tx.created_by,
                )])
                .await;
            }
            None => debug!(%template_id, "nothing due"),
        }
        Ok(generated)
    }

    async fn generate_one_in(
        &self,
        txn: &DatabaseTransaction,
        template_id: Uuid,
        account_id: Uuid,
        as_of: NaiveDate,
    ) -> CommandResult<Option<Transaction>> {
        let mut account = self.accounts.get_for_exclusive_mutation(txn, account_id).await?;
        let mut template = self
            .recurrences
            .get_for_exclusive_mutation(txn, template_id)
            .await?;

        let Some(tx) =
            RecurrenceDomainService::generate_for_account(&mut template, &mut account, as_of)?
        else {
            return Ok(None);
        };

        self.transactions.insert(txn, &tx).await?;
        if tx.affects_balance() {
            self.accounts.save(txn, &account).await?;
        }
        self.recurrences.save(txn, &template).await?;
        Ok(Some(tx))
    }
}
