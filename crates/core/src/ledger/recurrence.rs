//! Recurring transactions generated once per calendar month.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::Account;
use super::dates::{clamped_date, first_day_of_month};
use super::error::LedgerError;
use super::service::TransactionDomainService;
use super::transaction::{NewTransaction, Transaction, validate_amount};
use super::types::{TransactionStatus, TransactionType};

/// Template for a monthly recurring transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceTemplate {
    /// Template ID.
    pub id: Uuid,
    /// Account the occurrences are posted to.
    pub account_id: Uuid,
    /// Category ID.
    pub category_id: Uuid,
    /// Debit or credit.
    pub transaction_type: TransactionType,
    /// Amount of each occurrence.
    pub amount: Decimal,
    /// Description of each occurrence.
    pub description: String,
    /// Day of month (1..=31), clamped to the month length.
    pub day_of_month: u32,
    /// Inactive templates generate nothing.
    pub is_active: bool,
    /// Date of the latest generated occurrence.
    pub last_generated_date: Option<NaiveDate>,
    /// Status given to generated transactions.
    pub default_status: TransactionStatus,
    /// Creating user.
    pub created_by: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a recurrence template.
#[derive(Debug, Clone)]
pub struct NewRecurrenceTemplate {
    /// Account the occurrences are posted to.
    pub account_id: Uuid,
    /// Category ID.
    pub category_id: Uuid,
    /// Debit or credit.
    pub transaction_type: TransactionType,
    /// Amount of each occurrence.
    pub amount: Decimal,
    /// Description of each occurrence.
    pub description: String,
    /// Day of month (1..=31).
    pub day_of_month: u32,
    /// Paid or pending.
    pub default_status: TransactionStatus,
    /// Creating user.
    pub user_id: Uuid,
}

impl RecurrenceTemplate {
    /// Creates an active template that has never generated anything.
    ///
    /// # Errors
    ///
    /// Returns an amount error, `InvalidDayOfMonth` or
    /// `CannotCreateCancelled`.
    pub fn new(input: NewRecurrenceTemplate) -> Result<Self, LedgerError> {
        validate_amount(input.amount)?;
        if !(1..=31).contains(&input.day_of_month) {
            return Err(LedgerError::InvalidDayOfMonth(input.day_of_month));
        }
        if input.default_status == TransactionStatus::Cancelled {
            return Err(LedgerError::CannotCreateCancelled);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            account_id: input.account_id,
            category_id: input.category_id,
            transaction_type: input.transaction_type,
            amount: input.amount,
            description: input.description,
            day_of_month: input.day_of_month,
            is_active: true,
            last_generated_date: None,
            default_status: input.default_status,
            created_by: input.user_id,
            created_at: Utc::now(),
        })
    }

    /// Stops future generation.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Returns the occurrence date due as of `as_of`, if one is owed.
    ///
    /// The occurrence falls on `day_of_month` of the month of `as_of`. It is
    /// owed once `as_of` reaches it, unless something was already generated
    /// in that month.
    pub fn due_occurrence(&self, as_of: NaiveDate) -> Result<Option<NaiveDate>, LedgerError> {
        if !self.is_active {
            return Ok(None);
        }
        let occurrence = clamped_date(as_of.year(), as_of.month(), self.day_of_month)?;
        let period_start = first_day_of_month(as_of.year(), as_of.month())?;

        let already_generated = self
            .last_generated_date
            .is_some_and(|last| last >= period_start);
        if as_of < occurrence || already_generated {
            return Ok(None);
        }
        Ok(Some(occurrence))
    }

    fn occurrence_transaction(&self, occurrence: NaiveDate) -> NewTransaction {
        NewTransaction {
            category_id: self.category_id,
            transaction_type: self.transaction_type,
            amount: self.amount,
            description: self.description.clone(),
            competence_date: occurrence,
            due_date: Some(occurrence),
            status: self.default_status,
            user_id: self.created_by,
            operation_id: None,
        }
    }
}

/// Produces the transactions owed by recurrence templates.
pub struct RecurrenceDomainService;

impl RecurrenceDomainService {
    /// Returns one transaction per active template owed as of `as_of`.
    ///
    /// Each producing template has `last_generated_date` advanced to the
    /// occurrence, so a second call for the same month returns nothing.
    /// Balance effects are not applied; use
    /// [`RecurrenceDomainService::generate_for_account`] for that.
    ///
    /// # Errors
    ///
    /// Returns a date error for a corrupt template.
    pub fn generate_due_transactions(
        templates: &mut [RecurrenceTemplate],
        as_of: NaiveDate,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let mut generated = Vec::new();
        for template in templates.iter_mut() {
            if let Some(occurrence) = template.due_occurrence(as_of)? {
                let input = template.occurrence_transaction(occurrence);
                let mut transaction = Transaction::draft(template.account_id, input);
                transaction.recurrence_template_id = Some(template.id);
                template.last_generated_date = Some(occurrence);
                generated.push(transaction);
            }
        }
        Ok(generated)
    }

    /// Generates the occurrence owed by one template on its locked account.
    ///
    /// Goes through [`TransactionDomainService::create_transaction`], so a
    /// paid occurrence moves the balance and is subject to the same
    /// invariants. On error the template is not advanced.
    ///
    /// # Errors
    ///
    /// Returns `AccountMismatch`, `InactiveAccount`, a balance invariant
    /// error, or a date error.
    pub fn generate_for_account(
        template: &mut RecurrenceTemplate,
        account: &mut Account,
        as_of: NaiveDate,
    ) -> Result<Option<Transaction>, LedgerError> {
        if template.account_id != account.id {
            return Err(LedgerError::AccountMismatch {
                transaction_id: template.id,
                account_id: account.id,
            });
        }
        let Some(occurrence) = template.due_occurrence(as_of)? else {
            return Ok(None);
        };

        let mut transaction = TransactionDomainService::create_transaction(
            account,
            template.occurrence_transaction(occurrence),
        )?;
        transaction.recurrence_template_id = Some(template.id);
        template.last_generated_date = Some(occurrence);
        Ok(Some(transaction))
    }
}
