//! Installment plans: one purchase split over consecutive months.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::Account;
use super::dates::add_months;
use super::error::LedgerError;
use super::service::TransactionDomainService;
use super::transaction::{NewTransaction, Transaction, validate_amount};
use super::types::{TransactionStatus, TransactionType};

/// Longest plan accepted, thirty years of monthly installments.
pub const MAX_INSTALLMENTS: u32 = 360;

/// Input for splitting a purchase into installments.
#[derive(Debug, Clone)]
pub struct NewInstallmentPlan {
    /// Category ID.
    pub category_id: Uuid,
    /// Debit or credit.
    pub transaction_type: TransactionType,
    /// Total amount of the purchase.
    pub total_amount: Decimal,
    /// Number of installments, 2..=`MAX_INSTALLMENTS`.
    pub count: u32,
    /// Base description; each installment gets an ` (n/count)` suffix.
    pub description: String,
    /// Competence date of the first installment.
    pub first_competence_date: NaiveDate,
    /// Due date of the first installment.
    pub first_due_date: Option<NaiveDate>,
    /// Status of the first installment; later ones are always pending.
    pub first_status: TransactionStatus,
    /// Acting user.
    pub user_id: Uuid,
    /// Idempotency key.
    pub operation_id: Option<String>,
}

/// Outcome of cancelling an installment group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCancellation {
    /// Pending installments that were cancelled.
    pub cancelled: Vec<Uuid>,
    /// Paid installments left untouched.
    pub skipped_paid: Vec<Uuid>,
}

/// Splits amounts in installments and cancels open ones.
pub struct InstallmentDomainService;

impl InstallmentDomainService {
    /// Splits `total` into `count` two-decimal amounts that sum to `total`.
    ///
    /// Every installment but the last is `total / count` rounded to cents;
    /// the last absorbs the remainder.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInstallmentCount` for a count outside
    /// 2..=`MAX_INSTALLMENTS`, `InvalidAmountScale` for a sub-cent total and
    /// `InstallmentAmountTooSmall` when any share is not positive.
    pub fn split_amount(total: Decimal, count: u32) -> Result<Vec<Decimal>, LedgerError> {
        validate_amount(total)?;
        if !(2..=MAX_INSTALLMENTS).contains(&count) {
            return Err(LedgerError::InvalidInstallmentCount(count));
        }

        let base = (total / Decimal::from(count)).round_dp(2);
        let last = total - base * Decimal::from(count - 1);
        if base <= Decimal::ZERO || last <= Decimal::ZERO {
            return Err(LedgerError::InstallmentAmountTooSmall { total, count });
        }

        let mut amounts = vec![base; (count - 1) as usize];
        amounts.push(last);
        Ok(amounts)
    }

    /// Creates every installment of a plan on `account`.
    ///
    /// All installments share one `installment_group_id`. Dates advance one
    /// month per installment from the first dates, clamped to month end.
    /// Only the first installment may be paid, so at most one balance effect
    /// is applied.
    ///
    /// # Errors
    ///
    /// Returns split errors, `CannotCreateCancelled`, `InactiveAccount`, a
    /// date error, or a balance invariant error for a paid first installment.
    pub fn create_installments(
        account: &mut Account,
        plan: NewInstallmentPlan,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let amounts = Self::split_amount(plan.total_amount, plan.count)?;
        if plan.first_status == TransactionStatus::Cancelled {
            return Err(LedgerError::CannotCreateCancelled);
        }
        account.ensure_active()?;

        let group_id = Uuid::new_v4();
        let mut installments = Vec::with_capacity(amounts.len());
        for (offset, amount) in (0u32..).zip(amounts) {
            let number = offset + 1;
            let input = NewTransaction {
                category_id: plan.category_id,
                transaction_type: plan.transaction_type,
                amount,
                description: format!("{} ({number}/{})", plan.description, plan.count),
                competence_date: add_months(plan.first_competence_date, offset)?,
                due_date: plan
                    .first_due_date
                    .map(|due| add_months(due, offset))
                    .transpose()?,
                status: if number == 1 {
                    plan.first_status
                } else {
                    TransactionStatus::Pending
                },
                user_id: plan.user_id,
                operation_id: plan.operation_id.clone(),
            };
            let mut installment = Transaction::draft(account.id, input);
            installment.installment_group_id = Some(group_id);
            installment.installment_number = Some(number);
            installment.total_installments = Some(plan.count);
            installments.push(installment);
        }

        let effect: Decimal = installments.iter().map(Transaction::balance_effect).sum();
        account.apply_delta(effect)?;
        Ok(installments)
    }

    /// Cancels the pending members of an installment group.
    ///
    /// Paid members are reported in `skipped_paid` and left as they are.
    /// Members already cancelled or superseded by an adjustment are ignored.
    ///
    /// # Errors
    ///
    /// Returns `InstallmentGroupNotFound` for an empty slice and
    /// `AccountMismatch` if a member belongs to another account.
    pub fn cancel_group(
        account: &mut Account,
        members: &mut [Transaction],
        reason: Option<&str>,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<GroupCancellation, LedgerError> {
        let group_id = members
            .first()
            .and_then(|tx| tx.installment_group_id)
            .ok_or(LedgerError::InstallmentGroupNotFound(Uuid::nil()))?;
        for member in members.iter() {
            member.ensure_belongs_to(account.id)?;
            if member.installment_group_id != Some(group_id) {
                return Err(LedgerError::InstallmentGroupNotFound(group_id));
            }
        }

        let mut outcome = GroupCancellation::default();
        for member in members.iter_mut() {
            if member.status.is_terminal() || member.has_adjustment {
                continue;
            }
            match member.status {
                TransactionStatus::Pending => {
                    TransactionDomainService::reverse_and_cancel(
                        account,
                        member,
                        reason.map(str::to_owned),
                        user_id,
                        now,
                    )?;
                    outcome.cancelled.push(member.id);
                }
                TransactionStatus::Paid => outcome.skipped_paid.push(member.id),
                TransactionStatus::Cancelled => {}
            }
        }
        Ok(outcome)
    }
}
