//! Idempotency records for client-retried commands.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of command recorded in the operation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Single transaction created.
    CreateTransaction,
    /// Pending transaction settled.
    SettleTransaction,
    /// Transaction replaced by an adjustment.
    AdjustTransaction,
    /// Transaction cancelled.
    CancelTransaction,
    /// Installment plan created.
    CreateInstallments,
    /// Pending installments of a group cancelled.
    CancelInstallmentGroup,
    /// Transfer created.
    CreateTransfer,
    /// Transfer cancelled.
    CancelTransfer,
    /// Credit-card invoice paid.
    PayInvoice,
    /// Receipt imported as a paid debit.
    ImportReceipt,
    /// Budget created.
    CreateBudget,
    /// Budget updated.
    UpdateBudget,
}

impl OperationType {
    /// Returns the persisted name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTransaction => "create_transaction",
            Self::SettleTransaction => "settle_transaction",
            Self::AdjustTransaction => "adjust_transaction",
            Self::CancelTransaction => "cancel_transaction",
            Self::CreateInstallments => "create_installments",
            Self::CancelInstallmentGroup => "cancel_installment_group",
            Self::CreateTransfer => "create_transfer",
            Self::CancelTransfer => "cancel_transfer",
            Self::PayInvoice => "pay_invoice",
            Self::ImportReceipt => "import_receipt",
            Self::CreateBudget => "create_budget",
            Self::UpdateBudget => "update_budget",
        }
    }

    /// Parses a persisted name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        [
            Self::CreateTransaction,
            Self::SettleTransaction,
            Self::AdjustTransaction,
            Self::CancelTransaction,
            Self::CreateInstallments,
            Self::CancelInstallmentGroup,
            Self::CreateTransfer,
            Self::CancelTransfer,
            Self::PayInvoice,
            Self::ImportReceipt,
            Self::CreateBudget,
            Self::UpdateBudget,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == value)
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of an applied command, keyed by its operation ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Caller-supplied idempotency key.
    pub operation_id: String,
    /// Kind of command.
    pub operation_type: OperationType,
    /// Main entity produced by the command.
    pub result_entity_id: Option<Uuid>,
    /// Serialized command result.
    pub result_payload: serde_json::Value,
    /// When the command committed.
    pub created_at: DateTime<Utc>,
    /// When the record may be purged.
    pub expires_at: DateTime<Utc>,
}

impl OperationRecord {
    /// Builds a record that expires `retention` after `now`.
    #[must_use]
    pub fn new(
        operation_id: impl Into<String>,
        operation_type: OperationType,
        result_entity_id: Option<Uuid>,
        result_payload: serde_json::Value,
        now: DateTime<Utc>,
        retention: Duration,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            operation_type,
            result_entity_id,
            result_payload,
            created_at: now,
            expires_at: now + retention,
        }
    }

    /// Returns true once the retention window has elapsed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
