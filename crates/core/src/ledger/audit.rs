//! Audit trail entries written after a command commits.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of entity an audit entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntityType {
    /// An account.
    Account,
    /// A transaction.
    Transaction,
    /// A recurrence template.
    RecurrenceTemplate,
    /// A budget.
    Budget,
}

impl AuditEntityType {
    /// Returns the persisted name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Transaction => "transaction",
            Self::RecurrenceTemplate => "recurrence_template",
            Self::Budget => "budget",
        }
    }
}

/// What happened to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Entity created.
    Created,
    /// Entity attributes changed.
    Updated,
    /// Pending transaction settled.
    Settled,
    /// Transaction superseded by an adjustment.
    Adjusted,
    /// Transaction cancelled.
    Cancelled,
}

impl AuditAction {
    /// Returns the persisted name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Settled => "settled",
            Self::Adjusted => "adjusted",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Kind of entity.
    pub entity_type: AuditEntityType,
    /// Entity ID.
    pub entity_id: Uuid,
    /// What happened.
    pub action: AuditAction,
    /// Acting user.
    pub user_id: Uuid,
    /// Snapshot of the entity before the change.
    pub previous_data: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Entry for a newly created entity.
    #[must_use]
    pub const fn created(entity_type: AuditEntityType, entity_id: Uuid, user_id: Uuid) -> Self {
        Self {
            entity_type,
            entity_id,
            action: AuditAction::Created,
            user_id,
            previous_data: None,
        }
    }

    /// Entry for a change, with a snapshot of the entity before it.
    ///
    /// A snapshot that fails to serialize is dropped.
    pub fn changed<T: Serialize>(
        entity_type: AuditEntityType,
        entity_id: Uuid,
        action: AuditAction,
        user_id: Uuid,
        previous: &T,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            action,
            user_id,
            previous_data: serde_json::to_value(previous).ok(),
        }
    }
}
