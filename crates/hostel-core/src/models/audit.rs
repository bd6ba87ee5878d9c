//! Audit event payload
//!
//! Carried to the best-effort `AuditSink` collaborator. Persistence is an
//! external concern; the engine only shapes the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One auditable action taken against a billing entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Action label, e.g. "payment", "checkout", "use_security_deposit"
    pub action: String,

    /// Entity type label, e.g. "Student", "Payment"
    pub entity_type: String,

    /// Entity identifier
    pub entity_id: String,

    /// Actor who triggered the action
    pub actor_id: Option<Uuid>,

    /// Entity snapshot before the action
    pub before: Option<Value>,

    /// Entity snapshot after the action
    pub after: Option<Value>,

    /// Free-form note
    pub note: Option<String>,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        actor_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            actor_id,
            before: None,
            after: None,
            note: None,
            timestamp: now,
        }
    }

    pub fn with_after(mut self, after: Value) -> Self {
        self.after = Some(after);
        self
    }

    pub fn with_before(mut self, before: Value) -> Self {
        self.before = Some(before);
        self
    }
}
