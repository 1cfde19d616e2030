use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLog {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub changes: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

/// What a lifecycle operation reports to the audit sink after commit.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub changes: Option<JsonValue>,
}

impl AuditEvent {
    pub fn application(actor_id: Option<Uuid>, action: &str, entity_id: Uuid) -> Self {
        Self {
            actor_id,
            action: action.to_string(),
            entity_type: "application".to_string(),
            entity_id,
            changes: None,
        }
    }

    pub fn with_changes(mut self, changes: JsonValue) -> Self {
        self.changes = Some(changes);
        self
    }
}
