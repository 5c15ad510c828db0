use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One immutable before/after record of an entity mutation.
///
/// The audit log is write-only and append-only; no update, redaction or
/// deletion path exists. It is the system's source of truth for what
/// happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: String,
    pub actor_id: String,
    pub old_value: Option<Value>,
    pub new_value: Value,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
