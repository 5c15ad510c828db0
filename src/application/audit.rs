use crate::domain::audit::AuditLogEntry;
use crate::domain::ports::AuditLogStoreRef;
use crate::error::Result;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

/// Appends an immutable before/after record for every entity mutation.
#[derive(Clone)]
pub struct AuditRecorder {
    store: AuditLogStoreRef,
}

impl AuditRecorder {
    pub fn new(store: AuditLogStoreRef) -> Self {
        Self { store }
    }

    pub async fn record<T: Serialize>(
        &self,
        entity_type: &str,
        entity_id: Uuid,
        action: &str,
        actor_id: &str,
        old_value: Option<&T>,
        new_value: &T,
        notes: Option<String>,
    ) -> Result<()> {
        let old_value = match old_value {
            Some(value) => Some(serde_json::to_value(value)?),
            None => None,
        };
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            entity_type: entity_type.to_string(),
            entity_id,
            action: action.to_string(),
            actor_id: actor_id.to_string(),
            old_value,
            new_value: serde_json::to_value(new_value)?,
            notes,
            recorded_at: Utc::now(),
        };
        self.store.append(entry).await
    }

    /// Entries for one entity, newest first.
    pub async fn entries_for(&self, entity_id: Uuid) -> Result<Vec<AuditLogEntry>> {
        self.store.list_for_entity(entity_id).await
    }
}
