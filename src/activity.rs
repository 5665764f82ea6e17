//! Board activity log writer
//!
//! Logging is fire-and-forget: a failed write is reported through `tracing`
//! and never fails the mutation that produced it.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::store::{to_document, DocumentStore, ACTIVITY_LOG};
use crate::types::{BoardId, PrincipalId};

/// One activity log record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub board_id: BoardId,
    pub actor_id: PrincipalId,
    /// e.g. `card_moved`, `comment_added`
    pub action: String,
    pub target_id: String,
    /// `card`, `column` or `comment`
    pub target_type: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl ActivityEntry {
    pub fn new(
        board_id: impl Into<BoardId>,
        actor_id: impl Into<PrincipalId>,
        action: impl Into<String>,
        target_type: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            board_id: board_id.into(),
            actor_id: actor_id.into(),
            action: action.into(),
            target_id: target_id.into(),
            target_type: target_type.into(),
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Sink for activity entries
pub trait ActivityLogger: Send + Sync {
    fn log(&self, entry: ActivityEntry);
}

/// Writes entries to the `activityLog` collection
pub struct StoreActivityLogger {
    store: Arc<dyn DocumentStore>,
}

impl StoreActivityLogger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn write(&self, entry: &ActivityEntry) -> Result<(), crate::store::StoreError> {
        let mut doc = to_document(entry)?;
        if let Some(fields) = doc.as_object_mut() {
            fields.insert("_id".to_string(), Value::from(uuid::Uuid::new_v4().to_string()));
            fields.insert("timestamp".to_string(), Value::from(Utc::now().to_rfc3339()));
        }
        self.store.insert(ACTIVITY_LOG, doc)?;
        Ok(())
    }
}

impl ActivityLogger for StoreActivityLogger {
    fn log(&self, entry: ActivityEntry) {
        match self.write(&entry) {
            Ok(()) => tracing::debug!(
                "[Activity] {} {} {} on board {}",
                entry.actor_id,
                entry.action,
                entry.target_id,
                entry.board_id
            ),
            Err(e) => tracing::warn!("[Activity] Failed to log {}: {}", entry.action, e),
        }
    }
}
