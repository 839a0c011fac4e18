// Append-only audit trail of gateway decisions.
//
// Entries are hash-chained so after-the-fact edits are detectable.
// Recording never fails and never blocks on the backend: the request
// path must not change because the audit subsystem had a bad day.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::{Mutex, PoisonError};

/// How the gateway disposed of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Forwarded to the backend and the backend succeeded.
    Accepted,
    /// Rejected before the backend: unknown tool or bad arguments.
    ValidationRejected,
    /// Rejected before the backend: window cap exceeded.
    RateLimited,
    /// Forwarded to the backend and the backend failed.
    BackendFailed,
}

/// One immutable record of a gateway decision.
///
/// `detail` may hold raw internal error text; it stays in the audit
/// trail and is never echoed to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub client_key: String,
    pub tool_name: String,
    pub outcome: AuditOutcome,
    pub detail: Option<String>,
    /// Hash of the previous entry, chaining the log.
    pub previous_hash: Option<String>,
    /// Hash of this entry's content.
    pub entry_hash: String,
}

impl AuditEvent {
    fn new(
        client_key: String,
        tool_name: String,
        outcome: AuditOutcome,
        detail: Option<String>,
        previous_hash: Option<String>,
    ) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let timestamp = Utc::now();
        let entry_hash = Self::calculate_hash(
            &id,
            &timestamp,
            &client_key,
            &tool_name,
            outcome,
            detail.as_deref(),
            previous_hash.as_deref(),
        );

        Self {
            id,
            timestamp,
            client_key,
            tool_name,
            outcome,
            detail,
            previous_hash,
            entry_hash,
        }
    }

    fn calculate_hash(
        id: &str,
        timestamp: &DateTime<Utc>,
        client_key: &str,
        tool_name: &str,
        outcome: AuditOutcome,
        detail: Option<&str>,
        previous_hash: Option<&str>,
    ) -> String {
        let mut hasher = Sha256::new();

        hasher.update(id.as_bytes());
        hasher.update(timestamp.to_rfc3339().as_bytes());
        hasher.update(client_key.as_bytes());
        hasher.update(tool_name.as_bytes());
        hasher.update(format!("{:?}", outcome).as_bytes());
        if let Some(detail) = detail {
            hasher.update(detail.as_bytes());
        }
        if let Some(prev) = previous_hash {
            hasher.update(prev.as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Verify this entry's content hash.
    pub fn verify_hash(&self) -> bool {
        let calculated = Self::calculate_hash(
            &self.id,
            &self.timestamp,
            &self.client_key,
            &self.tool_name,
            self.outcome,
            self.detail.as_deref(),
            self.previous_hash.as_deref(),
        );
        calculated == self.entry_hash
    }
}

/// In-memory append-only audit log. Retention and rotation are an
/// operator concern, not handled here.
pub struct AuditLog {
    entries: Mutex<Vec<AuditEvent>>,
    last_hash: Mutex<Option<String>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            last_hash: Mutex::new(None),
        }
    }

    /// Append one event. Infallible by contract: a poisoned lock is
    /// recovered rather than propagated into the request path.
    pub fn record(
        &self,
        client_key: &str,
        tool_name: &str,
        outcome: AuditOutcome,
        detail: Option<String>,
    ) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut last_hash = self
            .last_hash
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let event = AuditEvent::new(
            client_key.to_string(),
            tool_name.to_string(),
            outcome,
            detail,
            last_hash.clone(),
        );

        tracing::info!(
            audit_id = %event.id,
            client_key = %event.client_key,
            tool = %event.tool_name,
            outcome = ?event.outcome,
            "audit event recorded"
        );

        *last_hash = Some(event.entry_hash.clone());
        entries.push(event);
    }

    /// Snapshot of all entries, oldest first.
    pub fn entries(&self) -> Vec<AuditEvent> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn entries_for_client(&self, client_key: &str) -> Vec<AuditEvent> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.client_key == client_key)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walk the chain and verify every entry hash and link.
    pub fn verify_chain(&self) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        for (i, entry) in entries.iter().enumerate() {
            if !entry.verify_hash() {
                return false;
            }
            if i == 0 {
                if entry.previous_hash.is_some() {
                    return false;
                }
            } else if entry.previous_hash.as_deref() != Some(entries[i - 1].entry_hash.as_str()) {
                return false;
            }
        }
        true
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
