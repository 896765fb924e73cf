//! In-memory doubles for the audit seams.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use warden_db::models::audit::{AuditLog, CreateAuditLog};
use warden_events::{DispatchError, NotificationDispatcher, NotificationRequest};

use super::store::AuditStore;

/// Stores every entry in a vector and hands back a row-shaped record.
#[derive(Default)]
pub struct MemoryStore {
    next_id: AtomicI64,
    pub entries: Mutex<Vec<CreateAuditLog>>,
}

impl MemoryStore {
    pub fn entries(&self) -> Vec<CreateAuditLog> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn insert(&self, entry: CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = AuditLog {
            id,
            actor_id: entry.actor_id,
            actor_username: None,
            action_type: entry.action_type.to_string(),
            status: entry.status.to_string(),
            priority: entry.priority.to_string(),
            ip_address: entry.ip_address.clone(),
            user_agent: entry.user_agent.clone(),
            subject_type: entry.subject.map(|s| s.kind().to_string()),
            subject_id: entry.subject.map(|s| s.id()),
            object_repr: entry.object_repr.clone(),
            changes: entry.changes.clone(),
            metadata: entry.metadata.clone(),
            error_message: entry.error_message.clone(),
            created_at: chrono::Utc::now(),
        };
        self.entries.lock().unwrap().push(entry);
        Ok(record)
    }
}

/// Rejects every insert.
pub struct FailingStore;

#[async_trait]
impl AuditStore for FailingStore {
    async fn insert(&self, _entry: CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }
}

/// Records requests; optionally fails every send after recording it.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub fail: bool,
    pub sent: Mutex<Vec<NotificationRequest>>,
}

impl RecordingDispatcher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(&self, request: NotificationRequest) -> Result<(), DispatchError> {
        let channels = request.channels.clone();
        self.sent.lock().unwrap().push(request);
        if self.fail {
            return Err(DispatchError::NoChannel(channels));
        }
        Ok(())
    }
}
