//! Log-writer facade.
//!
//! Every audit entry, whether it comes from the change-capture hook, the
//! request auditor, or an explicit call site, goes through
//! [`AuditWriter::log`]. The writer fills in the default priority, escalates
//! HIGH-priority actions to a notification for the actor, redacts sensitive
//! values, and persists exactly one record.

use std::sync::Arc;

use serde_json::Value;
use warden_core::audit::{
    redact_sensitive_fields, ActionType, Auditable, AuditStatus, Changes, Priority, Snapshot,
    Subject,
};
use warden_core::channels::CATEGORY_SYSTEM;
use warden_core::types::DbId;
use warden_db::models::audit::{AuditLog, CreateAuditLog};
use warden_events::{Channel, NotificationDispatcher, NotificationRequest};

use super::store::AuditStore;
use super::AuditError;

/// Repr used in notification text when an action has no subject.
const SYSTEM_REPR: &str = "system";

// ---------------------------------------------------------------------------
// Request context
// ---------------------------------------------------------------------------

/// What the writer needs to know about the HTTP request behind an action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    /// Absolute URL including the query string.
    pub url: String,
    pub method: String,
    pub user_agent: String,
    pub ip_address: Option<String>,
}

impl RequestContext {
    /// Metadata derived from the request: `url` and `method`.
    fn metadata(&self) -> Snapshot {
        let mut map = Snapshot::new();
        map.insert("url".into(), Value::String(self.url.clone()));
        map.insert("method".into(), Value::String(self.method.clone()));
        map
    }
}

// ---------------------------------------------------------------------------
// LogAction
// ---------------------------------------------------------------------------

/// One action to be logged, assembled with builder methods.
///
/// ```ignore
/// let action = LogAction::new(ActionType::Update)
///     .actor(Some(user.user_id))
///     .on(&post)
///     .changes(diff);
/// state.audit.log(action).await?;
/// ```
#[derive(Debug, Clone)]
pub struct LogAction {
    pub actor_id: Option<DbId>,
    pub action_type: ActionType,
    pub status: AuditStatus,
    pub subject: Option<Subject>,
    pub object_repr: String,
    pub changes: Changes,
    pub error_message: String,
    /// Explicit priority; `None` uses the action type's default.
    pub priority: Option<Priority>,
    /// Caller's notify request. HIGH priority notifies regardless.
    pub notify: bool,
    pub metadata: Snapshot,
    pub request: Option<RequestContext>,
}

impl LogAction {
    pub fn new(action_type: ActionType) -> Self {
        Self {
            actor_id: None,
            action_type,
            status: AuditStatus::default(),
            subject: None,
            object_repr: String::new(),
            changes: Changes::None,
            error_message: String::new(),
            priority: None,
            notify: false,
            metadata: Snapshot::new(),
            request: None,
        }
    }

    pub fn actor(mut self, actor_id: Option<DbId>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn status(mut self, status: AuditStatus) -> Self {
        self.status = status;
        self
    }

    /// Reference `entity` and capture its repr now, so it outlives the entity.
    pub fn on(mut self, entity: &dyn Auditable) -> Self {
        self.subject = Some(entity.subject());
        self.object_repr = entity.object_repr();
        self
    }

    pub fn changes(mut self, changes: Changes) -> Self {
        self.changes = changes;
        self
    }

    /// Mark the action failed with `message`.
    pub fn failed(mut self, message: impl Into<String>) -> Self {
        self.status = AuditStatus::Failed;
        self.error_message = message.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn notify(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn request(mut self, request: RequestContext) -> Self {
        self.request = Some(request);
        self
    }

    pub fn effective_priority(&self) -> Priority {
        self.priority
            .unwrap_or_else(|| self.action_type.default_priority())
    }

    /// Caller flag, escalated by a HIGH effective priority.
    pub fn should_notify(&self) -> bool {
        self.notify || self.effective_priority().forces_notification()
    }
}

/// Outcome of [`AuditWriter::log`].
#[derive(Debug, Clone)]
pub struct LoggedAction {
    pub record: AuditLog,
    /// Whether the action called for a notification.
    pub notify: bool,
    /// Whether a notification was handed to the dispatcher successfully.
    pub notified: bool,
}

// ---------------------------------------------------------------------------
// AuditWriter
// ---------------------------------------------------------------------------

/// Persists audit records and escalates high-priority ones.
pub struct AuditWriter {
    store: Arc<dyn AuditStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl AuditWriter {
    pub fn new(store: Arc<dyn AuditStore>, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Persist one record for `action`, then notify the actor if required.
    ///
    /// A storage failure is returned to the caller. A notification failure is
    /// logged and reported through [`LoggedAction::notified`]; the record stays.
    pub async fn log(&self, action: LogAction) -> Result<LoggedAction, AuditError> {
        let priority = action.effective_priority();
        let notify = action.should_notify();

        let LogAction {
            actor_id,
            action_type,
            status,
            subject,
            object_repr,
            changes,
            error_message,
            metadata: caller_metadata,
            request,
            ..
        } = action;

        let mut metadata = request
            .as_ref()
            .map(RequestContext::metadata)
            .unwrap_or_default();
        metadata.extend(caller_metadata);

        let (ip_address, user_agent) = match request {
            Some(req) => (req.ip_address, req.user_agent),
            None => (None, String::new()),
        };

        let entry = CreateAuditLog {
            actor_id,
            action_type,
            status,
            priority,
            ip_address,
            user_agent,
            subject,
            object_repr,
            changes: redact_sensitive_fields(&changes.to_json()),
            metadata: redact_sensitive_fields(&Value::Object(metadata)),
            error_message,
        };

        let record = self.store.insert(entry).await?;

        tracing::info!(
            audit_log_id = record.id,
            actor_id = ?record.actor_id,
            action_type = %action_type,
            status = %status,
            priority = %priority,
            "Audit log recorded",
        );

        let notified = match (notify, record.actor_id) {
            (true, Some(recipient_id)) => {
                self.notify_actor(recipient_id, action_type, &record.object_repr)
                    .await
            }
            _ => false,
        };

        Ok(LoggedAction {
            record,
            notify,
            notified,
        })
    }

    async fn notify_actor(&self, recipient_id: DbId, action_type: ActionType, repr: &str) -> bool {
        let target = if repr.is_empty() { SYSTEM_REPR } else { repr };
        let request = NotificationRequest {
            recipient_id,
            message: format!("High-priority action {action_type} performed on {target}."),
            category: CATEGORY_SYSTEM.to_string(),
            priority: Priority::High,
            channels: vec![Channel::InApp, Channel::Websocket],
            metadata: serde_json::json!({ "audit_log_action": action_type.as_str() }),
        };

        match self.dispatcher.send(request).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    recipient_id,
                    action_type = %action_type,
                    "Failed to send audit notification",
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;
    use warden_core::audit::diff_snapshots;

    use super::*;
    use crate::audit::testing::{FailingStore, MemoryStore, RecordingDispatcher};

    struct Post {
        id: DbId,
        title: &'static str,
    }

    impl Auditable for Post {
        fn subject(&self) -> Subject {
            Subject::BlogPost(self.id)
        }

        fn object_repr(&self) -> String {
            self.title.to_string()
        }

        fn snapshot(&self) -> Snapshot {
            let mut map = Snapshot::new();
            map.insert("title".into(), json!(self.title));
            map
        }
    }

    fn writer() -> (AuditWriter, Arc<MemoryStore>, Arc<RecordingDispatcher>) {
        let store = Arc::new(MemoryStore::default());
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let writer = AuditWriter::new(store.clone(), dispatcher.clone());
        (writer, store, dispatcher)
    }

    #[tokio::test]
    async fn priority_defaults_from_action_type() {
        let (writer, store, _) = writer();

        for (action, expected) in [
            (ActionType::Login, Priority::Low),
            (ActionType::View, Priority::Low),
            (ActionType::Create, Priority::Medium),
            (ActionType::Update, Priority::Medium),
            (ActionType::Delete, Priority::High),
            (ActionType::System, Priority::High),
        ] {
            writer.log(LogAction::new(action)).await.unwrap();
            assert_eq!(store.entries().last().unwrap().priority, expected);
        }
    }

    #[tokio::test]
    async fn explicit_priority_wins_over_default() {
        let (writer, store, dispatcher) = writer();

        let logged = writer
            .log(
                LogAction::new(ActionType::Delete)
                    .actor(Some(1))
                    .priority(Priority::Low),
            )
            .await
            .unwrap();

        assert_eq!(store.entries()[0].priority, Priority::Low);
        assert!(!logged.notify);
        assert!(dispatcher.sent().is_empty());
    }

    #[tokio::test]
    async fn high_priority_escalates_to_notification() {
        let (writer, _, dispatcher) = writer();
        let post = Post {
            id: 9,
            title: "Release notes",
        };

        let logged = writer
            .log(
                LogAction::new(ActionType::Update)
                    .actor(Some(5))
                    .on(&post)
                    .priority(Priority::High)
                    .notify(false),
            )
            .await
            .unwrap();

        assert!(logged.notify);
        assert!(logged.notified);

        let sent = dispatcher.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_id, 5);
        assert_eq!(
            sent[0].message,
            "High-priority action UPDATE performed on Release notes."
        );
        assert_eq!(sent[0].category, "system");
        assert_eq!(sent[0].priority, Priority::High);
        assert_eq!(sent[0].channels, vec![Channel::InApp, Channel::Websocket]);
        assert_eq!(sent[0].metadata, json!({"audit_log_action": "UPDATE"}));
    }

    #[tokio::test]
    async fn caller_notify_flag_is_honoured_below_high() {
        let (writer, _, dispatcher) = writer();

        let logged = writer
            .log(LogAction::new(ActionType::Login).actor(Some(2)).notify(true))
            .await
            .unwrap();

        assert!(logged.notified);
        assert_eq!(
            dispatcher.sent()[0].message,
            "High-priority action LOGIN performed on system."
        );
    }

    #[tokio::test]
    async fn anonymous_actor_is_never_notified() {
        let (writer, store, dispatcher) = writer();

        let logged = writer.log(LogAction::new(ActionType::Delete)).await.unwrap();

        assert!(logged.notify);
        assert!(!logged.notified);
        assert_eq!(store.entries().len(), 1);
        assert!(dispatcher.sent().is_empty());
    }

    #[tokio::test]
    async fn dispatch_failure_keeps_the_record() {
        let store = Arc::new(MemoryStore::default());
        let dispatcher = Arc::new(RecordingDispatcher::failing());
        let writer = AuditWriter::new(store.clone(), dispatcher.clone());

        let logged = writer
            .log(LogAction::new(ActionType::System).actor(Some(3)))
            .await
            .unwrap();

        assert!(logged.notify);
        assert!(!logged.notified);
        assert_eq!(store.entries().len(), 1);
        assert_eq!(dispatcher.sent().len(), 1);
    }

    #[tokio::test]
    async fn storage_failure_propagates_and_skips_notification() {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let writer = AuditWriter::new(Arc::new(FailingStore), dispatcher.clone());

        let result = writer
            .log(LogAction::new(ActionType::Delete).actor(Some(1)))
            .await;

        assert_matches!(result, Err(AuditError::Storage(_)));
        assert!(dispatcher.sent().is_empty());
    }

    #[tokio::test]
    async fn request_context_fills_columns_and_metadata() {
        let (writer, store, _) = writer();
        let request = RequestContext {
            url: "https://example.test/api/posts?draft=1".into(),
            method: "POST".into(),
            user_agent: "curl/8.0".into(),
            ip_address: Some("203.0.113.7".into()),
        };

        writer
            .log(
                LogAction::new(ActionType::Create)
                    .request(request)
                    .metadata("method", json!("OVERRIDDEN"))
                    .metadata("source", json!("import")),
            )
            .await
            .unwrap();

        let entries = store.entries();
        let entry = &entries[0];
        assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(entry.user_agent, "curl/8.0");
        assert_eq!(
            entry.metadata,
            json!({
                "url": "https://example.test/api/posts?draft=1",
                "method": "OVERRIDDEN",
                "source": "import",
            })
        );
    }

    #[tokio::test]
    async fn subject_and_repr_are_captured() {
        let (writer, store, _) = writer();
        let post = Post {
            id: 11,
            title: "Draft",
        };

        let logged = writer
            .log(LogAction::new(ActionType::Create).on(&post))
            .await
            .unwrap();

        assert_eq!(logged.record.subject(), Some(Subject::BlogPost(11)));
        assert_eq!(store.entries()[0].object_repr, "Draft");
    }

    #[tokio::test]
    async fn sensitive_values_are_redacted_before_storage() {
        let (writer, store, _) = writer();
        let mut old = Snapshot::new();
        old.insert("password".into(), json!("hunter2"));
        old.insert("email".into(), json!("a@x.test"));
        let mut new = Snapshot::new();
        new.insert("password".into(), json!("swordfish"));
        new.insert("email".into(), json!("b@x.test"));

        writer
            .log(
                LogAction::new(ActionType::Update)
                    .changes(diff_snapshots(&old, &new))
                    .metadata("api_key", json!("abc")),
            )
            .await
            .unwrap();

        let entries = store.entries();
        let entry = &entries[0];
        assert_eq!(entry.changes["password"], json!("[REDACTED]"));
        assert_eq!(entry.changes["email"], json!({"old": "a@x.test", "new": "b@x.test"}));
        assert_eq!(entry.metadata["api_key"], json!("[REDACTED]"));
    }

    #[tokio::test]
    async fn failed_marks_status_and_message() {
        let (writer, store, _) = writer();

        writer
            .log(LogAction::new(ActionType::Login).failed("bad credentials"))
            .await
            .unwrap();

        let entries = store.entries();
        let entry = &entries[0];
        assert_eq!(entry.status, AuditStatus::Failed);
        assert_eq!(entry.error_message, "bad credentials");
    }

    #[test]
    fn changes_default_to_none() {
        let action = LogAction::new(ActionType::Create);
        assert_eq!(action.changes, Changes::None);
        assert_eq!(action.changes.to_json(), json!({}));
        assert!(!action.should_notify());
    }
}
