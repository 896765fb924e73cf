//! Audit record vocabulary: classifications, subject references, change sets.
//!
//! Everything the log-writer, the change-capture hook, and the repository
//! layer agree on lives here. Records are append-only, so none of these types
//! carry mutation helpers beyond construction.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Action type
// ---------------------------------------------------------------------------

/// What kind of action an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Login,
    Logout,
    Create,
    Update,
    Delete,
    View,
    System,
}

impl ActionType {
    pub const ALL: [ActionType; 7] = [
        Self::Login,
        Self::Logout,
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::View,
        Self::System,
    ];

    /// Stored name, as written to `audit_logs.action_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::Logout => "LOGOUT",
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::View => "VIEW",
            Self::System => "SYSTEM",
        }
    }

    /// Priority applied when the caller does not supply one.
    pub fn default_priority(&self) -> Priority {
        match self {
            Self::Login | Self::Logout | Self::View => Priority::Low,
            Self::Create | Self::Update => Priority::Medium,
            Self::Delete | Self::System => Priority::High,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown action type '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Outcome of the audited action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    #[default]
    Success,
    Failed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!("Unknown status '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Severity tier of an audit record. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// High-priority records always notify, whatever the caller asked for.
    pub fn forces_notification(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            other => Err(CoreError::Validation(format!("Unknown priority '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Subject reference
// ---------------------------------------------------------------------------

/// The entity an audit record is about.
///
/// One variant per known subject kind, each carrying its own id. Stored as a
/// `(subject_type, subject_id)` pair; the pair only resolves while the subject
/// still exists, which is why records also keep `object_repr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Subject {
    User(DbId),
    BlogPost(DbId),
    BlogComment(DbId),
    Event(DbId),
    Payment(DbId),
    Feedback(DbId),
    Notification(DbId),
    ChatRoom(DbId),
}

impl Subject {
    /// Every stored kind name, in declaration order.
    pub const KINDS: [&'static str; 8] = [
        "user",
        "blog_post",
        "blog_comment",
        "event",
        "payment",
        "feedback",
        "notification",
        "chat_room",
    ];

    /// Stable kind name written to `audit_logs.subject_type`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::BlogPost(_) => "blog_post",
            Self::BlogComment(_) => "blog_comment",
            Self::Event(_) => "event",
            Self::Payment(_) => "payment",
            Self::Feedback(_) => "feedback",
            Self::Notification(_) => "notification",
            Self::ChatRoom(_) => "chat_room",
        }
    }

    pub fn id(&self) -> DbId {
        match *self {
            Self::User(id)
            | Self::BlogPost(id)
            | Self::BlogComment(id)
            | Self::Event(id)
            | Self::Payment(id)
            | Self::Feedback(id)
            | Self::Notification(id)
            | Self::ChatRoom(id) => id,
        }
    }

    /// Rebuild a subject from its stored `(kind, id)` pair.
    pub fn from_parts(kind: &str, id: DbId) -> Result<Self, CoreError> {
        let subject = match kind {
            "user" => Self::User(id),
            "blog_post" => Self::BlogPost(id),
            "blog_comment" => Self::BlogComment(id),
            "event" => Self::Event(id),
            "payment" => Self::Payment(id),
            "feedback" => Self::Feedback(id),
            "notification" => Self::Notification(id),
            "chat_room" => Self::ChatRoom(id),
            other => {
                return Err(CoreError::Validation(format!(
                    "Unknown subject type '{other}'"
                )))
            }
        };
        Ok(subject)
    }

    /// Validate a kind name without an id (used by query filters).
    pub fn is_known_kind(kind: &str) -> bool {
        Self::KINDS.contains(&kind)
    }
}

// ---------------------------------------------------------------------------
// Auditable entities
// ---------------------------------------------------------------------------

/// Point-in-time field values of an entity, keyed by field name.
pub type Snapshot = Map<String, Value>;

/// Implemented by domain entities whose lifecycle is audited.
pub trait Auditable {
    /// Typed reference to this entity.
    fn subject(&self) -> Subject;

    /// Human-readable representation, kept after the entity is gone.
    fn object_repr(&self) -> String;

    /// Current scalar field values.
    fn snapshot(&self) -> Snapshot;
}

/// Serialize `value` and keep its top-level scalar fields.
///
/// Convenience for [`Auditable::snapshot`] implementations on plain
/// `Serialize` structs. Anything that does not serialize to an object yields
/// an empty snapshot.
pub fn scalar_snapshot<T: Serialize>(value: &T) -> Snapshot {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map.into_iter().filter(|(_, v)| is_scalar(v)).collect(),
        _ => Snapshot::new(),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

// ---------------------------------------------------------------------------
// Change sets
// ---------------------------------------------------------------------------

/// Old and new value of one changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Payload stored in `audit_logs.changes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Changes {
    /// Nothing recorded (create, view, login, ...).
    #[default]
    None,
    /// Field-level diff of an update. May be empty.
    Fields(BTreeMap<String, FieldChange>),
    /// Final snapshot of a deleted entity.
    Deleted(Snapshot),
}

impl Changes {
    /// Number of top-level keys in the stored JSON.
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Fields(fields) => fields.len(),
            Self::Deleted(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON form: `{field: {old, new}}`, `{"deleted": snapshot}`, or `{}`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::None => Value::Object(Map::new()),
            Self::Fields(fields) => {
                let map = fields
                    .iter()
                    .map(|(name, change)| {
                        (
                            name.clone(),
                            serde_json::json!({ "old": change.old, "new": change.new }),
                        )
                    })
                    .collect();
                Value::Object(map)
            }
            Self::Deleted(snapshot) => {
                serde_json::json!({ "deleted": Value::Object(snapshot.clone()) })
            }
        }
    }
}

/// Compare two snapshots field by field.
///
/// Every scalar field present on either side is compared; a field missing on
/// one side counts as `null` there. Only differing fields are returned, so
/// identical snapshots produce an empty (but present) diff.
pub fn diff_snapshots(old: &Snapshot, new: &Snapshot) -> Changes {
    let mut fields = BTreeMap::new();

    for name in old.keys().chain(new.keys()) {
        if fields.contains_key(name) {
            continue;
        }
        let before = old.get(name).cloned().unwrap_or(Value::Null);
        let after = new.get(name).cloned().unwrap_or(Value::Null);
        if !is_scalar(&before) || !is_scalar(&after) {
            continue;
        }
        if before != after {
            fields.insert(
                name.clone(),
                FieldChange {
                    old: before,
                    new: after,
                },
            );
        }
    }

    Changes::Fields(fields)
}

/// Change payload for a delete: the entity's final snapshot.
pub fn deletion_changes(snapshot: Snapshot) -> Changes {
    Changes::Deleted(snapshot)
}

// ---------------------------------------------------------------------------
// Sensitive field redaction
// ---------------------------------------------------------------------------

/// Key fragments whose values never reach the audit log.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "api_key",
    "private_key",
    "authorization",
    "credential",
];

const REDACTED: &str = "[REDACTED]";

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_FIELDS.iter().any(|f| lower.contains(f))
}

/// Replace the value of every sensitive key, at any depth, with `"[REDACTED]"`.
pub fn redact_sensitive_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| {
                    let redacted = if is_sensitive_key(key) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_sensitive_fields(val)
                    };
                    (key.clone(), redacted)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_fields).collect()),
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
