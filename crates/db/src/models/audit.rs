//! Audit log entity models and DTOs.
//!
//! Audit records have no `updated_at` column: they are written once and never
//! changed.

use std::str::FromStr;

use serde::Serialize;
use sqlx::FromRow;
use warden_core::audit::{ActionType, AuditStatus, Priority, Subject};
use warden_core::error::CoreError;
use warden_core::types::{DbId, Timestamp};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: i64 = 1000;

// ---------------------------------------------------------------------------
// Audit log entity
// ---------------------------------------------------------------------------

/// A single audit log entry, joined with the actor's username.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub actor_id: Option<DbId>,
    /// `None` for system actions and for actors that have since been deleted.
    pub actor_username: Option<String>,
    pub action_type: String,
    pub status: String,
    pub priority: String,
    pub ip_address: Option<String>,
    pub user_agent: String,
    pub subject_type: Option<String>,
    pub subject_id: Option<DbId>,
    pub object_repr: String,
    pub changes: serde_json::Value,
    pub metadata: serde_json::Value,
    pub error_message: String,
    pub created_at: Timestamp,
}

impl AuditLog {
    /// Typed subject reference, if the record has one with a known kind.
    pub fn subject(&self) -> Option<Subject> {
        match (&self.subject_type, self.subject_id) {
            (Some(kind), Some(id)) => Subject::from_parts(kind, id).ok(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// DTO for inserting a new audit log entry.
///
/// Classification fields are typed so malformed values cannot be built.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub actor_id: Option<DbId>,
    pub action_type: ActionType,
    pub status: AuditStatus,
    pub priority: Priority,
    pub ip_address: Option<String>,
    pub user_agent: String,
    pub subject: Option<Subject>,
    pub object_repr: String,
    pub changes: serde_json::Value,
    pub metadata: serde_json::Value,
    pub error_message: String,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Sortable columns of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    CreatedAt,
    ActionType,
    Status,
    /// Severity rank (`LOW < MEDIUM < HIGH`), not the stored text.
    Priority,
}

impl OrderField {
    fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "a.created_at",
            Self::ActionType => "a.action_type",
            Self::Status => "a.status",
            Self::Priority => {
                "CASE a.priority WHEN 'LOW' THEN 0 WHEN 'MEDIUM' THEN 1 ELSE 2 END"
            }
        }
    }
}

/// Listing order, parsed from `created_at` / `-created_at` style strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditOrdering {
    pub field: OrderField,
    pub descending: bool,
}

impl Default for AuditOrdering {
    /// Newest first.
    fn default() -> Self {
        Self {
            field: OrderField::CreatedAt,
            descending: true,
        }
    }
}

impl AuditOrdering {
    /// `ORDER BY` clause; ties break on id in the same direction.
    pub fn to_sql(&self) -> String {
        let dir = if self.descending { "DESC" } else { "ASC" };
        format!("ORDER BY {} {dir}, a.id {dir}", self.field.column())
    }
}

impl FromStr for AuditOrdering {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let field = match name {
            "created_at" => OrderField::CreatedAt,
            "action_type" => OrderField::ActionType,
            "status" => OrderField::Status,
            "priority" => OrderField::Priority,
            other => {
                return Err(CoreError::Validation(format!(
                    "Cannot order by '{other}'"
                )))
            }
        };
        Ok(Self { field, descending })
    }
}

/// Filter, search, ordering, and pagination for audit log listings.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Visibility scope: when set, only this actor's records are returned.
    pub actor_id: Option<DbId>,
    pub action_type: Option<ActionType>,
    pub status: Option<AuditStatus>,
    pub priority: Option<Priority>,
    pub ip_address: Option<String>,
    pub subject_type: Option<String>,
    pub created_from: Option<Timestamp>,
    pub created_to: Option<Timestamp>,
    /// Case-insensitive substring over actor username, repr, and error text.
    pub search: Option<String>,
    pub ordering: AuditOrdering,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paginated response for audit log queries.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogPage {
    pub items: Vec<AuditLog>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}
