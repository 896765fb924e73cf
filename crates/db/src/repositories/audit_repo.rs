//! Repository for the `audit_logs` table.
//!
//! Insert and read only: the table is append-only and a trigger rejects
//! updates at the storage layer.

use sqlx::PgPool;
use warden_core::types::{DbId, Timestamp};

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for SELECT queries over `audit_logs a LEFT JOIN users u`.
const COLUMNS: &str = "\
    a.id, a.actor_id, u.username AS actor_username, a.action_type, a.status, \
    a.priority, a.ip_address, a.user_agent, a.subject_type, a.subject_id, \
    a.object_repr, a.changes, a.metadata, a.error_message, a.created_at";

/// Column list for INSERT (excludes generated `id` and `created_at`).
const INSERT_COLUMNS: &str = "\
    actor_id, action_type, status, priority, ip_address, user_agent, \
    subject_type, subject_id, object_repr, changes, metadata, error_message";

const FROM_JOINED: &str = "FROM audit_logs a LEFT JOIN users u ON u.id = a.actor_id";

// ---------------------------------------------------------------------------
// AuditLogRepo
// ---------------------------------------------------------------------------

/// Provides insert and query operations for audit logs.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Insert one audit log entry and return it with the actor's username.
    pub async fn insert(pool: &PgPool, entry: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "WITH a AS ( \
                INSERT INTO audit_logs ({INSERT_COLUMNS}) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
                RETURNING * \
             ) \
             SELECT {COLUMNS} FROM a LEFT JOIN users u ON u.id = a.actor_id"
        );

        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entry.actor_id)
            .bind(entry.action_type.as_str())
            .bind(entry.status.as_str())
            .bind(entry.priority.as_str())
            .bind(&entry.ip_address)
            .bind(&entry.user_agent)
            .bind(entry.subject.map(|s| s.kind()))
            .bind(entry.subject.map(|s| s.id()))
            .bind(&entry.object_repr)
            .bind(&entry.changes)
            .bind(&entry.metadata)
            .bind(&entry.error_message)
            .fetch_one(pool)
            .await
    }

    /// Find a single entry, optionally restricted to one actor's records.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        actor_scope: Option<DbId>,
    ) -> Result<Option<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} {FROM_JOINED} \
             WHERE a.id = $1 AND ($2::BIGINT IS NULL OR a.actor_id = $2)"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(id)
            .bind(actor_scope)
            .fetch_optional(pool)
            .await
    }

    /// Query audit logs with filtering, ordering, and pagination.
    pub async fn query(pool: &PgPool, params: &AuditQuery) -> Result<Vec<AuditLog>, sqlx::Error> {
        let limit = clamp_limit(params.limit);
        let offset = params.offset.unwrap_or(0).max(0);

        let (where_clause, bind_values, bind_idx) = build_audit_filter(params);

        let query = format!(
            "SELECT {COLUMNS} {FROM_JOINED} {where_clause} {} \
             LIMIT ${bind_idx} OFFSET ${}",
            params.ordering.to_sql(),
            bind_idx + 1
        );

        let q = bind_audit_values(sqlx::query_as::<_, AuditLog>(&query), &bind_values);
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Count audit logs matching the given filter (for pagination metadata).
    pub async fn count(pool: &PgPool, params: &AuditQuery) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_audit_filter(params);

        let query = format!("SELECT COUNT(*)::BIGINT AS count {FROM_JOINED} {where_clause}");

        let q = bind_audit_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values);
        q.fetch_one(pool).await
    }
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built audit log queries.
enum BindValue {
    BigInt(i64),
    Text(String),
    Timestamp(Timestamp),
}

/// Escape LIKE metacharacters so search text matches literally.
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Build a WHERE clause and bind values from `AuditQuery` filter parameters.
///
/// Returns `(where_clause, bind_values, next_bind_index)`.
/// The `where_clause` is empty if no filters are active, or starts with `WHERE `.
fn build_audit_filter(params: &AuditQuery) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(actor_id) = params.actor_id {
        conditions.push(format!("a.actor_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::BigInt(actor_id));
    }

    if let Some(action_type) = params.action_type {
        conditions.push(format!("a.action_type = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(action_type.as_str().to_string()));
    }

    if let Some(status) = params.status {
        conditions.push(format!("a.status = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(status.as_str().to_string()));
    }

    if let Some(priority) = params.priority {
        conditions.push(format!("a.priority = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(priority.as_str().to_string()));
    }

    if let Some(ref ip_address) = params.ip_address {
        conditions.push(format!("a.ip_address = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(ip_address.clone()));
    }

    if let Some(ref subject_type) = params.subject_type {
        conditions.push(format!("a.subject_type = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(subject_type.clone()));
    }

    if let Some(from) = params.created_from {
        conditions.push(format!("a.created_at >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(from));
    }

    if let Some(to) = params.created_to {
        conditions.push(format!("a.created_at <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(to));
    }

    // One bind shared by all three searched columns.
    if let Some(ref search) = params.search {
        conditions.push(format!(
            "(u.username ILIKE ${bind_idx} OR a.object_repr ILIKE ${bind_idx} \
             OR a.error_message ILIKE ${bind_idx})"
        ));
        bind_idx += 1;
        bind_values.push(BindValue::Text(like_pattern(search)));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_audit_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_audit_values_scalar<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}
