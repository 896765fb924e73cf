//! Storage seam for audit records.

use async_trait::async_trait;
use warden_db::models::audit::{AuditLog, CreateAuditLog};
use warden_db::repositories::AuditLogRepo;
use warden_db::DbPool;

/// Foreign key from `audit_logs.actor_id` to `users.id`.
const ACTOR_FK: &str = "fk_audit_logs_actor";

/// Appends audit records. Append-only: no update or delete.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert(&self, entry: CreateAuditLog) -> Result<AuditLog, sqlx::Error>;
}

/// [`AuditStore`] backed by the `audit_logs` table.
///
/// An actor that no longer exists (a still-valid token for a deleted user)
/// is stored as anonymous rather than losing the record.
pub struct PgAuditStore {
    pool: DbPool,
}

impl PgAuditStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn insert(&self, mut entry: CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        match AuditLogRepo::insert(&self.pool, &entry).await {
            Err(e) if is_missing_actor(&e) => {
                tracing::warn!(
                    actor_id = ?entry.actor_id,
                    action_type = %entry.action_type,
                    "Audit actor no longer exists, recording as anonymous",
                );
                entry.actor_id = None;
                AuditLogRepo::insert(&self.pool, &entry).await
            }
            result => result,
        }
    }
}

/// True for a foreign key violation on the actor column.
fn is_missing_actor(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_foreign_key_violation() && db_err.constraint() == Some(ACTOR_FK)
        }
        _ => false,
    }
}
