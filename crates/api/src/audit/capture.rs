//! Change-capture hook.
//!
//! Mutation paths call these methods around their writes, passing the acting
//! identity explicitly. Capture is opt-in: without an actor nothing is
//! recorded. The hook never fails its caller; audit storage errors are logged
//! and surface as `None`. The audit write is not part of the domain write's
//! transaction.

use std::sync::Arc;

use warden_core::audit::{deletion_changes, diff_snapshots, ActionType, Auditable};

use super::writer::{AuditWriter, LogAction, LoggedAction};
use crate::middleware::auth::AuthUser;

/// Records create, update, and delete lifecycle events for audited entities.
#[derive(Clone)]
pub struct ChangeCapture {
    writer: Arc<AuditWriter>,
}

impl ChangeCapture {
    pub fn new(writer: Arc<AuditWriter>) -> Self {
        Self { writer }
    }

    /// Call after a create has persisted. Logs `CREATE` with no changes.
    pub async fn record_created(
        &self,
        actor: Option<&AuthUser>,
        entity: &dyn Auditable,
    ) -> Option<LoggedAction> {
        let actor = actor?;
        self.write(
            LogAction::new(ActionType::Create)
                .actor(Some(actor.user_id))
                .on(entity),
        )
        .await
    }

    /// Call before an update persists. Logs `UPDATE` with the field diff,
    /// even when the diff is empty.
    pub async fn record_updated(
        &self,
        actor: Option<&AuthUser>,
        before: &dyn Auditable,
        after: &dyn Auditable,
    ) -> Option<LoggedAction> {
        let actor = actor?;
        let changes = diff_snapshots(&before.snapshot(), &after.snapshot());
        self.write(
            LogAction::new(ActionType::Update)
                .actor(Some(actor.user_id))
                .on(after)
                .changes(changes),
        )
        .await
    }

    /// Call before a delete persists. Logs `DELETE` with the final snapshot.
    pub async fn record_deleted(
        &self,
        actor: Option<&AuthUser>,
        entity: &dyn Auditable,
    ) -> Option<LoggedAction> {
        let actor = actor?;
        self.write(
            LogAction::new(ActionType::Delete)
                .actor(Some(actor.user_id))
                .on(entity)
                .changes(deletion_changes(entity.snapshot())),
        )
        .await
    }

    async fn write(&self, action: LogAction) -> Option<LoggedAction> {
        let action_type = action.action_type;
        let subject = action.subject;
        match self.writer.log(action).await {
            Ok(logged) => Some(logged),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    action_type = %action_type,
                    subject = ?subject,
                    "Failed to record entity change",
                );
                None
            }
        }
    }
}
