//! Route definitions for the audit log query surface.

use axum::routing::get;
use axum::Router;

use crate::handlers::audit;
use crate::state::AppState;

/// Audit routes mounted at `/audit-logs`.
///
/// Read-only: other methods on these paths answer 405.
///
/// ```text
/// GET  /        -> list_audit_logs
/// GET  /{id}    -> get_audit_log
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(audit::list_audit_logs))
        .route("/{id}", get(audit::get_audit_log))
}
