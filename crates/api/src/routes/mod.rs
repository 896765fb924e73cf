pub mod audit;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /audit-logs                list (any authenticated user, scoped)
/// /audit-logs/{id}           get  (any authenticated user, scoped)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/audit-logs", audit::router())
}
