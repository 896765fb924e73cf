use std::sync::Arc;

use warden_events::{DbNotificationDispatcher, EventBus};

use crate::audit::{AuditWriter, ChangeCapture, PgAuditStore};
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: warden_db::DbPool,
    /// Server configuration (JWT settings are read by the auth extractor).
    pub config: Arc<ServerConfig>,
    /// Log-writer facade shared by the request auditor and change capture.
    pub audit: Arc<AuditWriter>,
    /// Event bus live notifications are published on.
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    /// Wire the production collaborators: Postgres storage and the
    /// database-backed notification dispatcher.
    pub fn new(pool: warden_db::DbPool, config: ServerConfig, event_bus: Arc<EventBus>) -> Self {
        let store = Arc::new(PgAuditStore::new(pool.clone()));
        let dispatcher = Arc::new(DbNotificationDispatcher::new(
            pool.clone(),
            Arc::clone(&event_bus),
        ));

        Self {
            pool,
            config: Arc::new(config),
            audit: Arc::new(AuditWriter::new(store, dispatcher)),
            event_bus,
        }
    }

    /// Change-capture hook bound to this state's writer.
    pub fn change_capture(&self) -> ChangeCapture {
        ChangeCapture::new(Arc::clone(&self.audit))
    }
}
