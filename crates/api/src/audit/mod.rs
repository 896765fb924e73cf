//! Audit pipeline: the log-writer facade, its storage seam, and the
//! change-capture hook that mutation paths call explicitly.

pub mod capture;
pub mod store;
pub mod writer;

pub use capture::ChangeCapture;
pub use store::{AuditStore, PgAuditStore};
pub use writer::{AuditWriter, LogAction, LoggedAction, RequestContext};

/// Failure to persist an audit record.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Failed to store audit log: {0}")]
    Storage(#[from] sqlx::Error),
}

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
