//! Warden notification plumbing.
//!
//! - [`NotificationDispatcher`] -- the collaborator contract the audit
//!   pipeline sends notifications through.
//! - [`EventBus`] / [`PlatformEvent`] -- in-process publish/subscribe hub
//!   backed by `tokio::sync::broadcast`, used to hand live notifications to
//!   whatever WebSocket transport is subscribed.
//! - [`delivery`] -- the database-backed dispatcher.

pub mod bus;
pub mod delivery;
pub mod dispatcher;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::in_app::DbNotificationDispatcher;
pub use dispatcher::{Channel, DispatchError, NotificationDispatcher, NotificationRequest};
