//! Notification channel and category name constants.
//!
//! These must match the values stored in `notifications.channels` and the
//! names accepted by the notification dispatcher.

/// Stored notification shown in the in-app inbox.
pub const CHANNEL_IN_APP: &str = "IN_APP";

/// Live push to any connected WebSocket transport.
pub const CHANNEL_WEBSOCKET: &str = "WEBSOCKET";

/// Category used for notifications raised by the audit pipeline.
pub const CATEGORY_SYSTEM: &str = "system";
