//! Notification dispatcher contract.
//!
//! The audit pipeline only knows this trait. Callers treat a send as
//! fire-and-forget: a failure is reported back so it can be logged, but it
//! never undoes the action that triggered it and is never retried.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use warden_core::audit::Priority;
use warden_core::channels::{CHANNEL_IN_APP, CHANNEL_WEBSOCKET};
use warden_core::types::DbId;

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Delivery channel for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    InApp,
    Websocket,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => CHANNEL_IN_APP,
            Self::Websocket => CHANNEL_WEBSOCKET,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One notification addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationRequest {
    pub recipient_id: DbId,
    pub message: String,
    pub category: String,
    pub priority: Priority,
    pub channels: Vec<Channel>,
    pub metadata: serde_json::Value,
}

impl NotificationRequest {
    pub fn has_channel(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Why a notification could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Storing the in-app notification failed.
    #[error("Failed to store notification: {0}")]
    Storage(#[from] sqlx::Error),

    /// The request named no channel this dispatcher can deliver on.
    #[error("No deliverable channel in {0:?}")]
    NoChannel(Vec<Channel>),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Sends notifications to users.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, request: NotificationRequest) -> Result<(), DispatchError>;
}
