//! Notification entity models and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use warden_core::audit::Priority;
use warden_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub recipient_id: DbId,
    pub message: String,
    pub category: String,
    pub priority: String,
    pub channels: serde_json::Value,
    pub metadata: serde_json::Value,
    pub is_read: bool,
    pub created_at: Timestamp,
}

/// DTO for inserting a notification.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub recipient_id: DbId,
    pub message: String,
    pub category: String,
    pub priority: Priority,
    pub channels: Vec<String>,
    pub metadata: serde_json::Value,
}
