//! Repository for the `notifications` table.

use sqlx::PgPool;
use warden_core::types::DbId;

use crate::models::notification::{CreateNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str =
    "id, recipient_id, message, category, priority, channels, metadata, is_read, created_at";

/// Provides insert and listing operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Store a notification for its recipient.
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (recipient_id, message, category, priority, channels, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.recipient_id)
            .bind(&input.message)
            .bind(&input.category)
            .bind(input.priority.as_str())
            .bind(serde_json::json!(input.channels))
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    /// List a recipient's notifications, newest first.
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE recipient_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(recipient_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
