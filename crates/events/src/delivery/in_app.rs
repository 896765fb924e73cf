//! Database-backed notification dispatcher.
//!
//! `IN_APP` requests become a row in `notifications`; `WEBSOCKET` requests
//! are published on the [`EventBus`] for a live transport to forward.

use std::sync::Arc;

use async_trait::async_trait;
use warden_db::models::notification::CreateNotification;
use warden_db::repositories::NotificationRepo;
use warden_db::DbPool;

use crate::bus::{EventBus, PlatformEvent, EVENT_NOTIFICATION_CREATED};
use crate::dispatcher::{Channel, DispatchError, NotificationDispatcher, NotificationRequest};

/// Stores in-app notifications and publishes live ones.
pub struct DbNotificationDispatcher {
    pool: DbPool,
    event_bus: Arc<EventBus>,
}

impl DbNotificationDispatcher {
    pub fn new(pool: DbPool, event_bus: Arc<EventBus>) -> Self {
        Self { pool, event_bus }
    }
}

#[async_trait]
impl NotificationDispatcher for DbNotificationDispatcher {
    async fn send(&self, request: NotificationRequest) -> Result<(), DispatchError> {
        if request.channels.is_empty() {
            return Err(DispatchError::NoChannel(request.channels));
        }

        let mut notification_id = None;
        if request.has_channel(Channel::InApp) {
            let input = CreateNotification {
                recipient_id: request.recipient_id,
                message: request.message.clone(),
                category: request.category.clone(),
                priority: request.priority,
                channels: request.channels.iter().map(|c| c.to_string()).collect(),
                metadata: request.metadata.clone(),
            };
            let stored = NotificationRepo::create(&self.pool, &input).await?;
            notification_id = Some(stored.id);
        }

        if request.has_channel(Channel::Websocket) {
            let event = PlatformEvent::new(EVENT_NOTIFICATION_CREATED)
                .with_recipient(request.recipient_id)
                .with_payload(serde_json::json!({
                    "notification_id": notification_id,
                    "message": request.message,
                    "category": request.category,
                    "priority": request.priority,
                    "metadata": request.metadata,
                }));
            let receivers = self.event_bus.publish(event);
            tracing::debug!(
                recipient_id = request.recipient_id,
                receivers,
                "Published live notification"
            );
        }

        Ok(())
    }
}
