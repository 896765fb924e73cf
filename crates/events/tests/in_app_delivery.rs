//! Integration tests for the database-backed notification dispatcher.

use std::sync::Arc;

use assert_matches::assert_matches;
use sqlx::PgPool;
use warden_core::audit::Priority;
use warden_db::models::user::CreateUser;
use warden_db::repositories::{NotificationRepo, UserRepo};
use warden_events::{
    Channel, DbNotificationDispatcher, DispatchError, EventBus, NotificationDispatcher,
    NotificationRequest,
};

async fn recipient(pool: &PgPool) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            username: "dana".into(),
            email: "dana@test.com".into(),
            role: "user".into(),
        },
    )
    .await
    .unwrap()
    .id
}

fn request(recipient_id: i64, channels: Vec<Channel>) -> NotificationRequest {
    NotificationRequest {
        recipient_id,
        message: "High-priority action DELETE performed on Launch party.".into(),
        category: "system".into(),
        priority: Priority::High,
        channels,
        metadata: serde_json::json!({"audit_log_action": "DELETE"}),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn in_app_and_websocket_store_and_publish(pool: PgPool) {
    let user_id = recipient(&pool).await;
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let dispatcher = DbNotificationDispatcher::new(pool.clone(), Arc::clone(&bus));

    dispatcher
        .send(request(user_id, vec![Channel::InApp, Channel::Websocket]))
        .await
        .unwrap();

    let stored = NotificationRepo::list_for_recipient(&pool, user_id, 10, 0)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].priority, "HIGH");
    assert_eq!(stored[0].channels, serde_json::json!(["IN_APP", "WEBSOCKET"]));
    assert_eq!(stored[0].metadata["audit_log_action"], "DELETE");

    let event = rx.recv().await.unwrap();
    assert_eq!(event.recipient_id, Some(user_id));
    assert_eq!(event.payload["notification_id"], stored[0].id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn websocket_only_does_not_store(pool: PgPool) {
    let user_id = recipient(&pool).await;
    let dispatcher = DbNotificationDispatcher::new(pool.clone(), Arc::new(EventBus::default()));

    dispatcher
        .send(request(user_id, vec![Channel::Websocket]))
        .await
        .unwrap();

    let stored = NotificationRepo::list_for_recipient(&pool, user_id, 10, 0)
        .await
        .unwrap();
    assert!(stored.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_recipient_is_a_storage_error(pool: PgPool) {
    let dispatcher = DbNotificationDispatcher::new(pool, Arc::new(EventBus::default()));

    let result = dispatcher.send(request(999_999, vec![Channel::InApp])).await;

    assert_matches!(result, Err(DispatchError::Storage(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_channel_list_is_rejected(pool: PgPool) {
    let dispatcher = DbNotificationDispatcher::new(pool, Arc::new(EventBus::default()));

    let result = dispatcher.send(request(1, vec![])).await;

    assert_matches!(result, Err(DispatchError::NoChannel(_)));
}
