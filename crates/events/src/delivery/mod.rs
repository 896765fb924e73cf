//! Delivery implementations of [`NotificationDispatcher`](crate::NotificationDispatcher).

pub mod in_app;
