//! Warden domain vocabulary.
//!
//! This crate has no I/O and no internal dependencies so the repository
//! layer, the notification crate, and the HTTP server can all share it.

pub mod audit;
pub mod channels;
pub mod error;
pub mod request;
pub mod roles;
pub mod types;
