//! Mapping rules for the request-boundary auditor.
//!
//! Methods are taken as plain strings so this module stays free of HTTP
//! crate dependencies.

use crate::audit::{ActionType, AuditStatus, Priority};

/// Whether the HTTP method changes state and is therefore audited.
pub fn is_mutating(method: &str) -> bool {
    matches!(method, "POST" | "PUT" | "PATCH" | "DELETE")
}

/// Action recorded for a request method. Unknown methods map to `View`.
pub fn action_for_method(method: &str) -> ActionType {
    match method {
        "POST" => ActionType::Create,
        "PUT" | "PATCH" => ActionType::Update,
        "DELETE" => ActionType::Delete,
        _ => ActionType::View,
    }
}

/// Priority recorded for a request method.
pub fn priority_for_method(method: &str) -> Priority {
    match method {
        "POST" | "PUT" | "PATCH" => Priority::Medium,
        "DELETE" => Priority::High,
        _ => Priority::Low,
    }
}

/// Outcome derived from the response status code.
pub fn status_for_code(code: u16) -> AuditStatus {
    if code < 400 {
        AuditStatus::Success
    } else {
        AuditStatus::Failed
    }
}

/// Deletes always notify at the request boundary.
pub fn notify_for_action(action: ActionType) -> bool {
    action == ActionType::Delete
}

/// Client address: first `X-Forwarded-For` hop if present, else the peer.
pub fn client_ip(forwarded_for: Option<&str>, remote_addr: Option<&str>) -> Option<String> {
    let first_hop = forwarded_for
        .and_then(|header| header.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty());

    first_hop.or(remote_addr).map(str::to_string)
}
