//! Request-boundary auditor.
//!
//! Records one coarse audit entry per mutating request (POST, PUT, PATCH,
//! DELETE) after the inner service has produced its response. The entry is
//! independent of any entry the change-capture hook writes for the same
//! operation; the two are not deduplicated.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{HOST, USER_AGENT};
use axum::http::{HeaderMap, Uri};
use axum::middleware::Next;
use axum::response::Response;
use warden_core::request::{
    action_for_method, client_ip, is_mutating, notify_for_action, priority_for_method,
    status_for_code,
};

use crate::audit::{LogAction, RequestContext};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Audit every mutating request. Mount with `axum::middleware::from_fn_with_state`.
///
/// The response is returned unchanged whatever happens to the audit write.
pub async fn audit_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_string();
    if !is_mutating(&method) {
        return next.run(request).await;
    }

    let actor = AuthUser::optional_from_headers(request.headers(), &state.config.jwt);
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let context = request_context(request.headers(), request.uri(), &method, peer.as_deref());

    let response = next.run(request).await;

    let code = response.status().as_u16();
    let action_type = action_for_method(&method);
    let action = LogAction::new(action_type)
        .actor(actor.map(|a| a.user_id))
        .status(status_for_code(code))
        .priority(priority_for_method(&method))
        .notify(notify_for_action(action_type))
        .metadata("status_code", serde_json::json!(code))
        .request(context);

    if let Err(e) = state.audit.log(action).await {
        tracing::error!(
            error = %e,
            method = %method,
            status_code = code,
            "Failed to record request audit log",
        );
    }

    response
}

/// Build the request context from headers, URI, and the peer address.
pub fn request_context(
    headers: &HeaderMap,
    uri: &Uri,
    method: &str,
    peer: Option<&str>,
) -> RequestContext {
    RequestContext {
        url: absolute_url(headers, uri),
        method: method.to_string(),
        user_agent: header_str(headers, USER_AGENT.as_str())
            .unwrap_or_default()
            .to_string(),
        ip_address: client_ip(header_str(headers, X_FORWARDED_FOR), peer),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// `scheme://host/path?query`, falling back to the bare path without a host.
fn absolute_url(headers: &HeaderMap, uri: &Uri) -> String {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    let host = header_str(headers, HOST.as_str())
        .or_else(|| uri.authority().map(|a| a.as_str()));

    match host {
        Some(host) => {
            let scheme = header_str(headers, X_FORWARDED_PROTO)
                .or_else(|| uri.scheme_str())
                .unwrap_or("http");
            format!("{scheme}://{host}{path}")
        }
        None => path.to_string(),
    }
}
