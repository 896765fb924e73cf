//! Handlers for the read-only audit log endpoints.
//!
//! Any authenticated caller may query. Privileged callers see every record;
//! everyone else is scoped to records where they are the actor.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use warden_core::audit::Subject;
use warden_core::error::CoreError;
use warden_core::types::{DbId, Timestamp};
use warden_db::models::audit::{AuditLogPage, AuditQuery};
use warden_db::repositories::audit_repo::clamp_limit;
use warden_db::repositories::AuditLogRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter types
// ---------------------------------------------------------------------------

/// Query parameters for audit log listings. All values arrive as strings and
/// are validated in [`AuditLogQueryParams::into_query`].
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQueryParams {
    pub action_type: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub ip_address: Option<String>,
    pub subject_type: Option<String>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl AuditLogQueryParams {
    /// Validate the raw parameters and scope them to `user`.
    ///
    /// Returns the repository query plus the resolved page number and size.
    pub fn into_query(self, user: &AuthUser) -> AppResult<(AuditQuery, i64, i64)> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::BadRequest("page must be at least 1".into()));
        }
        let page_size = clamp_limit(self.page_size);
        let offset = (page - 1)
            .checked_mul(page_size)
            .ok_or_else(|| AppError::BadRequest(format!("page {page} is out of range")))?;

        if let Some(ref kind) = self.subject_type {
            if !Subject::is_known_kind(kind) {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "Unknown subject type '{kind}'"
                ))));
            }
        }

        let query = AuditQuery {
            actor_id: (!user.is_privileged()).then_some(user.user_id),
            action_type: parse_opt(self.action_type.as_deref())?,
            status: parse_opt(self.status.as_deref())?,
            priority: parse_opt(self.priority.as_deref())?,
            ip_address: non_empty(self.ip_address),
            subject_type: self.subject_type,
            created_from: parse_timestamp(self.created_from.as_deref())?,
            created_to: parse_timestamp(self.created_to.as_deref())?,
            search: non_empty(self.search),
            ordering: parse_opt(self.ordering.as_deref())?.unwrap_or_default(),
            limit: Some(page_size),
            offset: Some(offset),
        };

        Ok((query, page, page_size))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an optional enum-like value; blank counts as absent.
fn parse_opt<T>(value: Option<&str>) -> AppResult<Option<T>>
where
    T: FromStr<Err = CoreError>,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.parse().map(Some).map_err(AppError::Core),
        None => Ok(None),
    }
}

/// Parse an optional RFC 3339 timestamp.
fn parse_timestamp(value: Option<&str>) -> AppResult<Option<Timestamp>> {
    match value {
        Some(v) => v
            .parse::<Timestamp>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid timestamp '{v}'"))),
        None => Ok(None),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /audit-logs
///
/// Paginated, filtered listing of the audit records visible to the caller.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<AuditLogQueryParams>,
) -> AppResult<impl IntoResponse> {
    let (query, page, page_size) = params.into_query(&user)?;

    let items = AuditLogRepo::query(&state.pool, &query).await?;
    let total = AuditLogRepo::count(&state.pool, &query).await?;

    Ok(Json(DataResponse {
        data: AuditLogPage {
            items,
            total,
            page,
            page_size,
        },
    }))
}

/// GET /audit-logs/{id}
///
/// A record outside the caller's visibility is indistinguishable from a
/// missing one.
pub async fn get_audit_log(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let scope = (!user.is_privileged()).then_some(user.user_id);

    let log = AuditLogRepo::find_by_id(&state.pool, id, scope)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "AuditLog",
            id,
        }))?;

    Ok(Json(DataResponse { data: log }))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use warden_core::audit::{ActionType, Priority};
    use warden_db::models::audit::OrderField;

    use super::*;

    fn admin() -> AuthUser {
        AuthUser {
            user_id: 1,
            role: "admin".into(),
        }
    }

    fn member() -> AuthUser {
        AuthUser {
            user_id: 2,
            role: "user".into(),
        }
    }

    #[test]
    fn defaults_give_first_page_of_fifty() {
        let (query, page, page_size) = AuditLogQueryParams::default()
            .into_query(&admin())
            .unwrap();

        assert_eq!((page, page_size), (1, 50));
        assert_eq!(query.limit, Some(50));
        assert_eq!(query.offset, Some(0));
        assert_eq!(query.actor_id, None);
        assert_eq!(query.ordering.field, OrderField::CreatedAt);
        assert!(query.ordering.descending);
    }

    #[test]
    fn non_privileged_callers_are_scoped_to_themselves() {
        let (query, _, _) = AuditLogQueryParams::default()
            .into_query(&member())
            .unwrap();
        assert_eq!(query.actor_id, Some(2));
    }

    #[test]
    fn page_size_is_clamped_and_offset_follows_page() {
        let params = AuditLogQueryParams {
            page: Some(3),
            page_size: Some(5000),
            ..Default::default()
        };
        let (query, page, page_size) = params.into_query(&admin()).unwrap();

        assert_eq!(page, 3);
        assert_eq!(page_size, 1000);
        assert_eq!(query.offset, Some(2000));
    }

    #[test]
    fn filters_are_parsed_into_typed_values() {
        let params = AuditLogQueryParams {
            action_type: Some("DELETE".into()),
            priority: Some("HIGH".into()),
            subject_type: Some("blog_post".into()),
            created_from: Some("2026-01-01T00:00:00Z".into()),
            ordering: Some("-priority".into()),
            search: Some("  ".into()),
            ..Default::default()
        };
        let (query, _, _) = params.into_query(&admin()).unwrap();

        assert_eq!(query.action_type, Some(ActionType::Delete));
        assert_eq!(query.priority, Some(Priority::High));
        assert_eq!(query.subject_type.as_deref(), Some("blog_post"));
        assert!(query.created_from.is_some());
        assert_eq!(query.ordering.field, OrderField::Priority);
        assert_eq!(query.search, None);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let bad_enum = AuditLogQueryParams {
            status: Some("MAYBE".into()),
            ..Default::default()
        };
        assert_matches!(
            bad_enum.into_query(&admin()),
            Err(AppError::Core(CoreError::Validation(_)))
        );

        let bad_time = AuditLogQueryParams {
            created_to: Some("yesterday".into()),
            ..Default::default()
        };
        assert_matches!(bad_time.into_query(&admin()), Err(AppError::BadRequest(_)));

        let bad_page = AuditLogQueryParams {
            page: Some(0),
            ..Default::default()
        };
        assert_matches!(bad_page.into_query(&admin()), Err(AppError::BadRequest(_)));

        let bad_subject = AuditLogQueryParams {
            subject_type: Some("invoice".into()),
            ..Default::default()
        };
        assert_matches!(
            bad_subject.into_query(&admin()),
            Err(AppError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn page_beyond_offset_range_is_rejected() {
        let huge_page = AuditLogQueryParams {
            page: Some(i64::MAX / 10),
            ..Default::default()
        };
        assert_matches!(huge_page.into_query(&admin()), Err(AppError::BadRequest(_)));

        let last_page = AuditLogQueryParams {
            page: Some(i64::MAX / 50 + 1),
            ..Default::default()
        };
        let (query, _, _) = last_page.into_query(&admin()).unwrap();
        assert_eq!(query.offset, Some((i64::MAX / 50) * 50));
    }
}
