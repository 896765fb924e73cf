//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use warden_core::error::CoreError;
use warden_core::roles::is_privileged;
use warden_core::types::DbId;

use crate::auth::jwt::{validate_token, JwtConfig};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's role name (e.g. `"admin"`, `"user"`).
    pub role: String,
}

impl AuthUser {
    /// Admins see every audit record; everyone else only their own.
    pub fn is_privileged(&self) -> bool {
        is_privileged(&self.role)
    }

    /// Resolve the caller from request headers.
    pub fn from_headers(headers: &HeaderMap, config: &JwtConfig) -> Result<Self, AppError> {
        let auth_header = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, config).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }

    /// Like [`AuthUser::from_headers`], but any failure means anonymous.
    pub fn optional_from_headers(headers: &HeaderMap, config: &JwtConfig) -> Option<Self> {
        Self::from_headers(headers, config).ok()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers, &state.config.jwt)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    use super::*;
    use crate::auth::jwt::generate_access_token;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "middleware-test-secret".into(),
            access_token_expiry_mins: 5,
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_resolves_user() {
        let config = config();
        let token = generate_access_token(12, "admin", &config).unwrap();

        let user = AuthUser::from_headers(&headers_with(&format!("Bearer {token}")), &config)
            .expect("valid token");

        assert_eq!(user.user_id, 12);
        assert!(user.is_privileged());
    }

    #[test]
    fn missing_header_is_unauthorized() {
        assert_matches!(
            AuthUser::from_headers(&HeaderMap::new(), &config()),
            Err(AppError::Core(CoreError::Unauthorized(_)))
        );
    }

    #[test]
    fn wrong_scheme_is_unauthorized() {
        assert_matches!(
            AuthUser::from_headers(&headers_with("Basic dXNlcjpwdw=="), &config()),
            Err(AppError::Core(CoreError::Unauthorized(_)))
        );
    }

    #[test]
    fn invalid_token_is_anonymous_when_optional() {
        assert!(AuthUser::optional_from_headers(&headers_with("Bearer nope"), &config()).is_none());
    }
}
