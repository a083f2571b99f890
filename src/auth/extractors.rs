use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use tracing::warn;

use super::cookies::{get_cookie, ACCESS_COOKIE_NAME};
use super::jwt::JwtKeys;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::{model::PublicUser, repo::UserStore};

/// The authenticated caller, loaded from the store and sanitized.
///
/// Every failure (no token, bad signature, expired, unknown user, store
/// error) is rejected with the same 401 so callers cannot tell which check
/// failed.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub PublicUser);

/// Access token from the `accessToken` cookie, else from `Authorization: Bearer`.
fn access_token(headers: &HeaderMap) -> Option<&str> {
    get_cookie(headers, ACCESS_COOKIE_NAME).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })
}

async fn authenticate(parts: &Parts, state: &AppState) -> anyhow::Result<PublicUser> {
    let token = access_token(&parts.headers).ok_or_else(|| anyhow::anyhow!("no access token"))?;
    let claims = JwtKeys::from_ref(state).verify_access(token)?;
    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {} no longer exists", claims.sub))?;
    Ok(user.into())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(e) => {
                warn!(error = %e, "request rejected by auth gate");
                Err(ApiError::Unauthorized("Unauthorized request".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("accessToken=from-cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(access_token(&headers), Some("from-cookie"));
    }

    #[test]
    fn bearer_header_is_used_without_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(access_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(access_token(&headers), None);
    }
}
