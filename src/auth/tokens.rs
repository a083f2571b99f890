//! Session lifecycle: issuing, rotating and revoking token pairs.
//!
//! The refresh token persisted on the user row is the single source of
//! truth for session validity. Issuing a pair overwrites it, so only the
//! most recently issued refresh token can be exchanged.

use axum::http::header;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::claims::TokenKind;
use super::cookies::{token_cookie, SetCookies, ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME};
use super::jwt::JwtKeys;
use crate::error::{ApiError, AppResult};
use crate::users::{model::PublicUser, repo::UserStore};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    /// `Set-Cookie` headers carrying both tokens, each living as long as its token.
    pub fn cookies(&self, keys: &JwtKeys) -> SetCookies {
        [
            (
                header::SET_COOKIE,
                token_cookie(
                    ACCESS_COOKIE_NAME,
                    &self.access_token,
                    keys.ttl(TokenKind::Access),
                ),
            ),
            (
                header::SET_COOKIE,
                token_cookie(
                    REFRESH_COOKIE_NAME,
                    &self.refresh_token,
                    keys.ttl(TokenKind::Refresh),
                ),
            ),
        ]
    }
}

/// Signs a fresh pair for `user_id` and persists the refresh token.
pub async fn issue_tokens(
    keys: &JwtKeys,
    users: &dyn UserStore,
    user_id: Uuid,
) -> AppResult<TokenPair> {
    let access_token = keys.sign_access(user_id)?;
    let refresh_token = keys.sign_refresh(user_id)?;
    users
        .set_refresh_token(user_id, Some(refresh_token.as_str()))
        .await?;
    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Exchanges a refresh token for a new pair.
///
/// The incoming token must verify and must equal the value persisted on
/// the user. Once rotated, the previous token no longer matches.
pub async fn rotate_refresh_token(
    keys: &JwtKeys,
    users: &dyn UserStore,
    incoming: Option<&str>,
) -> AppResult<(PublicUser, TokenPair)> {
    let incoming = incoming
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Validation("Refresh token is required".into()))?;

    let claims = keys.verify_refresh(incoming).map_err(|e| {
        warn!(error = %e, "refresh token rejected");
        ApiError::Unauthorized("Invalid refresh token".into())
    })?;

    let user = users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if user.refresh_token.as_deref() != Some(incoming) {
        warn!(user_id = %user.id, "stale refresh token presented");
        return Err(ApiError::Unauthorized(
            "Refresh token is expired or used".into(),
        ));
    }

    let tokens = issue_tokens(keys, users, user.id).await?;
    info!(user_id = %user.id, "refresh token rotated");
    Ok((user.into(), tokens))
}

/// Clears the persisted refresh token. Safe to repeat.
pub async fn revoke_session(users: &dyn UserStore, user_id: Uuid) -> AppResult<()> {
    users.set_refresh_token(user_id, None).await?;
    info!(user_id = %user_id, "session revoked");
    Ok(())
}
