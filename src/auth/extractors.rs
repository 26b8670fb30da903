//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::cookie::{ACCESS_COOKIE_NAME, extract_token};
use super::errors::{AuthError, AuthErrorKind};
use super::state::HasAuthState;
use super::types::CurrentUser;
use crate::jwt::{TokenError, TokenKind};

/// Core authentication logic shared by the extractors.
///
/// Verifies the access token and resolves the identity. No side effects:
/// expired tokens are rejected, never renewed inline - clients go through
/// the refresh endpoint.
async fn authenticate_request<S>(parts: &Parts, state: &S) -> Result<CurrentUser, AuthErrorKind>
where
    S: HasAuthState + Sync,
{
    let token =
        extract_token(&parts.headers, ACCESS_COOKIE_NAME).ok_or(AuthErrorKind::MissingToken)?;

    let claims = state
        .codec()
        .verify(token, TokenKind::Access)
        .map_err(|e| match e {
            TokenError::Expired => AuthErrorKind::ExpiredToken,
            _ => AuthErrorKind::InvalidToken,
        })?;

    // A deleted account can still hold a well-signed token; reject it here.
    let user = state
        .db()
        .users()
        .get_by_uuid(&claims.sub)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load user for auth: {}", e);
            AuthErrorKind::StoreError
        })?
        .ok_or(AuthErrorKind::UserGone)?;

    Ok(CurrentUser::from(user))
}

/// Extractor for endpoints that require authentication.
/// Rejects with 401 JSON errors; never touches cookies.
pub struct Auth(pub CurrentUser);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthState + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate_request(parts, state)
            .await
            .map(Auth)
            .map_err(AuthError::from)
    }
}

/// Optional authentication extractor - never fails, yields
/// `Option<CurrentUser>`. For endpoints that personalize their response but
/// work unauthenticated too.
pub struct MaybeAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for MaybeAuth
where
    S: HasAuthState + Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(authenticate_request(parts, state).await.ok()))
    }
}
