//! Authentication rejection types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Why authentication failed, used by the extractors.
///
/// Expired tokens are reported under their own code so clients know to hit
/// the refresh endpoint instead of sending the user back to login. The
/// middleware never clears cookies or renews tokens; it is a pure gate.
#[derive(Debug)]
pub enum AuthErrorKind {
    /// No token in the cookie or Authorization header
    MissingToken,
    /// Token failed signature or shape checks
    InvalidToken,
    /// Token verified but is past its expiry
    ExpiredToken,
    /// Token verified but the subject no longer exists
    UserGone,
    /// Store failure while loading the identity
    StoreError,
}

/// Rejection returned by the auth extractors.
#[derive(Debug)]
pub struct AuthError {
    kind: AuthErrorKind,
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self.kind {
            AuthErrorKind::MissingToken
            | AuthErrorKind::InvalidToken
            | AuthErrorKind::ExpiredToken
            | AuthErrorKind::UserGone => StatusCode::UNAUTHORIZED,
            AuthErrorKind::StoreError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::ExpiredToken => "token_expired",
            AuthErrorKind::StoreError => "internal",
            _ => "unauthenticated",
        }
    }

    fn message(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::MissingToken => "Not authenticated",
            AuthErrorKind::InvalidToken => "Invalid access token",
            AuthErrorKind::ExpiredToken => "Access token expired",
            AuthErrorKind::UserGone => "Invalid access token",
            AuthErrorKind::StoreError => "Internal error",
        }
    }
}

impl From<AuthErrorKind> for AuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self { kind }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    error: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorResponse {
                code: self.code(),
                error: self.message(),
            }),
        )
            .into_response()
    }
}
