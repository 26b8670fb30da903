//! User account and session API.
//!
//! Registration, the login/refresh/logout session endpoints, profile
//! management, channel profiles, and watch history. Session endpoints are
//! the only place auth cookies are set or cleared.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt};
use crate::auth::{
    ACCESS_COOKIE_NAME, Auth, CurrentUser, MaybeAuth, REFRESH_COOKIE_NAME, auth_cookie,
    clear_cookie, extract_token,
};
use crate::db::{Database, WatchedVideo};
use crate::impl_has_auth_state;
use crate::jwt::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, TokenCodec};
use crate::password::hash_password;
use crate::rate_limit::{RateLimitConfig, rate_limit_credentials};
use crate::session::{SessionManager, SessionTokens, normalize_identifier};

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub codec: Arc<TokenCodec>,
    pub sessions: SessionManager,
    pub secure_cookies: bool,
    pub rate_limits: Arc<RateLimitConfig>,
}

impl_has_auth_state!(UsersState);

pub fn router(state: UsersState) -> Router {
    // Credential endpoints are the brute-force surface; they get per-IP
    // rate limiting.
    let credential_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limits.clone(),
            rate_limit_credentials,
        ));

    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/password", patch(change_password))
        .route("/email", patch(change_email))
        .route("/full-name", patch(change_full_name))
        .route("/", delete(delete_account))
        .route("/channel/{username}", get(channel_profile))
        .route("/watch-history", get(watch_history))
        .with_state(state)
        .merge(credential_routes)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct RegisterRequest {
    username: String,
    email: String,
    full_name: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    /// Username or email; `username`/`email` accepted as aliases.
    identifier: Option<String>,
    username: Option<String>,
    email: Option<String>,
    password: String,
}

#[derive(Serialize)]
struct UserResponse {
    user: CurrentUser,
}

#[derive(Serialize)]
struct LoginResponse {
    user: CurrentUser,
    access_token: String,
    refresh_token: String,
}

#[derive(Serialize)]
struct TokenPairResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Deserialize)]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}

#[derive(Deserialize)]
struct ChangeEmailRequest {
    email: String,
}

#[derive(Deserialize)]
struct ChangeFullNameRequest {
    full_name: String,
}

#[derive(Serialize)]
struct ChannelProfileResponse {
    uuid: String,
    username: String,
    full_name: String,
    subscriber_count: i64,
    subscribed_count: i64,
    is_subscribed: bool,
}

#[derive(Serialize)]
struct WatchHistoryResponse {
    watch_history: Vec<WatchedVideo>,
}

// --- Helpers ---

const MIN_PASSWORD_LENGTH: usize = 8;

fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.len() < 3 || username.len() > 32 {
        return Err(ApiError::bad_request(
            "Username must be between 3 and 32 characters",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ApiError::bad_request(
            "Username may only contain letters, digits and underscores",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.len() > 254 || !email.contains('@') {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Append the session cookies to a response. Max-Age mirrors each token's
/// TTL.
fn append_session_cookies(response: &mut Response, tokens: &SessionTokens, secure: bool) {
    let cookies = [
        auth_cookie(
            ACCESS_COOKIE_NAME,
            &tokens.access.token,
            ACCESS_TOKEN_TTL_SECS,
            secure,
        ),
        auth_cookie(
            REFRESH_COOKIE_NAME,
            &tokens.refresh.token,
            REFRESH_TOKEN_TTL_SECS,
            secure,
        ),
    ];
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
}

/// Append cookie-clearing headers (Max-Age=0) for both auth cookies.
fn append_clear_cookies(response: &mut Response, secure: bool) {
    for name in [ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME] {
        if let Ok(value) = HeaderValue::from_str(&clear_cookie(name, secure)) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
}

// --- Handlers ---

async fn register(
    State(state): State<UsersState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = normalize_identifier(&payload.username);
    let email = normalize_identifier(&payload.email);
    let full_name = payload.full_name.trim();

    validate_username(&username)?;
    validate_email(&email)?;
    validate_password(&payload.password)?;
    if full_name.is_empty() {
        return Err(ApiError::bad_request("Full name is required"));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|e| ApiError::internal_error("Failed to hash password", e))?;
    let uuid = uuid::Uuid::new_v4().to_string();

    let id = state
        .db
        .users()
        .create(&uuid, &username, &email, full_name, &password_hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("User with that username or email already exists")
            } else {
                ApiError::db_error("Failed to create user", e)
            }
        })?;

    let user = state
        .db
        .users()
        .get_by_id(id)
        .await
        .db_err("Failed to load created user")?
        .ok_or_else(|| ApiError::internal("Created user not found"))?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse { user: user.into() }),
    ))
}

async fn login(
    State(state): State<UsersState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let identifier = payload
        .identifier
        .or(payload.username)
        .or(payload.email)
        .ok_or_else(|| ApiError::bad_request("Username or email is required"))?;

    let (user, tokens) = state.sessions.login(&identifier, &payload.password).await?;

    let mut response = Json(LoginResponse {
        user,
        access_token: tokens.access.token.clone(),
        refresh_token: tokens.refresh.token.clone(),
    })
    .into_response();
    append_session_cookies(&mut response, &tokens, state.secure_cookies);

    Ok(response)
}

async fn refresh(
    State(state): State<UsersState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let old_token = extract_token(&headers, REFRESH_COOKIE_NAME)
        .ok_or_else(|| ApiError::unauthenticated("No refresh token"))?;

    let tokens = state.sessions.refresh(old_token).await?;

    let mut response = Json(TokenPairResponse {
        access_token: tokens.access.token.clone(),
        refresh_token: tokens.refresh.token.clone(),
    })
    .into_response();
    append_session_cookies(&mut response, &tokens, state.secure_cookies);

    Ok(response)
}

async fn logout(
    State(state): State<UsersState>,
    Auth(user): Auth,
) -> Result<Response, ApiError> {
    state.sessions.logout(user.id).await?;

    let mut response = Json(MessageResponse {
        message: "Logged out",
    })
    .into_response();
    append_clear_cookies(&mut response, state.secure_cookies);

    Ok(response)
}

async fn me(Auth(user): Auth) -> impl IntoResponse {
    Json(UserResponse { user })
}

async fn change_password(
    State(state): State<UsersState>,
    Auth(user): Auth,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&payload.new_password)?;

    let record = state
        .db
        .users()
        .get_by_id(user.id)
        .await
        .db_err("Failed to load user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let old_ok = crate::password::verify_password(&payload.old_password, &record.password_hash)
        .map_err(|e| ApiError::internal_error("Failed to verify password", e))?;
    if !old_ok {
        return Err(ApiError::bad_request("Invalid old password"));
    }

    let new_hash = hash_password(&payload.new_password)
        .map_err(|e| ApiError::internal_error("Failed to hash password", e))?;
    state
        .db
        .users()
        .set_password_hash(user.id, &new_hash)
        .await
        .db_err("Failed to update password")?;

    Ok(Json(MessageResponse {
        message: "Password changed",
    }))
}

async fn change_email(
    State(state): State<UsersState>,
    Auth(user): Auth,
    Json(payload): Json<ChangeEmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_identifier(&payload.email);
    validate_email(&email)?;

    state
        .db
        .users()
        .set_email(user.id, &email)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("Email already in use")
            } else {
                ApiError::db_error("Failed to update email", e)
            }
        })?;

    let user = state
        .db
        .users()
        .get_by_id(user.id)
        .await
        .db_err("Failed to load user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserResponse { user: user.into() }))
}

async fn change_full_name(
    State(state): State<UsersState>,
    Auth(user): Auth,
    Json(payload): Json<ChangeFullNameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let full_name = payload.full_name.trim();
    if full_name.is_empty() {
        return Err(ApiError::bad_request("Full name is required"));
    }

    state
        .db
        .users()
        .set_full_name(user.id, full_name)
        .await
        .db_err("Failed to update full name")?;

    let user = state
        .db
        .users()
        .get_by_id(user.id)
        .await
        .db_err("Failed to load user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserResponse { user: user.into() }))
}

async fn delete_account(
    State(state): State<UsersState>,
    Auth(user): Auth,
) -> Result<Response, ApiError> {
    // Owned videos, subscriptions and view rows cascade with the user row.
    state
        .db
        .users()
        .delete(user.id)
        .await
        .db_err("Failed to delete user")?;

    let mut response = Json(MessageResponse {
        message: "Account deleted",
    })
    .into_response();
    append_clear_cookies(&mut response, state.secure_cookies);

    Ok(response)
}

async fn channel_profile(
    State(state): State<UsersState>,
    MaybeAuth(viewer): MaybeAuth,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let username = normalize_identifier(&username);
    if username.is_empty() {
        return Err(ApiError::bad_request("Username is missing"));
    }

    let channel = state
        .db
        .users()
        .get_by_username(&username)
        .await
        .db_err("Failed to load channel")?
        .ok_or_else(|| ApiError::not_found("Channel does not exist"))?;

    let subscriptions = state.db.subscriptions();
    let subscriber_count = subscriptions
        .subscriber_count(channel.id)
        .await
        .db_err("Failed to count subscribers")?;
    let subscribed_count = subscriptions
        .subscribed_count(channel.id)
        .await
        .db_err("Failed to count subscriptions")?;
    let is_subscribed = match &viewer {
        Some(viewer) => subscriptions
            .is_subscribed(viewer.id, channel.id)
            .await
            .db_err("Failed to check subscription")?,
        None => false,
    };

    Ok(Json(ChannelProfileResponse {
        uuid: channel.uuid,
        username: channel.username,
        full_name: channel.full_name,
        subscriber_count,
        subscribed_count,
        is_subscribed,
    }))
}

async fn watch_history(
    State(state): State<UsersState>,
    Auth(user): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let watch_history = state
        .db
        .views()
        .watch_history(user.id)
        .await
        .db_err("Failed to load watch history")?;

    Ok(Json(WatchHistoryResponse { watch_history }))
}
