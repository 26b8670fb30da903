mod error;
mod subscriptions;
mod users;
mod videos;
mod views;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::TokenCodec;
use crate::rate_limit::RateLimitConfig;
use crate::session::SessionManager;

pub use error::ApiError;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    codec: Arc<TokenCodec>,
    sessions: SessionManager,
    secure_cookies: bool,
    rate_limits: Arc<RateLimitConfig>,
) -> Router {
    let users_state = users::UsersState {
        db: db.clone(),
        codec: codec.clone(),
        sessions,
        secure_cookies,
        rate_limits,
    };

    let videos_state = videos::VideosState {
        db: db.clone(),
        codec: codec.clone(),
    };

    let subscriptions_state = subscriptions::SubscriptionsState {
        db: db.clone(),
        codec: codec.clone(),
    };

    let views_state = views::ViewsState { db, codec };

    Router::new()
        .nest("/users", users::router(users_state))
        .nest("/videos", videos::router(videos_state))
        .nest("/subscriptions", subscriptions::router(subscriptions_state))
        .nest("/views", views::router(views_state))
}
