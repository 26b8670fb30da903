//! Subscription API: follow/unfollow channels and list both directions.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use crate::auth::Auth;
use crate::db::{ChannelSummary, Database};
use crate::impl_has_auth_state;
use crate::jwt::TokenCodec;

#[derive(Clone)]
pub struct SubscriptionsState {
    pub db: Database,
    pub codec: Arc<TokenCodec>,
}

impl_has_auth_state!(SubscriptionsState);

pub fn router(state: SubscriptionsState) -> Router {
    Router::new()
        .route("/c/{channel_uuid}", post(toggle_subscription))
        .route("/subscribed-channels", get(subscribed_channels))
        .route("/channel-subscribers", get(channel_subscribers))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct PageParams {
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Serialize)]
struct ToggleResponse {
    channel_uuid: String,
    subscribed: bool,
}

#[derive(Serialize)]
struct SubscribedChannelsResponse {
    channels: Vec<ChannelSummary>,
    total: i64,
    page: i64,
    limit: i64,
}

#[derive(Serialize)]
struct ChannelSubscribersResponse {
    subscribers: Vec<ChannelSummary>,
    total: i64,
    page: i64,
    limit: i64,
}

fn page_params(params: &PageParams) -> (i64, i64) {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 50);
    (page, limit)
}

// --- Handlers ---

async fn toggle_subscription(
    State(state): State<SubscriptionsState>,
    Auth(user): Auth,
    Path(channel_uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&channel_uuid)?;

    let channel = state
        .db
        .users()
        .get_by_uuid(&channel_uuid)
        .await
        .db_err("Failed to load channel")?
        .ok_or_else(|| ApiError::not_found("Channel does not exist"))?;

    if channel.id == user.id {
        return Err(ApiError::bad_request(
            "You cannot subscribe to your own channel",
        ));
    }

    let subscribed = state
        .db
        .subscriptions()
        .toggle(user.id, channel.id)
        .await
        .db_err("Failed to toggle subscription")?;

    Ok(Json(ToggleResponse {
        channel_uuid: channel.uuid,
        subscribed,
    }))
}

async fn subscribed_channels(
    State(state): State<SubscriptionsState>,
    Auth(user): Auth,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&params);

    let (channels, total) = state
        .db
        .subscriptions()
        .subscribed_channels(user.id, page, limit)
        .await
        .db_err("Failed to list subscribed channels")?;

    Ok(Json(SubscribedChannelsResponse {
        channels,
        total,
        page,
        limit,
    }))
}

async fn channel_subscribers(
    State(state): State<SubscriptionsState>,
    Auth(user): Auth,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(&params);

    let (subscribers, total) = state
        .db
        .subscriptions()
        .channel_subscribers(user.id, page, limit)
        .await
        .db_err("Failed to list channel subscribers")?;

    Ok(Json(ChannelSubscribersResponse {
        subscribers,
        total,
        page,
        limit,
    }))
}
