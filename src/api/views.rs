//! View records API: who watched an owned video, and what the caller has
//! watched.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use crate::auth::{Auth, require_video_owner};
use crate::db::{Database, ViewerEntry, WatchedVideo};
use crate::impl_has_auth_state;
use crate::jwt::TokenCodec;

#[derive(Clone)]
pub struct ViewsState {
    pub db: Database,
    pub codec: Arc<TokenCodec>,
}

impl_has_auth_state!(ViewsState);

pub fn router(state: ViewsState) -> Router {
    Router::new()
        .route("/video-viewers/{video_uuid}", get(video_viewers))
        .route("/watched-videos", get(watched_videos))
        .with_state(state)
}

#[derive(Serialize)]
struct VideoViewersResponse {
    video_uuid: String,
    viewers: Vec<ViewerEntry>,
}

#[derive(Serialize)]
struct WatchedVideosResponse {
    watched_videos: Vec<WatchedVideo>,
}

/// Viewer lists are publisher-only data; the ownership guard gates them.
async fn video_viewers(
    State(state): State<ViewsState>,
    Auth(user): Auth,
    Path(video_uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&video_uuid)?;

    let video = require_video_owner(&state.db, &video_uuid, user.id).await?;
    let viewers = state
        .db
        .views()
        .viewers_of_video(video.id)
        .await
        .db_err("Failed to list viewers")?;

    Ok(Json(VideoViewersResponse {
        video_uuid: video.uuid,
        viewers,
    }))
}

async fn watched_videos(
    State(state): State<ViewsState>,
    Auth(user): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let watched_videos = state
        .db
        .views()
        .watch_history(user.id)
        .await
        .db_err("Failed to load watched videos")?;

    Ok(Json(WatchedVideosResponse { watched_videos }))
}
