//! Video API.
//!
//! All endpoints require authentication; mutations additionally require
//! ownership of the video. Media bytes are uploaded to an external blob
//! store by the client; this API only records their URLs.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use crate::auth::{Auth, require_video_owner};
use crate::db::{Database, VideoDetail};
use crate::impl_has_auth_state;
use crate::jwt::TokenCodec;

#[derive(Clone)]
pub struct VideosState {
    pub db: Database,
    pub codec: Arc<TokenCodec>,
}

impl_has_auth_state!(VideosState);

pub fn router(state: VideosState) -> Router {
    Router::new()
        .route("/", get(list_videos))
        .route("/", post(publish_video))
        .route("/{uuid}", get(get_video))
        .route("/{uuid}", delete(delete_video))
        .route("/{uuid}/title", patch(change_title))
        .route("/{uuid}/description", patch(change_description))
        .route("/{uuid}/video-file", patch(change_video_file))
        .route("/{uuid}/thumbnail", patch(change_thumbnail))
        .route("/{uuid}/toggle-publish", patch(toggle_publish))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct ListParams {
    page: Option<i64>,
    limit: Option<i64>,
    query: Option<String>,
    /// Publisher (channel) UUID filter
    channel: Option<String>,
    /// "asc" or "desc" by creation time; newest first by default
    sort: Option<String>,
}

#[derive(Serialize)]
struct VideoListResponse {
    videos: Vec<VideoDetail>,
    total: i64,
    page: i64,
    limit: i64,
}

#[derive(Deserialize)]
struct PublishVideoRequest {
    title: String,
    description: String,
    video_url: String,
    thumbnail_url: String,
    #[serde(default)]
    duration_secs: f64,
}

#[derive(Serialize)]
struct VideoResponse {
    video: VideoDetail,
}

#[derive(Deserialize)]
struct ChangeTitleRequest {
    title: String,
}

#[derive(Deserialize)]
struct ChangeDescriptionRequest {
    description: String,
}

#[derive(Deserialize)]
struct ChangeVideoFileRequest {
    video_url: String,
    #[serde(default)]
    duration_secs: f64,
}

#[derive(Deserialize)]
struct ChangeThumbnailRequest {
    thumbnail_url: String,
}

#[derive(Serialize)]
struct TogglePublishResponse {
    uuid: String,
    published: bool,
}

// --- Helpers ---

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 50;

fn page_params(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

/// Asset locations must be absolute http(s) URLs into the blob store.
fn validate_asset_url(raw: &str, what: &str) -> Result<(), ApiError> {
    match url::Url::parse(raw) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        _ => Err(ApiError::bad_request(format!(
            "{} must be a valid http(s) URL",
            what
        ))),
    }
}

async fn load_detail(db: &Database, uuid: &str) -> Result<VideoDetail, ApiError> {
    db.videos()
        .get_detail(uuid)
        .await
        .db_err("Failed to load video")?
        .ok_or_else(|| ApiError::not_found("Video not found"))
}

// --- Handlers ---

async fn list_videos(
    State(state): State<VideosState>,
    Auth(user): Auth,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(params.page, params.limit);
    let newest_first = params.sort.as_deref() != Some("asc");
    let query = params.query.as_deref().filter(|q| !q.trim().is_empty());

    let (videos, total) = state
        .db
        .videos()
        .list(
            user.id,
            query,
            params.channel.as_deref(),
            newest_first,
            page,
            limit,
        )
        .await
        .db_err("Failed to list videos")?;

    Ok(Json(VideoListResponse {
        videos,
        total,
        page,
        limit,
    }))
}

async fn publish_video(
    State(state): State<VideosState>,
    Auth(user): Auth,
    Json(payload): Json<PublishVideoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = payload.title.trim();
    let description = payload.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(ApiError::bad_request(
            "Title and description are both required",
        ));
    }
    validate_asset_url(&payload.video_url, "Video URL")?;
    validate_asset_url(&payload.thumbnail_url, "Thumbnail URL")?;
    if payload.duration_secs < 0.0 {
        return Err(ApiError::bad_request("Duration cannot be negative"));
    }

    let uuid = uuid::Uuid::new_v4().to_string();
    state
        .db
        .videos()
        .create(
            &uuid,
            user.id,
            title,
            description,
            &payload.video_url,
            &payload.thumbnail_url,
            payload.duration_secs,
        )
        .await
        .db_err("Failed to create video")?;

    let video = load_detail(&state.db, &uuid).await?;
    Ok((StatusCode::CREATED, Json(VideoResponse { video })))
}

async fn get_video(
    State(state): State<VideosState>,
    Auth(user): Auth,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;

    let video = state
        .db
        .videos()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load video")?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    // Unpublished videos exist only for their owner.
    if !video.published && video.publisher_id != user.id {
        return Err(ApiError::not_found("Video not found"));
    }

    state
        .db
        .views()
        .record(video.id, video.publisher_id, user.id)
        .await
        .db_err("Failed to record view")?;

    let video = load_detail(&state.db, &uuid).await?;
    Ok(Json(VideoResponse { video }))
}

async fn change_title(
    State(state): State<VideosState>,
    Auth(user): Auth,
    Path(uuid): Path<String>,
    Json(payload): Json<ChangeTitleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title is missing"));
    }

    let video = require_video_owner(&state.db, &uuid, user.id).await?;
    state
        .db
        .videos()
        .update_title(video.id, title)
        .await
        .db_err("Failed to update title")?;

    let video = load_detail(&state.db, &uuid).await?;
    Ok(Json(VideoResponse { video }))
}

async fn change_description(
    State(state): State<VideosState>,
    Auth(user): Auth,
    Path(uuid): Path<String>,
    Json(payload): Json<ChangeDescriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;
    let description = payload.description.trim();
    if description.is_empty() {
        return Err(ApiError::bad_request("Description is missing"));
    }

    let video = require_video_owner(&state.db, &uuid, user.id).await?;
    state
        .db
        .videos()
        .update_description(video.id, description)
        .await
        .db_err("Failed to update description")?;

    let video = load_detail(&state.db, &uuid).await?;
    Ok(Json(VideoResponse { video }))
}

async fn change_video_file(
    State(state): State<VideosState>,
    Auth(user): Auth,
    Path(uuid): Path<String>,
    Json(payload): Json<ChangeVideoFileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;
    validate_asset_url(&payload.video_url, "Video URL")?;
    if payload.duration_secs < 0.0 {
        return Err(ApiError::bad_request("Duration cannot be negative"));
    }

    let video = require_video_owner(&state.db, &uuid, user.id).await?;
    state
        .db
        .videos()
        .update_video_file(video.id, &payload.video_url, payload.duration_secs)
        .await
        .db_err("Failed to update video file")?;

    let video = load_detail(&state.db, &uuid).await?;
    Ok(Json(VideoResponse { video }))
}

async fn change_thumbnail(
    State(state): State<VideosState>,
    Auth(user): Auth,
    Path(uuid): Path<String>,
    Json(payload): Json<ChangeThumbnailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;
    validate_asset_url(&payload.thumbnail_url, "Thumbnail URL")?;

    let video = require_video_owner(&state.db, &uuid, user.id).await?;
    state
        .db
        .videos()
        .update_thumbnail(video.id, &payload.thumbnail_url)
        .await
        .db_err("Failed to update thumbnail")?;

    let video = load_detail(&state.db, &uuid).await?;
    Ok(Json(VideoResponse { video }))
}

async fn toggle_publish(
    State(state): State<VideosState>,
    Auth(user): Auth,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;

    let video = require_video_owner(&state.db, &uuid, user.id).await?;
    let published = state
        .db
        .videos()
        .toggle_published(video.id)
        .await
        .db_err("Failed to toggle publish status")?;

    Ok(Json(TogglePublishResponse {
        uuid: video.uuid,
        published,
    }))
}

async fn delete_video(
    State(state): State<VideosState>,
    Auth(user): Auth,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;

    let video = require_video_owner(&state.db, &uuid, user.id).await?;
    // View rows cascade with the video row.
    state
        .db
        .videos()
        .delete(video.id)
        .await
        .db_err("Failed to delete video")?;

    Ok(StatusCode::NO_CONTENT)
}
