//! Tests for video publishing, listing, view recording and the ownership
//! guard on mutating endpoints.

mod common;

use common::*;
use serde_json::json;

#[tokio::test]
async fn test_publish_and_fetch_video() {
    let (app, _db) = create_test_app().await;
    let alice = register_and_login(&app, "alice").await;

    let uuid = publish_video(&app, &alice, "First video").await;

    let response = send(
        &app,
        "GET",
        &format!("/api/videos/{}", uuid),
        Some(&alice.access_cookie()),
        None,
    )
    .await;
    assert_eq!(response.status(), 200);

    let body = body_json(response).await;
    assert_eq!(body["video"]["title"], "First video");
    assert_eq!(body["video"]["publisher_username"], "alice");
    assert_eq!(body["video"]["published"], true);
}

#[tokio::test]
async fn test_fetching_a_video_records_watch_history() {
    let (app, _db) = create_test_app().await;
    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;

    let uuid = publish_video(&app, &alice, "Watched video").await;

    let response = send(
        &app,
        "GET",
        &format!("/api/videos/{}", uuid),
        Some(&bob.access_cookie()),
        None,
    )
    .await;
    assert_eq!(response.status(), 200);

    let response = send(
        &app,
        "GET",
        "/api/users/watch-history",
        Some(&bob.access_cookie()),
        None,
    )
    .await;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    let history = body["watch_history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["uuid"], uuid.as_str());
    assert_eq!(history[0]["publisher_username"], "alice");

    // The publisher sees bob in the viewer list
    let response = send(
        &app,
        "GET",
        &format!("/api/views/video-viewers/{}", uuid),
        Some(&alice.access_cookie()),
        None,
    )
    .await;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    let viewers = body["viewers"].as_array().unwrap();
    assert_eq!(viewers.len(), 1);
    assert_eq!(viewers[0]["username"], "bob");

    // ...but bob, not the owner, cannot list viewers
    let response = send(
        &app,
        "GET",
        &format!("/api/views/video-viewers/{}", uuid),
        Some(&bob.access_cookie()),
        None,
    )
    .await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_only_the_owner_can_mutate() {
    let (app, _db) = create_test_app().await;
    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;

    let uuid = publish_video(&app, &alice, "Alice's video").await;

    // Bob cannot rename, toggle or delete
    let response = send(
        &app,
        "PATCH",
        &format!("/api/videos/{}/title", uuid),
        Some(&bob.access_cookie()),
        Some(json!({"title": "Bob's now"})),
    )
    .await;
    assert_eq!(response.status(), 403);
    assert_eq!(body_json(response).await["code"], "forbidden");

    let response = send(
        &app,
        "PATCH",
        &format!("/api/videos/{}/toggle-publish", uuid),
        Some(&bob.access_cookie()),
        None,
    )
    .await;
    assert_eq!(response.status(), 403);

    let response = send(
        &app,
        "DELETE",
        &format!("/api/videos/{}", uuid),
        Some(&bob.access_cookie()),
        None,
    )
    .await;
    assert_eq!(response.status(), 403);

    // The same mutations succeed for alice
    let response = send(
        &app,
        "PATCH",
        &format!("/api/videos/{}/title", uuid),
        Some(&alice.access_cookie()),
        Some(json!({"title": "Renamed"})),
    )
    .await;
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(response).await["video"]["title"], "Renamed");

    let response = send(
        &app,
        "DELETE",
        &format!("/api/videos/{}", uuid),
        Some(&alice.access_cookie()),
        None,
    )
    .await;
    assert_eq!(response.status(), 204);

    let response = send(
        &app,
        "GET",
        &format!("/api/videos/{}", uuid),
        Some(&alice.access_cookie()),
        None,
    )
    .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_unpublished_videos_hidden_from_others() {
    let (app, _db) = create_test_app().await;
    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;

    let uuid = publish_video(&app, &alice, "Draft video").await;

    let response = send(
        &app,
        "PATCH",
        &format!("/api/videos/{}/toggle-publish", uuid),
        Some(&alice.access_cookie()),
        None,
    )
    .await;
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(response).await["published"], false);

    // Hidden from bob entirely
    let response = send(
        &app,
        "GET",
        &format!("/api/videos/{}", uuid),
        Some(&bob.access_cookie()),
        None,
    )
    .await;
    assert_eq!(response.status(), 404);

    let response = send(&app, "GET", "/api/videos", Some(&bob.access_cookie()), None).await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 0);

    // Still visible to the owner
    let response = send(
        &app,
        "GET",
        &format!("/api/videos/{}", uuid),
        Some(&alice.access_cookie()),
        None,
    )
    .await;
    assert_eq!(response.status(), 200);

    let response = send(&app, "GET", "/api/videos", Some(&alice.access_cookie()), None).await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_list_filters_and_pagination() {
    let (app, _db) = create_test_app().await;
    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;

    for title in ["Rust tutorial", "Baking bread", "Rust async deep dive"] {
        publish_video(&app, &alice, title).await;
    }
    publish_video(&app, &bob, "Rust for gamers").await;

    // Text filter matches titles across channels
    let response = send(
        &app,
        "GET",
        "/api/videos?query=Rust",
        Some(&alice.access_cookie()),
        None,
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 3);

    // Channel filter narrows to one publisher
    let response = send(
        &app,
        "GET",
        &format!("/api/videos?query=Rust&channel={}", alice.uuid),
        Some(&alice.access_cookie()),
        None,
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 2);

    // Pagination caps the page size but reports the full total
    let response = send(
        &app,
        "GET",
        "/api/videos?page=1&limit=2",
        Some(&alice.access_cookie()),
        None,
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 4);
    assert_eq!(body["videos"].as_array().unwrap().len(), 2);

    let response = send(
        &app,
        "GET",
        "/api/videos?page=2&limit=2",
        Some(&alice.access_cookie()),
        None,
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body["videos"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_publish_rejects_bad_asset_urls() {
    let (app, _db) = create_test_app().await;
    let alice = register_and_login(&app, "alice").await;

    let response = send(
        &app,
        "POST",
        "/api/videos",
        Some(&alice.access_cookie()),
        Some(json!({
            "title": "Bad upload",
            "description": "whoops",
            "video_url": "not a url",
            "thumbnail_url": "https://cdn.example.com/t.jpg",
        })),
    )
    .await;
    assert_eq!(response.status(), 400);
    assert_eq!(body_json(response).await["code"], "bad_request");
}

#[tokio::test]
async fn test_video_endpoints_require_auth() {
    let (app, _db) = create_test_app().await;

    let response = send(&app, "GET", "/api/videos", None, None).await;
    assert_eq!(response.status(), 401);

    let response = send(
        &app,
        "POST",
        "/api/videos",
        None,
        Some(json!({
            "title": "t",
            "description": "d",
            "video_url": "https://cdn.example.com/v.mp4",
            "thumbnail_url": "https://cdn.example.com/t.jpg",
        })),
    )
    .await;
    assert_eq!(response.status(), 401);
}
