#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use clipreel::{ServerConfig, db::Database};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const TEST_ACCESS_SECRET: &[u8] = b"access-secret-for-testing-only!!";
pub const TEST_REFRESH_SECRET: &[u8] = b"refresh-secret-for-testing-only!";

/// Create a test app backed by an in-memory database.
pub async fn create_test_app() -> (Router, Database) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        access_secret: TEST_ACCESS_SECRET.to_vec(),
        refresh_secret: TEST_REFRESH_SECRET.to_vec(),
        secure_cookies: false,
        cors_origin: None,
    };
    (clipreel::create_app(&config), db)
}

/// Send a JSON request through the router.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Extract Set-Cookie headers from a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Check whether the Set-Cookie list clears the named cookie (Max-Age=0).
pub fn has_cleared_cookie(cookies: &[String], name: &str) -> bool {
    cookies
        .iter()
        .any(|c| c.starts_with(&format!("{}=", name)) && c.contains("Max-Age=0"))
}

/// An authenticated test user.
pub struct TestSession {
    pub uuid: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestSession {
    /// Cookie header carrying only the access token.
    pub fn access_cookie(&self) -> String {
        format!("accessToken={}", self.access_token)
    }

    /// Cookie header carrying both tokens.
    pub fn cookies(&self) -> String {
        format!(
            "accessToken={}; refreshToken={}",
            self.access_token, self.refresh_token
        )
    }
}

/// Register a user and log in, returning the session tokens.
pub async fn register_and_login(app: &Router, username: &str) -> TestSession {
    let response = send(
        app,
        "POST",
        "/api/users/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "full_name": username,
            "password": "correct horse battery",
        })),
    )
    .await;
    assert_eq!(response.status(), 201, "registration failed");
    let body = body_json(response).await;
    let uuid = body["user"]["uuid"].as_str().unwrap().to_string();

    let response = send(
        app,
        "POST",
        "/api/users/login",
        None,
        Some(json!({
            "identifier": username,
            "password": "correct horse battery",
        })),
    )
    .await;
    assert_eq!(response.status(), 200, "login failed");
    let body = body_json(response).await;

    TestSession {
        uuid,
        access_token: body["access_token"].as_str().unwrap().to_string(),
        refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
    }
}

/// Publish a video as the given session, returning its UUID.
pub async fn publish_video(app: &Router, session: &TestSession, title: &str) -> String {
    let response = send(
        app,
        "POST",
        "/api/videos",
        Some(&session.access_cookie()),
        Some(json!({
            "title": title,
            "description": format!("{} description", title),
            "video_url": "https://cdn.example.com/v.mp4",
            "thumbnail_url": "https://cdn.example.com/t.jpg",
            "duration_secs": 42.5,
        })),
    )
    .await;
    assert_eq!(response.status(), 201, "publish failed");
    let body = body_json(response).await;
    body["video"]["uuid"].as_str().unwrap().to_string()
}
