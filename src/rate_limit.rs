//! Rate limiting for credential endpoints.
//!
//! Token bucket with per-IP tracking to slow down brute force attempts on
//! login, registration and refresh.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};

use crate::api::ApiError;

/// Per-IP keyed limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting configuration for credential endpoints.
pub struct RateLimitConfig {
    /// Per-IP limiter shared by login, register and refresh:
    /// refills at 30 per minute with a burst of 15.
    pub credentials: Arc<IpLimiter>,
}

const CREDENTIALS_PER_MIN: u32 = 30;
const CREDENTIALS_BURST: u32 = 15;

impl RateLimitConfig {
    /// Create rate limiters with default configuration.
    pub fn new() -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(CREDENTIALS_PER_MIN).expect("nonzero"))
            .allow_burst(NonZeroU32::new(CREDENTIALS_BURST).expect("nonzero"));
        Self {
            credentials: Arc::new(RateLimiter::keyed(quota)),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort client IP: first X-Forwarded-For entry when present (the
/// expected deployment is behind a proxy), otherwise the socket address.
/// Requests with neither share one bucket.
fn client_ip(request: &Request) -> String {
    if let Some(value) = request.headers().get("x-forwarded-for") {
        if let Ok(value) = value.to_str() {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware for rate limiting credential endpoints.
pub async fn rate_limit_credentials(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);

    match config.credentials.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => ApiError::rate_limited("Too many authentication attempts. Please wait before trying again.")
            .into_response(),
    }
}
