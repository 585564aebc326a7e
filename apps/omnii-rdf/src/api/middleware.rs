//! # Middleware Module
//!
//! Global request throttling for the HTTP API.
//!
//! ## Configuration
//!
//! - `OMNII_RDF_RATE_LIMIT`: requests per second across all clients
//!   (default 100, `0` disables throttling)

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Environment variable holding the request budget.
pub const RATE_LIMIT_ENV: &str = "OMNII_RDF_RATE_LIMIT";

const DEFAULT_RATE_LIMIT: u32 = 100;

/// Shared, unkeyed token bucket.
pub type RequestLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Requests per second from the environment.
///
/// Unset or unparsable values fall back to the default.
pub fn rate_limit_from_env() -> u32 {
    std::env::var(RATE_LIMIT_ENV)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RATE_LIMIT)
}

/// A limiter allowing `per_second` requests, or `None` when `0`.
pub fn build_rate_limiter(per_second: u32) -> Option<RequestLimiter> {
    NonZeroU32::new(per_second).map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))))
}

/// Answer 429 once the bucket is empty.
pub async fn throttle(
    State(limiter): State<RequestLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if limiter.check().is_ok() {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
        Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
    }
}

// =============================================================================
// TESTS
// =============================================================================
