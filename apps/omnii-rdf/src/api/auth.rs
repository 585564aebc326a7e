//! # Authentication Module
//!
//! Optional bearer-key authentication for the HTTP API.
//!
//! ## Configuration
//!
//! - `OMNII_RDF_API_KEY`: if set and non-empty, every route except
//!   `/health` requires `Authorization: Bearer <key>` (a bare `<key>` is
//!   accepted too)

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Environment variable holding the expected key.
pub const API_KEY_ENV: &str = "OMNII_RDF_API_KEY";

/// Routes reachable without a key (load balancer health checks).
const PUBLIC_PATHS: &[&str] = &["/health"];

// =============================================================================
// API KEY
// =============================================================================

/// The configured key. Never printed.
#[derive(Clone)]
pub struct ApiKey(Arc<[u8]>);

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl ApiKey {
    /// `None` for an empty key.
    #[must_use]
    pub fn new(key: &str) -> Option<Self> {
        (!key.is_empty()).then(|| Self(Arc::from(key.as_bytes())))
    }

    /// Read `OMNII_RDF_API_KEY`; unset or empty disables authentication.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var(API_KEY_ENV).ok().and_then(|k| Self::new(&k))
    }

    /// Constant-time comparison.
    ///
    /// Both sides are padded to the same length first, so the comparison
    /// always covers the same number of bytes regardless of input.
    #[must_use]
    pub fn matches(&self, provided: &str) -> bool {
        let expected = &self.0[..];
        let provided = provided.as_bytes();
        let width = expected.len().max(provided.len());

        let mut lhs = vec![0u8; width];
        let mut rhs = vec![0u8; width];
        lhs[..expected.len()].copy_from_slice(expected);
        rhs[..provided.len()].copy_from_slice(provided);

        let same_bytes: bool = lhs.ct_eq(&rhs).into();
        same_bytes && expected.len() == provided.len()
    }
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Reject requests without the configured key.
pub async fn require_api_key(
    State(key): State<ApiKey>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));

    match provided {
        Some(candidate) if key.matches(candidate) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_api_key",
                path = %request.uri().path(),
                "Authentication failed: invalid API key"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                path = %request.uri().path(),
                "Missing Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
