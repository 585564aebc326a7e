//! # HTTP API Module
//!
//! JSON API over a shared [`KnowledgeBase`].
//!
//! ## Endpoints
//!
//! - `GET /health` - Liveness, store size and cache size
//! - `POST /query` - Run a SELECT query
//! - `POST /import-rdf` - Merge a Turtle or N-Triples document
//! - `POST /evolve-concept` - Attach facts to a concept
//! - `POST /analyze-brain-memory` - Insights over a working-memory snapshot
//! - `POST /api/rdf/analyze` - Node-processing concepts plus working-memory insights
//! - `GET /ontology` - Serialize the base graph
//! - `GET /metrics` - Store, cache and ontology counts
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `OMNII_RDF_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `OMNII_RDF_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `OMNII_RDF_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_ENV, ApiKey};
pub use middleware::{RATE_LIMIT_ENV, build_rate_limiter, rate_limit_from_env};
pub use types::{HealthResponse, OntologyParams, OntologyResponse};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use omnii_rdf_core::{KnowledgeBase, RdfError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Environment variable holding the allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "OMNII_RDF_CORS_ORIGINS";

/// Request bodies above this are refused before deserialization.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// How often expired cache entries are swept while serving.
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
///
/// Queries, analyses and metrics share the read side of the lock;
/// imports and evolutions take the write side.
#[derive(Clone)]
pub struct AppState {
    pub knowledge: Arc<RwLock<KnowledgeBase>>,
}

impl AppState {
    #[must_use]
    pub fn new(knowledge: KnowledgeBase) -> Self {
        Self {
            knowledge: Arc::new(RwLock::new(knowledge)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `OMNII_RDF_CORS_ORIGINS`.
///
/// - `*`: any origin
/// - unset: localhost only
/// - otherwise: the comma-separated origins that parse
fn build_cors_layer() -> CorsLayer {
    match std::env::var(CORS_ORIGINS_ENV).ok().as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins ({CORS_ORIGINS_ENV}=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", origin);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins in {CORS_ORIGINS_ENV}, using localhost");
                build_localhost_cors()
            } else {
                restricted_cors(allowed)
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();
    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Body limit
/// 4. Rate limiting (if enabled)
/// 5. Authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/query", post(handlers::query_handler))
        .route("/import-rdf", post(handlers::import_handler))
        .route("/evolve-concept", post(handlers::evolve_handler))
        .route("/analyze-brain-memory", post(handlers::analyze_handler))
        .route("/api/rdf/analyze", post(handlers::analyze_nodes_handler))
        .route("/ontology", get(handlers::ontology_handler))
        .route("/metrics", get(handlers::metrics_handler));

    match ApiKey::from_env() {
        Some(key) => {
            tracing::info!("API key authentication enabled");
            router = router.layer(axum_middleware::from_fn_with_state(
                key,
                auth::require_api_key,
            ));
        }
        None => {
            tracing::warn!(
                "API key authentication DISABLED - set {API_KEY_ENV} to require a bearer key"
            );
        }
    }

    let rate_limit = rate_limit_from_env();
    match build_rate_limiter(rate_limit) {
        Some(limiter) => {
            tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
            router = router.layer(axum_middleware::from_fn_with_state(
                limiter,
                middleware::throttle,
            ));
        }
        None => tracing::info!("Rate limiting disabled"),
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(BODY_LIMIT))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve until Ctrl-C.
pub async fn run_server(addr: &str, knowledge: KnowledgeBase) -> Result<(), RdfError> {
    let state = AppState::new(knowledge);
    let sweeper = spawn_cache_sweeper(state.clone());
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RdfError::Io(format!("Bind failed: {e}")))?;

    tracing::info!("Omnii RDF HTTP server listening on {}", addr);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RdfError::Io(format!("Server error: {e}")));
    sweeper.abort();
    served
}

/// Periodically drop expired cache entries.
fn spawn_cache_sweeper(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CACHE_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = state.knowledge.read().await.purge_expired_cache();
            if purged > 0 {
                tracing::debug!(purged, "Expired cache entries removed");
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
