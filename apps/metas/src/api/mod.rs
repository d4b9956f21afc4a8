//! # Metas HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET  /health` - Health check (no auth)
//! - `POST /auth/login` - Open a session (no auth)
//! - `GET  /me` - Caller's profile
//! - `GET  /krs` - Visible KRs with derived progress
//! - `POST /krs` - Create a KR
//! - `GET  /krs/{id}` - KR detail with monthly buckets
//! - `POST /krs/{id}/checkpoints` - Append a checkpoint
//! - `GET  /dashboard` - Team rollup dashboard
//! - `GET  /teams` - List teams
//! - `GET  /watch` - SSE change feed
//! - `GET  /admin/users`, `POST /admin/users` - List / provision users
//! - `PATCH /admin/users/{id}` - Update a profile
//! - `POST /admin/teams` - Create a team
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `METAS_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `METAS_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)

mod auth;
mod handlers;
mod middleware;
mod types;
mod watch;

// Re-exports for external use
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
// Re-export handlers and types for integration tests (via `metas::api::*`)
#[allow(unused_imports)]
pub use types::{
    ApiError, ApiResult, CheckpointRequest, CreateKrRequest, CreateTeamRequest, DashboardResponse,
    ErrorBody, HealthResponse, KrDetail, KrSummary, LoginRequest, LoginResponse, ProvisionRequest,
    ProvisionResponse, UpdateUserRequest,
};
#[allow(unused_imports)]
pub use watch::{ChangeEvent, ChangeFeed, ChangeSubscription};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use metas_core::{Directory, MetasError, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the injected store client, the session table,
/// and the change feed.
#[derive(Clone)]
pub struct AppState {
    /// The document-store client.
    pub directory: Arc<RwLock<Directory>>,
    /// Open sessions: opaque bearer token -> user id.
    pub sessions: Arc<RwLock<BTreeMap<String, UserId>>>,
    /// Fan-out change notifications.
    pub feed: ChangeFeed,
}

impl AppState {
    /// Create new app state over a directory.
    #[must_use]
    pub fn new(directory: Directory) -> Self {
        Self {
            directory: Arc::new(RwLock::new(directory)),
            sessions: Arc::new(RwLock::new(BTreeMap::new())),
            feed: ChangeFeed::new(),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `METAS_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("METAS_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (METAS_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in METAS_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No METAS_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. CORS - handles preflight requests
/// 2. Tracing - logs all requests
/// 3. Rate Limiting - protects against DoS (if enabled)
/// 4. Sessions - resolves the bearer token to the caller's profile
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    // Check if rate limiting is enabled
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    // Build base router with routes
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/auth/login", post(handlers::login_handler))
        .route("/me", get(handlers::me_handler))
        .route("/krs", get(handlers::list_krs_handler).post(handlers::create_kr_handler))
        .route("/krs/{id}", get(handlers::kr_detail_handler))
        .route("/krs/{id}/checkpoints", post(handlers::append_checkpoint_handler))
        .route("/dashboard", get(handlers::dashboard_handler))
        .route("/teams", get(handlers::list_teams_handler))
        .route("/watch", get(handlers::watch_handler))
        .route(
            "/admin/users",
            get(handlers::list_users_handler).post(handlers::provision_user_handler),
        )
        .route("/admin/users/{id}", patch(handlers::update_user_handler))
        .route("/admin/teams", post(handlers::create_team_handler));

    // Session middleware (innermost - runs last on request)
    router = router.layer(axum_middleware::from_fn_with_state(
        state.clone(),
        auth::require_user_middleware,
    ));

    // Apply rate limiting middleware
    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // Apply CORS, body limit, and tracing (outermost layers)
    router
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, directory: Directory) -> Result<(), MetasError> {
    let state = AppState::new(directory);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| MetasError::Io(format!("Bind failed: {e}")))?;

    tracing::info!("Metas HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| MetasError::Io(format!("Server error: {e}")))
}
