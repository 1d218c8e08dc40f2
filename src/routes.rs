//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`      - Health check: DB, cache, media storage (public)
//! - `/api/*`            - Content API (Bearer token optional, checked per resource)
//! - `/uploads/*`        - Uploaded images
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket (configurable for proxy deployments)
//! - **Body limit** - Sized from the upload limit
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{rate_limit, tracing};
use crate::config::Config;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;

/// Files a single multipart request may reasonably carry.
const MAX_FILES_PER_REQUEST: usize = 4;
/// Room for text parts and multipart framing.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Largest request body accepted for a given upload limit.
pub fn body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes
        .saturating_mul(MAX_FILES_PER_REQUEST)
        .saturating_add(FORM_OVERHEAD_BYTES)
}

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `config` - reads `behind_proxy` (rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP`; enable only behind a trusted proxy),
///   `upload_dir` and `max_upload_bytes`
pub fn app_router(state: AppState, config: &Config) -> NormalizePath<Router> {
    let api_router = api::routes::api_router(state.clone());

    let router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit(config.max_upload_bytes)))
        .layer(rate_limit::layer(config.behind_proxy))
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
