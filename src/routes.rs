//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /s/{code}`    - Short link redirect
//! - `GET  /health`      - Health check: store, click queue
//! - `/api/*`            - REST API
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-client fixed window on alias creation
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(app_routes(state))
}

/// All routes with tracing, before path normalization.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/s/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api", api::routes::api_routes(state.clone()))
        .with_state(state)
        .layer(tracing::layer())
}
