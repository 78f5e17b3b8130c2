//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /`                    - Service info
//! - `GET  /health`              - Health check: token store, cipher
//! - `GET  /content/{token_id}`  - Token redirect
//! - `/api/*`                    - Token issuance, status and access logs
//!
//! Unmatched paths return a JSON 404.
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **CORS** - Any origin
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{fallback_handler, health_handler, info_handler, redirect_handler};
use crate::api::middleware::{cors, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/", get(info_handler))
        .route("/health", get(health_handler))
        .route("/content/{token_id}", get(redirect_handler))
        .nest("/api", api::routes::api_routes())
        .fallback(fallback_handler)
        .with_state(state)
        .layer(cors::layer())
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
