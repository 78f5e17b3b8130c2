//! Cross-origin resource sharing.

use axum::http::{Method, header};
use tower_http::cors::{Any, CorsLayer};

/// Creates a permissive CORS layer.
///
/// Any origin may call the API; tokens are bearer capabilities, so no
/// credentials or cookies are involved.
pub fn layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::LOCATION])
}
