//! API route configuration.

use crate::api::handlers::{access_logs_handler, create_token_handler, token_status_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Token management routes, nested under `/api`.
///
/// # Endpoints
///
/// - `POST /token`                - Issue or reuse a token
/// - `GET  /token/{token_id}/status` - Token status
/// - `GET  /token/{token_id}/logs`   - Paginated access log
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/token", post(create_token_handler))
        .route("/token/{token_id}/status", get(token_status_handler))
        .route("/token/{token_id}/logs", get(access_logs_handler))
}
