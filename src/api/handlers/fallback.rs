//! Fallback for unmatched routes.

use axum::http::Uri;
use serde_json::json;

use crate::error::AppError;

/// Returns a JSON 404 for any unmatched path.
pub async fn fallback_handler(uri: Uri) -> AppError {
    AppError::not_found("Resource not found", json!({ "path": uri.path() }))
}
