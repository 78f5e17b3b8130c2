//! Handler for the per-token access log.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::json;

use crate::api::dto::access_logs::{AccessLogInfo, AccessLogsResponse};
use crate::api::dto::pagination::{AccessLogQueryParams, PaginationMeta};
use crate::domain::repositories::AccessLogFilter;
use crate::error::AppError;
use crate::state::AppState;

/// Lists access attempts for a token, newest first.
///
/// # Endpoint
///
/// `GET /api/token/{token_id}/logs`
///
/// # Query Parameters
///
/// - `page` (optional): Page number (default: 1)
/// - `page_size` (optional): Items per page (default: 25, max: 1000)
/// - `from` (optional): Start date (RFC3339 format)
/// - `to` (optional): End date (RFC3339 format)
///
/// # Errors
///
/// Returns 404 Not Found if the token does not exist.
/// Returns 400 Bad Request if pagination parameters are invalid.
pub async fn access_logs_handler(
    State(state): State<AppState>,
    Path(token_id): Path<String>,
    Query(params): Query<AccessLogQueryParams>,
) -> Result<Json<AccessLogsResponse>, AppError> {
    let (offset, limit) = params
        .pagination
        .validate_and_get_offset_limit()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let filter = AccessLogFilter::new(offset, limit)
        .with_date_range(params.date_filter.from, params.date_filter.to);

    let (items, total) = state.token_service.access_logs(&token_id, filter).await?;

    Ok(Json(AccessLogsResponse {
        pagination: PaginationMeta::new(
            params.pagination.page(),
            params.pagination.page_size(),
            total,
        ),
        token_id,
        items: items.into_iter().map(AccessLogInfo::from).collect(),
    }))
}
