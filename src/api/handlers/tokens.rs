//! Handlers for token issuance and status.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::token::{CreateTokenRequest, TokenResponse, TokenStatusResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Issues a token for a target URL, reusing a live one when possible.
///
/// # Endpoint
///
/// `POST /api/token`
///
/// # Request Body
///
/// ```json
/// {
///   "original_url": "https://cdn.example.com/video.mp4",
///   "user_id": "u-42",
///   "expires_in_seconds": 600
/// }
/// ```
///
/// # Response
///
/// **201 Created**
/// ```json
/// {
///   "token": "3q2-7wAAAAC6vK3e_Q8BAg",
///   "secure_url": "http://localhost:8000/content/3q2-7wAAAAC6vK3e_Q8BAg",
///   "expires_at": "2026-01-01T13:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if the URL is not well formed or a field is too long.
pub async fn create_token_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    payload.validate()?;

    let issued = state.token_service.find_or_create(payload.into()).await?;

    Ok((StatusCode::CREATED, Json(issued.into())))
}

/// Returns the status of a token.
///
/// # Endpoint
///
/// `GET /api/token/{token_id}/status`
///
/// # Errors
///
/// Returns 404 Not Found if the token does not exist.
pub async fn token_status_handler(
    State(state): State<AppState>,
    Path(token_id): Path<String>,
) -> Result<Json<TokenStatusResponse>, AppError> {
    let view = state.token_service.get_status(&token_id).await?;
    Ok(Json(view.into()))
}
