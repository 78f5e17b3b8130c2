//! Handler for token redirects.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::net::SocketAddr;
use url::Url;

use crate::application::services::Resolution;
use crate::domain::entities::AccessContext;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Redirects the bearer of a token to its target.
///
/// # Endpoint
///
/// `GET /content/{token_id}`
///
/// # Responses
///
/// - **302 Found**: live token, `Location` is the decrypted target URL
/// - **301 Moved Permanently**: inactive or expired token with a live successor,
///   `Location` is the successor's secure URL
/// - **404 Not Found**: unknown token
/// - **410 Gone**: inactive or expired token without a successor
///
/// Redirects carry `Cache-Control: no-store` so that browsers re-check the
/// token on every visit.
///
/// # Access Logging
///
/// Every attempt on a known token is logged with the client address, user agent
/// and referrer. See [`client_ip`] for address resolution behind proxies.
pub async fn redirect_handler(
    Path(token_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Response, AppError> {
    let context = AccessContext::new(
        Some(client_ip(&headers, addr, state.behind_proxy)),
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        headers.get(header::REFERER).and_then(|v| v.to_str().ok()),
    );

    match state.redirect_resolver.resolve(&token_id, context).await? {
        Resolution::Target(url) => redirect(StatusCode::FOUND, &url),
        Resolution::Successor { secure_url, .. } => {
            redirect(StatusCode::MOVED_PERMANENTLY, &secure_url)
        }
    }
}

fn redirect(status: StatusCode, location: &str) -> Result<Response, AppError> {
    let location = location_header(location).ok_or_else(|| {
        AppError::internal(
            "Redirect target is not a valid header value",
            json!({ "location": location }),
        )
    })?;

    Ok((
        status,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
    )
        .into_response())
}

/// Uses the URL verbatim when it is a valid header value, otherwise its
/// percent-encoded serialization.
fn location_header(location: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(location).ok().or_else(|| {
        Url::parse(location)
            .ok()
            .and_then(|u| HeaderValue::from_str(u.as_str()).ok())
    })
}
