//! Handler for the service info endpoint.

use axum::Json;

use crate::api::dto::info::ServiceInfo;

/// Returns the service name, version and status.
///
/// # Endpoint
///
/// `GET /`
pub async fn info_handler() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    })
}
