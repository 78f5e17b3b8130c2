//! DTOs for the per-token access log endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pagination::PaginationMeta;
use crate::domain::entities::AccessLog;

/// A single access attempt.
///
/// Optional fields are omitted from JSON when `None`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessLogInfo {
    pub access_time: DateTime<Utc>,
    pub status_code: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

impl From<AccessLog> for AccessLogInfo {
    fn from(log: AccessLog) -> Self {
        Self {
            access_time: log.access_time,
            status_code: log.status_code,
            ip_address: log.ip_address,
            user_agent: log.user_agent,
            referrer: log.referrer,
        }
    }
}

/// Paginated access log of one token, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessLogsResponse {
    pub pagination: PaginationMeta,
    pub token_id: String,
    pub items: Vec<AccessLogInfo>,
}
