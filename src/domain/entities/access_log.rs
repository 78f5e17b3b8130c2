//! Access log entity: one immutable row per token access attempt.

use chrono::{DateTime, Utc};

/// Outcome recorded for an access attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    /// Redirected to the decrypted target URL.
    Success,
    /// Redirected to a live successor token.
    Superseded,
    /// Inactive or expired, no successor.
    Gone,
    /// Live token whose ciphertext could not be decrypted.
    Failed,
}

impl AccessStatus {
    /// HTTP-style status code stored in `access_logs.status_code`.
    pub fn code(self) -> i32 {
        match self {
            AccessStatus::Success => 200,
            AccessStatus::Superseded => 301,
            AccessStatus::Gone => 410,
            AccessStatus::Failed => 500,
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            AccessStatus::Success => "200",
            AccessStatus::Superseded => "301",
            AccessStatus::Gone => "410",
            AccessStatus::Failed => "500",
        }
    }
}

/// Request metadata captured for every access attempt.
#[derive(Debug, Clone, Default)]
pub struct AccessContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

impl AccessContext {
    pub fn new(ip_address: Option<String>, user_agent: Option<&str>, referrer: Option<&str>) -> Self {
        Self {
            ip_address,
            user_agent: user_agent.map(|s| s.to_string()),
            referrer: referrer.map(|s| s.to_string()),
        }
    }
}

/// A stored access log entry.
#[derive(Debug, Clone)]
pub struct AccessLog {
    pub id: i64,
    pub token_id: String,
    pub access_time: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub status_code: i32,
}

/// Input data for appending an access log entry.
///
/// `access_time` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAccessLog {
    pub token_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub status_code: i32,
}

impl NewAccessLog {
    pub fn new(token_id: impl Into<String>, context: &AccessContext, status: AccessStatus) -> Self {
        Self {
            token_id: token_id.into(),
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
            referrer: context.referrer.clone(),
            status_code: status.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AccessStatus::Success.code(), 200);
        assert_eq!(AccessStatus::Superseded.code(), 301);
        assert_eq!(AccessStatus::Gone.code(), 410);
        assert_eq!(AccessStatus::Failed.code(), 500);
    }

    #[test]
    fn test_new_access_log_copies_context() {
        let ctx = AccessContext::new(
            Some("192.168.1.1".to_string()),
            Some("Mozilla/5.0"),
            Some("https://google.com"),
        );

        let entry = NewAccessLog::new("tok123", &ctx, AccessStatus::Superseded);

        assert_eq!(entry.token_id, "tok123");
        assert_eq!(entry.ip_address.as_deref(), Some("192.168.1.1"));
        assert_eq!(entry.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(entry.referrer.as_deref(), Some("https://google.com"));
        assert_eq!(entry.status_code, 301);
    }

    #[test]
    fn test_context_minimal() {
        let ctx = AccessContext::new(None, None, None);
        let entry = NewAccessLog::new("tok", &ctx, AccessStatus::Success);

        assert!(entry.ip_address.is_none());
        assert!(entry.user_agent.is_none());
        assert!(entry.referrer.is_none());
    }
}
