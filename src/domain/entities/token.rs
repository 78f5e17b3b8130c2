//! Token entity: an opaque, time-limited handle to an encrypted target URL.

use chrono::{DateTime, Utc};

/// Optional correlation keys attached to a token.
///
/// Used for dedup and successor lookups. In lookups, a `None` field is a
/// wildcard: it matches any stored value, including NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenIdentity {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub device_id: Option<String>,
}

impl TokenIdentity {
    pub fn new(
        user_id: Option<String>,
        session_id: Option<String>,
        device_id: Option<String>,
    ) -> Self {
        Self {
            user_id,
            session_id,
            device_id,
        }
    }

    /// Returns true if every field set on `self` equals the corresponding
    /// field of `stored`.
    pub fn matches(&self, stored: &TokenIdentity) -> bool {
        fn field_matches(wanted: &Option<String>, stored: &Option<String>) -> bool {
            wanted.as_ref().is_none_or(|w| stored.as_ref() == Some(w))
        }

        field_matches(&self.user_id, &stored.user_id)
            && field_matches(&self.session_id, &stored.session_id)
            && field_matches(&self.device_id, &stored.device_id)
    }
}

/// A persisted access token.
///
/// `id` is the internal row id, used only as a deterministic tie-break.
/// `token_id` is the public, unguessable identifier.
#[derive(Debug, Clone)]
pub struct Token {
    pub id: i64,
    pub token_id: String,
    pub original_url: String,
    pub encrypted_url: String,
    pub identity: TokenIdentity,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub access_count: i64,
    pub last_accessed: Option<DateTime<Utc>>,
}

impl Token {
    /// Returns true if `expires_at` is not after `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// A token is live iff it is active and has not expired.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }
}

/// Input data for inserting a new token.
///
/// `created_at`, `is_active`, `access_count` and `last_accessed` are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewToken {
    pub token_id: String,
    pub original_url: String,
    pub encrypted_url: String,
    pub identity: TokenIdentity,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(is_active: bool, expires_in: Duration) -> Token {
        let now = Utc::now();
        Token {
            id: 1,
            token_id: "tok".to_string(),
            original_url: "https://example.com".to_string(),
            encrypted_url: "sealed".to_string(),
            identity: TokenIdentity::default(),
            created_at: now - Duration::seconds(10),
            expires_at: now + expires_in,
            is_active,
            access_count: 0,
            last_accessed: None,
        }
    }

    #[test]
    fn test_live_token() {
        let t = token(true, Duration::hours(1));
        assert!(t.is_live_at(Utc::now()));
        assert!(!t.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_inactive_token_is_not_live() {
        let t = token(false, Duration::hours(1));
        assert!(!t.is_live_at(Utc::now()));
    }

    #[test]
    fn test_expired_token_is_not_live() {
        let t = token(true, Duration::seconds(-1));
        assert!(t.is_expired_at(Utc::now()));
        assert!(!t.is_live_at(Utc::now()));
    }

    #[test]
    fn test_expiry_boundary_is_expired() {
        let t = token(true, Duration::hours(1));
        assert!(t.is_expired_at(t.expires_at));
        assert!(!t.is_live_at(t.expires_at));
    }

    #[test]
    fn test_identity_wildcards() {
        let stored = TokenIdentity::new(
            Some("u1".to_string()),
            Some("s1".to_string()),
            None,
        );

        assert!(TokenIdentity::default().matches(&stored));
        assert!(TokenIdentity::new(Some("u1".to_string()), None, None).matches(&stored));
        assert!(
            TokenIdentity::new(Some("u1".to_string()), Some("s1".to_string()), None)
                .matches(&stored)
        );
        assert!(!TokenIdentity::new(Some("u2".to_string()), None, None).matches(&stored));
        assert!(!TokenIdentity::new(None, None, Some("d1".to_string())).matches(&stored));
    }
}
