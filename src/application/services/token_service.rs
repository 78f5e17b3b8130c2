//! Token issuance, deduplication and status service.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::entities::{AccessLog, NewToken, Token, TokenIdentity};
use crate::domain::repositories::{AccessLogFilter, TokenStore};
use crate::error::AppError;
use crate::utils::cipher::UrlCipher;
use crate::utils::token_id::generate_token_id;
use crate::utils::url_validator::validate_url;

/// Settings applied to every issued token.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// Public base URL, without trailing slash.
    pub base_url: String,
    /// Lifetime used when a request gives no positive TTL.
    pub default_ttl_seconds: i64,
}

/// Input for creating or reusing a token.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub original_url: String,
    pub identity: TokenIdentity,
    pub expires_in_seconds: Option<i64>,
}

/// A token handed out to a client.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    pub token_id: String,
    pub secure_url: String,
    pub expires_at: DateTime<Utc>,
    /// True if an existing live token was returned instead of a new one.
    pub reused: bool,
}

/// Public status of a token.
#[derive(Debug, Clone)]
pub struct TokenView {
    pub token_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub access_count: i64,
    pub last_accessed: Option<DateTime<Utc>>,
}

impl From<Token> for TokenView {
    fn from(t: Token) -> Self {
        Self {
            token_id: t.token_id,
            created_at: t.created_at,
            expires_at: t.expires_at,
            is_active: t.is_active,
            access_count: t.access_count,
            last_accessed: t.last_accessed,
        }
    }
}

/// Service owning the token lifecycle: creation, dedup, status and sweeping.
///
/// Generic over the store so unit tests can run against mocks while the server
/// holds a `dyn TokenStore`.
pub struct TokenService<S: TokenStore + ?Sized> {
    store: Arc<S>,
    cipher: Arc<UrlCipher>,
    settings: TokenSettings,
}

impl<S: TokenStore + ?Sized> TokenService<S> {
    /// Creates a new token service.
    pub fn new(store: Arc<S>, cipher: Arc<UrlCipher>, settings: TokenSettings) -> Self {
        Self {
            store,
            cipher,
            settings,
        }
    }

    /// Creates a new token unconditionally.
    ///
    /// A missing or non-positive TTL falls back to the configured default.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidUrl`] if the URL is not well formed; nothing is
    /// persisted in that case.
    /// Returns [`AppError::Conflict`] on the (practically impossible) id collision.
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    pub async fn create_token(&self, request: TokenRequest) -> Result<IssuedToken, AppError> {
        ensure_valid_url(&request.original_url)?;
        self.issue(request).await
    }

    /// Returns the live token for the URL and identity, or creates one.
    ///
    /// # Deduplication
    ///
    /// Identity fields left unset match any stored value. Lookup and insert are
    /// not one transaction, so two concurrent calls may both create a token; later
    /// lookups pick the one expiring last.
    ///
    /// # Errors
    ///
    /// See [`Self::create_token`].
    pub async fn find_or_create(&self, request: TokenRequest) -> Result<IssuedToken, AppError> {
        ensure_valid_url(&request.original_url)?;

        if let Some(existing) = self
            .store
            .find_live(&request.original_url, &request.identity)
            .await?
        {
            debug!(token_id = %existing.token_id, "Reusing live token");
            metrics::counter!("tokens_issued_total", "outcome" => "reused").increment(1);

            return Ok(IssuedToken {
                secure_url: self.secure_url(&existing.token_id),
                token_id: existing.token_id,
                expires_at: existing.expires_at,
                reused: true,
            });
        }

        self.issue(request).await
    }

    /// Returns the status of a token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the token does not exist.
    pub async fn get_status(&self, token_id: &str) -> Result<TokenView, AppError> {
        self.store
            .get_by_id(token_id)
            .await?
            .map(TokenView::from)
            .ok_or_else(|| token_not_found(token_id))
    }

    /// Finds a live token for the same URL and identity as `token`.
    pub async fn find_successor(&self, token: &Token) -> Result<Option<Token>, AppError> {
        self.store
            .find_live(&token.original_url, &token.identity)
            .await
    }

    /// Decrypts the stored target URL of a token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CorruptToken`] if the ciphertext cannot be decrypted.
    pub fn decrypt_url(&self, token: &Token) -> Result<String, AppError> {
        self.cipher.decrypt(&token.encrypted_url).map_err(|e| {
            AppError::corrupt_token(
                "Stored URL could not be decrypted",
                json!({ "token_id": token.token_id, "reason": e.to_string() }),
            )
        })
    }

    /// Public redirect URL for a token id.
    pub fn secure_url(&self, token_id: &str) -> String {
        format!("{}/content/{}", self.settings.base_url, token_id)
    }

    /// Returns true if the token store is reachable.
    pub async fn store_healthy(&self) -> bool {
        self.store.health_check().await
    }

    /// Returns true if the configured key seals and opens a probe value.
    pub fn cipher_healthy(&self) -> bool {
        const PROBE: &str = "https://health.invalid/probe";

        self.cipher
            .encrypt(PROBE)
            .and_then(|sealed| self.cipher.decrypt(&sealed))
            .is_ok_and(|opened| opened == PROBE)
    }

    /// Returns a page of access log entries and the total matching count.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the token does not exist.
    pub async fn access_logs(
        &self,
        token_id: &str,
        filter: AccessLogFilter,
    ) -> Result<(Vec<AccessLog>, i64), AppError> {
        if self.store.get_by_id(token_id).await?.is_none() {
            return Err(token_not_found(token_id));
        }

        let total = self
            .store
            .count_access_logs(token_id, filter.from_date, filter.to_date)
            .await?;
        let items = self.store.list_access_logs(token_id, filter).await?;

        Ok((items, total))
    }

    /// Deactivates every expired token.
    ///
    /// Store errors are logged and reported as zero tokens swept.
    pub async fn sweep_expired(&self) -> u64 {
        match self.store.deactivate_all_expired().await {
            Ok(count) => {
                if count > 0 {
                    info!(count, "Deactivated expired tokens");
                } else {
                    debug!("No expired tokens to deactivate");
                }
                metrics::counter!("tokens_swept_total").increment(count);
                count
            }
            Err(e) => {
                warn!(error = %e, "Expiry sweep failed");
                0
            }
        }
    }

    async fn issue(&self, request: TokenRequest) -> Result<IssuedToken, AppError> {
        let ttl = match request.expires_in_seconds {
            Some(seconds) if seconds > 0 => seconds,
            _ => self.settings.default_ttl_seconds,
        };

        let encrypted_url = self.cipher.encrypt(&request.original_url).map_err(|e| {
            AppError::internal("URL encryption failed", json!({ "reason": e.to_string() }))
        })?;

        let expires_at = Duration::try_seconds(ttl)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                AppError::bad_request(
                    "Token lifetime out of range",
                    json!({ "expires_in_seconds": ttl }),
                )
            })?;

        let token_id = generate_token_id();

        let new_token = NewToken {
            token_id: token_id.clone(),
            original_url: request.original_url,
            encrypted_url,
            identity: request.identity,
            expires_at,
        };

        self.store.insert(new_token).await?;

        info!(token_id = %token_id, ttl_seconds = ttl, "Token created");
        metrics::counter!("tokens_issued_total", "outcome" => "created").increment(1);

        Ok(IssuedToken {
            secure_url: self.secure_url(&token_id),
            token_id,
            expires_at,
            reused: false,
        })
    }
}

fn ensure_valid_url(url: &str) -> Result<(), AppError> {
    if validate_url(url) {
        Ok(())
    } else {
        Err(AppError::invalid_url("Invalid URL", json!({ "original_url": url })))
    }
}

fn token_not_found(token_id: &str) -> AppError {
    AppError::not_found("Token not found", json!({ "token_id": token_id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockTokenStore;

    const BASE_URL: &str = "https://media.example.com";

    fn cipher() -> Arc<UrlCipher> {
        Arc::new(UrlCipher::new(&[7u8; 32]))
    }

    fn settings() -> TokenSettings {
        TokenSettings {
            base_url: BASE_URL.to_string(),
            default_ttl_seconds: 3600,
        }
    }

    fn service(store: MockTokenStore) -> TokenService<MockTokenStore> {
        TokenService::new(Arc::new(store), cipher(), settings())
    }

    fn request(url: &str, ttl: Option<i64>) -> TokenRequest {
        TokenRequest {
            original_url: url.to_string(),
            identity: TokenIdentity::new(Some("user-1".to_string()), None, None),
            expires_in_seconds: ttl,
        }
    }

    fn stored_token(token_id: &str, url: &str, encrypted_url: String) -> Token {
        let now = Utc::now();
        Token {
            id: 1,
            token_id: token_id.to_string(),
            original_url: url.to_string(),
            encrypted_url,
            identity: TokenIdentity::new(Some("user-1".to_string()), None, None),
            created_at: now,
            expires_at: now + Duration::hours(1),
            is_active: true,
            access_count: 0,
            last_accessed: None,
        }
    }

    #[tokio::test]
    async fn test_create_token_encrypts_and_builds_secure_url() {
        let mut store = MockTokenStore::new();
        store
            .expect_insert()
            .withf(|t| {
                t.original_url == "https://cdn.example.com/video.mp4"
                    && t.encrypted_url != t.original_url
                    && t.identity.user_id.as_deref() == Some("user-1")
            })
            .times(1)
            .returning(|_| Ok(Utc::now()));

        let svc = service(store);
        let before = Utc::now();
        let issued = svc
            .create_token(request("https://cdn.example.com/video.mp4", Some(60)))
            .await
            .unwrap();

        assert_eq!(issued.token_id.len(), 22);
        assert_eq!(
            issued.secure_url,
            format!("{BASE_URL}/content/{}", issued.token_id)
        );
        assert!(issued.expires_at >= before + Duration::seconds(60));
        assert!(issued.expires_at <= Utc::now() + Duration::seconds(60));
        assert!(!issued.reused);
    }

    #[tokio::test]
    async fn test_non_positive_ttl_uses_default() {
        for ttl in [None, Some(0), Some(-10)] {
            let mut store = MockTokenStore::new();
            store.expect_insert().times(1).returning(|_| Ok(Utc::now()));

            let svc = service(store);
            let before = Utc::now();
            let issued = svc
                .create_token(request("https://example.com", ttl))
                .await
                .unwrap();

            assert!(issued.expires_at >= before + Duration::seconds(3600));
        }
    }

    #[tokio::test]
    async fn test_invalid_url_persists_nothing() {
        let mut store = MockTokenStore::new();
        store.expect_insert().never();
        store.expect_find_live().never();

        let svc = service(store);
        let result = svc.find_or_create(request("not-a-url", None)).await;

        assert!(matches!(result, Err(AppError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_find_or_create_reuses_live_token() {
        let c = cipher();
        let sealed = c.encrypt("https://example.com/a").unwrap();
        let existing = stored_token("existing-token-id-0001", "https://example.com/a", sealed);
        let expected_expiry = existing.expires_at;

        let mut store = MockTokenStore::new();
        store
            .expect_find_live()
            .withf(|url, identity| {
                url == "https://example.com/a" && identity.user_id.as_deref() == Some("user-1")
            })
            .times(1)
            .returning(move |_, _| Ok(Some(existing.clone())));
        store.expect_insert().never();

        let svc = service(store);
        let issued = svc
            .find_or_create(request("https://example.com/a", Some(10)))
            .await
            .unwrap();

        assert_eq!(issued.token_id, "existing-token-id-0001");
        assert_eq!(issued.expires_at, expected_expiry);
        assert_eq!(
            issued.secure_url,
            format!("{BASE_URL}/content/existing-token-id-0001")
        );
        assert!(issued.reused);
    }

    #[tokio::test]
    async fn test_find_or_create_creates_when_none_live() {
        let mut store = MockTokenStore::new();
        store.expect_find_live().times(1).returning(|_, _| Ok(None));
        store.expect_insert().times(1).returning(|_| Ok(Utc::now()));

        let svc = service(store);
        let issued = svc
            .find_or_create(request("https://example.com/b", None))
            .await
            .unwrap();

        assert!(!issued.reused);
    }

    #[tokio::test]
    async fn test_duplicate_id_propagates_conflict() {
        let mut store = MockTokenStore::new();
        store
            .expect_insert()
            .times(1)
            .returning(|_| Err(AppError::conflict("Token id already exists", json!({}))));

        let svc = service(store);
        let result = svc.create_token(request("https://example.com", None)).await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_get_status_not_found() {
        let mut store = MockTokenStore::new();
        store.expect_get_by_id().times(1).returning(|_| Ok(None));

        let svc = service(store);
        let result = svc.get_status("missing-token-id-00001").await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_decrypt_url_roundtrip_and_corruption() {
        let c = cipher();
        let sealed = c.encrypt("https://example.com").unwrap();
        let good = stored_token("t1", "https://example.com", sealed);
        let bad = stored_token("t2", "https://example.com", "garbage".to_string());

        let svc = service(MockTokenStore::new());

        assert_eq!(svc.decrypt_url(&good).unwrap(), "https://example.com");
        assert!(matches!(
            svc.decrypt_url(&bad),
            Err(AppError::CorruptToken { .. })
        ));
    }

    #[test]
    fn test_cipher_healthy() {
        assert!(service(MockTokenStore::new()).cipher_healthy());
    }

    #[tokio::test]
    async fn test_sweep_swallows_store_errors() {
        let mut store = MockTokenStore::new();
        store
            .expect_deactivate_all_expired()
            .times(1)
            .returning(|| Err(AppError::store_unavailable("Database error", json!({}))));

        let svc = service(store);

        assert_eq!(svc.sweep_expired().await, 0);
    }

    #[tokio::test]
    async fn test_sweep_returns_count() {
        let mut store = MockTokenStore::new();
        store
            .expect_deactivate_all_expired()
            .times(1)
            .returning(|| Ok(3));

        let svc = service(store);

        assert_eq!(svc.sweep_expired().await, 3);
    }

    #[tokio::test]
    async fn test_access_logs_unknown_token() {
        let mut store = MockTokenStore::new();
        store.expect_get_by_id().times(1).returning(|_| Ok(None));
        store.expect_list_access_logs().never();

        let svc = service(store);
        let result = svc
            .access_logs("missing-token-id-00001", AccessLogFilter::new(0, 10))
            .await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }
}
