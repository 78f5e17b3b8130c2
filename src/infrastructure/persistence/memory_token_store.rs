//! In-process token store.
//!
//! Backs the HTTP integration tests and single-node development runs without
//! PostgreSQL. All state lives behind one mutex, so every operation (including
//! [`TokenStore::record_access`] and [`TokenStore::retire_with_log`]) is atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::entities::{AccessLog, NewAccessLog, NewToken, Token, TokenIdentity};
use crate::domain::repositories::{AccessLogFilter, TokenStore};
use crate::error::AppError;

#[derive(Default)]
struct Inner {
    tokens: HashMap<String, Token>,
    access_logs: Vec<AccessLog>,
    next_token_id: i64,
    next_log_id: i64,
}

impl Inner {
    fn bump_usage(&mut self, token_id: &str, now: DateTime<Utc>) {
        if let Some(token) = self.tokens.get_mut(token_id) {
            token.access_count += 1;
            token.last_accessed = Some(now);
        }
    }

    fn push_log(&mut self, entry: NewAccessLog, now: DateTime<Utc>) -> AccessLog {
        self.next_log_id += 1;
        let log = AccessLog {
            id: self.next_log_id,
            token_id: entry.token_id,
            access_time: now,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            referrer: entry.referrer,
            status_code: entry.status_code,
        };
        self.access_logs.push(log.clone());
        log
    }

    fn logs_for<'a>(
        &'a self,
        token_id: &'a str,
        from_date: Option<DateTime<Utc>>,
        to_date: Option<DateTime<Utc>>,
    ) -> impl Iterator<Item = &'a AccessLog> + 'a {
        let range = AccessLogFilter::new(0, 0).with_date_range(from_date, to_date);
        self.access_logs
            .iter()
            .filter(move |log| log.token_id == token_id && range.contains(log.access_time))
    }
}

/// Token store holding all rows in memory.
///
/// Uses the process clock for expiry comparisons. Data is lost on restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    inner: Mutex<Inner>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed token, bypassing id and timestamp assignment.
    ///
    /// Lets tests seed expired or inactive rows.
    pub async fn insert_raw(&self, mut token: Token) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        if inner.tokens.contains_key(&token.token_id) {
            return Err(duplicate(&token.token_id));
        }
        inner.next_token_id += 1;
        token.id = inner.next_token_id;
        inner.tokens.insert(token.token_id.clone(), token);
        Ok(())
    }

    /// Number of access log rows for a token.
    pub async fn access_log_len(&self, token_id: &str) -> usize {
        let inner = self.inner.lock().await;
        inner.logs_for(token_id, None, None).count()
    }
}

fn duplicate(token_id: &str) -> AppError {
    AppError::conflict(
        "Token id already exists",
        json!({ "token_id": token_id }),
    )
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn insert(&self, new_token: NewToken) -> Result<DateTime<Utc>, AppError> {
        let mut inner = self.inner.lock().await;

        if inner.tokens.contains_key(&new_token.token_id) {
            return Err(duplicate(&new_token.token_id));
        }

        let created_at = Utc::now();
        inner.next_token_id += 1;
        let token = Token {
            id: inner.next_token_id,
            token_id: new_token.token_id,
            original_url: new_token.original_url,
            encrypted_url: new_token.encrypted_url,
            identity: new_token.identity,
            created_at,
            expires_at: new_token.expires_at,
            is_active: true,
            access_count: 0,
            last_accessed: None,
        };
        inner.tokens.insert(token.token_id.clone(), token);

        Ok(created_at)
    }

    async fn get_by_id(&self, token_id: &str) -> Result<Option<Token>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.tokens.get(token_id).cloned())
    }

    async fn find_live(
        &self,
        original_url: &str,
        identity: &TokenIdentity,
    ) -> Result<Option<Token>, AppError> {
        let now = Utc::now();
        let inner = self.inner.lock().await;

        let found = inner
            .tokens
            .values()
            .filter(|t| t.original_url == original_url)
            .filter(|t| t.is_live_at(now))
            .filter(|t| identity.matches(&t.identity))
            .max_by_key(|t| (t.expires_at, t.id))
            .cloned();

        Ok(found)
    }

    async fn increment_usage(&self, token_id: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        inner.bump_usage(token_id, Utc::now());
        Ok(())
    }

    async fn deactivate(&self, token_id: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        if let Some(token) = inner.tokens.get_mut(token_id) {
            token.is_active = false;
        }
        Ok(())
    }

    async fn deactivate_all_expired(&self) -> Result<u64, AppError> {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;

        let mut changed = 0;
        for token in inner.tokens.values_mut() {
            if token.is_active && token.is_expired_at(now) {
                token.is_active = false;
                changed += 1;
            }
        }

        Ok(changed)
    }

    async fn append_access_log(&self, entry: NewAccessLog) -> Result<AccessLog, AppError> {
        let mut inner = self.inner.lock().await;
        Ok(inner.push_log(entry, Utc::now()))
    }

    async fn record_access(&self, entry: NewAccessLog) -> Result<AccessLog, AppError> {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        inner.bump_usage(&entry.token_id, now);
        Ok(inner.push_log(entry, now))
    }

    async fn retire_with_log(&self, entry: NewAccessLog) -> Result<AccessLog, AppError> {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        if let Some(token) = inner.tokens.get_mut(&entry.token_id) {
            token.is_active = false;
        }
        Ok(inner.push_log(entry, now))
    }

    async fn list_access_logs(
        &self,
        token_id: &str,
        filter: AccessLogFilter,
    ) -> Result<Vec<AccessLog>, AppError> {
        let inner = self.inner.lock().await;

        let mut logs: Vec<AccessLog> = inner
            .logs_for(token_id, filter.from_date, filter.to_date)
            .cloned()
            .collect();
        logs.sort_by(|a, b| (b.access_time, b.id).cmp(&(a.access_time, a.id)));

        Ok(logs
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn count_access_logs(
        &self,
        token_id: &str,
        from_date: Option<DateTime<Utc>>,
        to_date: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.logs_for(token_id, from_date, to_date).count() as i64)
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AccessContext, AccessStatus};
    use chrono::Duration;

    fn new_token(token_id: &str, url: &str, expires_in: Duration) -> NewToken {
        NewToken {
            token_id: token_id.to_string(),
            original_url: url.to_string(),
            encrypted_url: "sealed".to_string(),
            identity: TokenIdentity::default(),
            expires_at: Utc::now() + expires_in,
        }
    }

    fn log_entry(token_id: &str, status: AccessStatus) -> NewAccessLog {
        NewAccessLog::new(token_id, &AccessContext::default(), status)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryTokenStore::new();
        store
            .insert(new_token("tok-aaaaaaaaaaaaaaa", "https://a.com", Duration::hours(1)))
            .await
            .unwrap();

        let token = store.get_by_id("tok-aaaaaaaaaaaaaaa").await.unwrap().unwrap();
        assert!(token.is_active);
        assert_eq!(token.access_count, 0);
        assert!(token.last_accessed.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = MemoryTokenStore::new();
        let t = new_token("dup", "https://a.com", Duration::hours(1));
        store.insert(t.clone()).await.unwrap();

        let result = store.insert(t).await;
        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_find_live_prefers_latest_expiry() {
        let store = MemoryTokenStore::new();
        store
            .insert(new_token("short", "https://a.com", Duration::minutes(5)))
            .await
            .unwrap();
        store
            .insert(new_token("long", "https://a.com", Duration::hours(2)))
            .await
            .unwrap();
        store
            .insert(new_token("other", "https://b.com", Duration::hours(5)))
            .await
            .unwrap();

        let found = store
            .find_live("https://a.com", &TokenIdentity::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.token_id, "long");
    }

    #[tokio::test]
    async fn test_find_live_skips_inactive_and_expired() {
        let store = MemoryTokenStore::new();
        store
            .insert(new_token("expired", "https://a.com", Duration::seconds(-1)))
            .await
            .unwrap();
        store
            .insert(new_token("inactive", "https://a.com", Duration::hours(1)))
            .await
            .unwrap();
        store.deactivate("inactive").await.unwrap();

        let found = store
            .find_live("https://a.com", &TokenIdentity::default())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_deactivate_all_expired_counts_once() {
        let store = MemoryTokenStore::new();
        store
            .insert(new_token("e1", "https://a.com", Duration::seconds(-5)))
            .await
            .unwrap();
        store
            .insert(new_token("e2", "https://b.com", Duration::seconds(-5)))
            .await
            .unwrap();
        store
            .insert(new_token("live", "https://c.com", Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(store.deactivate_all_expired().await.unwrap(), 2);
        assert_eq!(store.deactivate_all_expired().await.unwrap(), 0);
        assert!(store.get_by_id("live").await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_record_access_updates_usage_and_log() {
        let store = MemoryTokenStore::new();
        store
            .insert(new_token("tok", "https://a.com", Duration::hours(1)))
            .await
            .unwrap();

        store
            .record_access(log_entry("tok", AccessStatus::Success))
            .await
            .unwrap();
        store
            .record_access(log_entry("tok", AccessStatus::Success))
            .await
            .unwrap();

        let token = store.get_by_id("tok").await.unwrap().unwrap();
        assert_eq!(token.access_count, 2);
        assert!(token.last_accessed.is_some());
        assert_eq!(store.access_log_len("tok").await, 2);
    }

    #[tokio::test]
    async fn test_retire_with_log_deactivates_and_logs() {
        let store = MemoryTokenStore::new();
        store
            .insert(new_token("old", "https://a.com", Duration::seconds(-5)))
            .await
            .unwrap();

        let log = store
            .retire_with_log(log_entry("old", AccessStatus::Gone))
            .await
            .unwrap();

        assert_eq!(log.status_code, 410);
        let token = store.get_by_id("old").await.unwrap().unwrap();
        assert!(!token.is_active);
        assert_eq!(token.access_count, 0);
        assert_eq!(store.access_log_len("old").await, 1);
    }

    #[tokio::test]
    async fn test_list_access_logs_newest_first_and_paged() {
        let store = MemoryTokenStore::new();
        for status in [AccessStatus::Success, AccessStatus::Gone, AccessStatus::Superseded] {
            store.append_access_log(log_entry("tok", status)).await.unwrap();
        }
        store
            .append_access_log(log_entry("other", AccessStatus::Success))
            .await
            .unwrap();

        let page = store
            .list_access_logs("tok", AccessLogFilter::new(0, 2))
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].status_code, 301);
        assert_eq!(page[1].status_code, 410);

        let rest = store
            .list_access_logs("tok", AccessLogFilter::new(2, 2))
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].status_code, 200);

        assert_eq!(store.count_access_logs("tok", None, None).await.unwrap(), 3);
    }
}
