//! Repository trait for tokens and their access logs.

use crate::domain::entities::{AccessLog, NewAccessLog, NewToken, Token, TokenIdentity};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Filter criteria for access log queries.
///
/// Supports date range filtering and pagination.
#[derive(Debug, Clone)]
pub struct AccessLogFilter {
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub offset: i64,
    pub limit: i64,
}

impl AccessLogFilter {
    /// Creates a new filter with pagination parameters.
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            from_date: None,
            to_date: None,
            offset,
            limit,
        }
    }

    /// Adds date range filtering to the query.
    pub fn with_date_range(
        mut self,
        from_date: Option<DateTime<Utc>>,
        to_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.from_date = from_date;
        self.to_date = to_date;
        self
    }

    /// Returns true if `time` falls inside the date range (bounds inclusive).
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.from_date.is_none_or(|from| time >= from) && self.to_date.is_none_or(|to| time <= to)
    }
}

/// Persistence contract for tokens and access logs.
///
/// Every write is atomic per row. [`TokenStore::record_access`] and
/// [`TokenStore::retire_with_log`] span two rows and run in a single
/// transaction.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgTokenStore`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryTokenStore`] - In-process implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_token_store.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Inserts a new token and returns its store-assigned `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if `token_id` already exists.
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    async fn insert(&self, new_token: NewToken) -> Result<DateTime<Utc>, AppError>;

    /// Finds a token by its public id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    async fn get_by_id(&self, token_id: &str) -> Result<Option<Token>, AppError>;

    /// Finds the live token for a URL and identity.
    ///
    /// Matches `original_url` exactly and every identity field that is set;
    /// unset fields match any stored value. Among live matches, returns the one
    /// with the latest `expires_at`, ties broken by the highest internal id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    async fn find_live(
        &self,
        original_url: &str,
        identity: &TokenIdentity,
    ) -> Result<Option<Token>, AppError>;

    /// Atomically increments `access_count` and sets `last_accessed = now`.
    ///
    /// Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    async fn increment_usage(&self, token_id: &str) -> Result<(), AppError>;

    /// Sets `is_active = false`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    async fn deactivate(&self, token_id: &str) -> Result<(), AppError>;

    /// Deactivates every active token whose `expires_at` has passed.
    ///
    /// Returns the number of rows changed. Safe to run concurrently with itself:
    /// a row already deactivated by another sweep is not counted twice.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    async fn deactivate_all_expired(&self) -> Result<u64, AppError>;

    /// Appends an access log entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    async fn append_access_log(&self, entry: NewAccessLog) -> Result<AccessLog, AppError>;

    /// Increments usage of `entry.token_id` and appends `entry` atomically.
    ///
    /// Either both changes are visible or neither is.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    async fn record_access(&self, entry: NewAccessLog) -> Result<AccessLog, AppError>;

    /// Deactivates `entry.token_id` and appends `entry` atomically.
    ///
    /// Either both changes are visible or neither is.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    async fn retire_with_log(&self, entry: NewAccessLog) -> Result<AccessLog, AppError>;

    /// Lists access log entries for a token, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    async fn list_access_logs(
        &self,
        token_id: &str,
        filter: AccessLogFilter,
    ) -> Result<Vec<AccessLog>, AppError>;

    /// Counts access log entries for a token within an optional date range.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    async fn count_access_logs(
        &self,
        token_id: &str,
        from_date: Option<DateTime<Utc>>,
        to_date: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError>;

    /// Checks if the backend is reachable.
    async fn health_check(&self) -> bool;
}
