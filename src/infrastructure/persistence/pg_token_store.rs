//! PostgreSQL implementation of the token store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{AccessLog, NewAccessLog, NewToken, Token, TokenIdentity};
use crate::domain::repositories::{AccessLogFilter, TokenStore};
use crate::error::AppError;

const TOKEN_COLUMNS: &str = "id, token_id, original_url, encrypted_url, user_id, session_id, \
     device_id, created_at, expires_at, is_active, access_count, last_accessed";

const ACCESS_LOG_COLUMNS: &str =
    "id, token_id, access_time, ip_address, user_agent, referrer, status_code";

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: i64,
    token_id: String,
    original_url: String,
    encrypted_url: String,
    user_id: Option<String>,
    session_id: Option<String>,
    device_id: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    is_active: bool,
    access_count: i64,
    last_accessed: Option<DateTime<Utc>>,
}

impl From<TokenRow> for Token {
    fn from(r: TokenRow) -> Self {
        Token {
            id: r.id,
            token_id: r.token_id,
            original_url: r.original_url,
            encrypted_url: r.encrypted_url,
            identity: TokenIdentity::new(r.user_id, r.session_id, r.device_id),
            created_at: r.created_at,
            expires_at: r.expires_at,
            is_active: r.is_active,
            access_count: r.access_count,
            last_accessed: r.last_accessed,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AccessLogRow {
    id: i64,
    token_id: String,
    access_time: DateTime<Utc>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    referrer: Option<String>,
    status_code: i32,
}

impl From<AccessLogRow> for AccessLog {
    fn from(r: AccessLogRow) -> Self {
        AccessLog {
            id: r.id,
            token_id: r.token_id,
            access_time: r.access_time,
            ip_address: r.ip_address,
            user_agent: r.user_agent,
            referrer: r.referrer,
            status_code: r.status_code,
        }
    }
}

/// PostgreSQL store for tokens and access logs.
///
/// Queries are bound at runtime so the crate builds without a live database.
///
/// Liveness is judged against the application clock, bound as a parameter,
/// the same clock that computed `expires_at` at issuance. `NOW()` only stamps
/// `created_at`, `last_accessed` and `access_time`.
pub struct PgTokenStore {
    pool: Arc<PgPool>,
}

impl PgTokenStore {
    /// Creates a new store with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn insert_access_log<'e, E>(
        executor: E,
        entry: &NewAccessLog,
    ) -> Result<AccessLog, AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let sql = format!(
            "INSERT INTO access_logs (token_id, ip_address, user_agent, referrer, status_code) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ACCESS_LOG_COLUMNS}"
        );

        let row = sqlx::query_as::<_, AccessLogRow>(&sql)
            .bind(&entry.token_id)
            .bind(&entry.ip_address)
            .bind(&entry.user_agent)
            .bind(&entry.referrer)
            .bind(entry.status_code)
            .fetch_one(executor)
            .await?;

        Ok(row.into())
    }

    async fn set_inactive<'e, E>(executor: E, token_id: &str) -> Result<(), AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query("UPDATE tokens SET is_active = FALSE WHERE token_id = $1")
            .bind(token_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    async fn bump_usage<'e, E>(executor: E, token_id: &str) -> Result<(), AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            UPDATE tokens
            SET access_count = access_count + 1,
                last_accessed = NOW()
            WHERE token_id = $1
            "#,
        )
        .bind(token_id)
        .execute(executor)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn insert(&self, new_token: NewToken) -> Result<DateTime<Utc>, AppError> {
        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO tokens
                (token_id, original_url, encrypted_url, user_id, session_id, device_id, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING created_at
            "#,
        )
        .bind(&new_token.token_id)
        .bind(&new_token.original_url)
        .bind(&new_token.encrypted_url)
        .bind(&new_token.identity.user_id)
        .bind(&new_token.identity.session_id)
        .bind(&new_token.identity.device_id)
        .bind(new_token.expires_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(created_at)
    }

    async fn get_by_id(&self, token_id: &str) -> Result<Option<Token>, AppError> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_id = $1");

        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(token_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Token::from))
    }

    async fn find_live(
        &self,
        original_url: &str,
        identity: &TokenIdentity,
    ) -> Result<Option<Token>, AppError> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens \
             WHERE original_url = $1 \
               AND is_active \
               AND expires_at > $5 \
               AND ($2::text IS NULL OR user_id = $2) \
               AND ($3::text IS NULL OR session_id = $3) \
               AND ($4::text IS NULL OR device_id = $4) \
             ORDER BY expires_at DESC, id DESC \
             LIMIT 1"
        );

        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(original_url)
            .bind(&identity.user_id)
            .bind(&identity.session_id)
            .bind(&identity.device_id)
            .bind(Utc::now())
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Token::from))
    }

    async fn increment_usage(&self, token_id: &str) -> Result<(), AppError> {
        Self::bump_usage(self.pool.as_ref(), token_id).await
    }

    async fn deactivate(&self, token_id: &str) -> Result<(), AppError> {
        Self::set_inactive(self.pool.as_ref(), token_id).await
    }

    async fn deactivate_all_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE tokens SET is_active = FALSE WHERE is_active AND expires_at <= $1",
        )
        .bind(Utc::now())
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn append_access_log(&self, entry: NewAccessLog) -> Result<AccessLog, AppError> {
        Self::insert_access_log(self.pool.as_ref(), &entry).await
    }

    async fn record_access(&self, entry: NewAccessLog) -> Result<AccessLog, AppError> {
        let mut tx = self.pool.begin().await?;

        Self::bump_usage(&mut *tx, &entry.token_id).await?;
        let log = Self::insert_access_log(&mut *tx, &entry).await?;

        tx.commit().await?;

        Ok(log)
    }

    async fn retire_with_log(&self, entry: NewAccessLog) -> Result<AccessLog, AppError> {
        let mut tx = self.pool.begin().await?;

        Self::set_inactive(&mut *tx, &entry.token_id).await?;
        let log = Self::insert_access_log(&mut *tx, &entry).await?;

        tx.commit().await?;

        Ok(log)
    }

    async fn list_access_logs(
        &self,
        token_id: &str,
        filter: AccessLogFilter,
    ) -> Result<Vec<AccessLog>, AppError> {
        let sql = format!(
            "SELECT {ACCESS_LOG_COLUMNS} FROM access_logs \
             WHERE token_id = $1 \
               AND ($2::timestamptz IS NULL OR access_time >= $2) \
               AND ($3::timestamptz IS NULL OR access_time <= $3) \
             ORDER BY access_time DESC, id DESC \
             LIMIT $4 OFFSET $5"
        );

        let rows = sqlx::query_as::<_, AccessLogRow>(&sql)
            .bind(token_id)
            .bind(filter.from_date)
            .bind(filter.to_date)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(AccessLog::from).collect())
    }

    async fn count_access_logs(
        &self,
        token_id: &str,
        from_date: Option<DateTime<Utc>>,
        to_date: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM access_logs
            WHERE token_id = $1
              AND ($2::timestamptz IS NULL OR access_time >= $2)
              AND ($3::timestamptz IS NULL OR access_time <= $3)
            "#,
        )
        .bind(token_id)
        .bind(from_date)
        .bind(to_date)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
