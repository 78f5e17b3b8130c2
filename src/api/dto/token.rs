//! DTOs for token issuance and status endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::{IssuedToken, TokenRequest, TokenView};
use crate::domain::entities::TokenIdentity;

/// Request to issue (or reuse) a token for a target URL.
///
/// URL well-formedness is checked by the service so that it maps to the
/// `invalid_url` error code; only lengths are validated here.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTokenRequest {
    #[validate(length(min = 1, max = 4096))]
    pub original_url: String,

    #[validate(length(min = 1, max = 255))]
    pub user_id: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub session_id: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub device_id: Option<String>,

    /// Token lifetime. Missing or non-positive values use the server default.
    pub expires_in_seconds: Option<i64>,
}

impl From<CreateTokenRequest> for TokenRequest {
    fn from(r: CreateTokenRequest) -> Self {
        TokenRequest {
            original_url: r.original_url,
            identity: TokenIdentity::new(r.user_id, r.session_id, r.device_id),
            expires_in_seconds: r.expires_in_seconds,
        }
    }
}

/// Issued token returned to the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub secure_url: String,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(t: IssuedToken) -> Self {
        Self {
            token: t.token_id,
            secure_url: t.secure_url,
            expires_at: t.expires_at,
        }
    }
}

/// Public status of a token.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenStatusResponse {
    pub token_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub access_count: i64,
    pub last_accessed: Option<DateTime<Utc>>,
}

impl From<TokenView> for TokenStatusResponse {
    fn from(v: TokenView) -> Self {
        Self {
            token_id: v.token_id,
            created_at: v.created_at,
            expires_at: v.expires_at,
            is_active: v.is_active,
            access_count: v.access_count,
            last_accessed: v.last_accessed,
        }
    }
}
