//! Resolution of a token access into a redirect target.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::token_service::TokenService;
use crate::domain::entities::{AccessContext, AccessStatus, NewAccessLog, Token};
use crate::domain::repositories::TokenStore;
use crate::error::AppError;
use crate::utils::token_id::is_well_formed_token_id;

/// Where a bearer should be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The decrypted target URL of a live token.
    Target(String),
    /// A live token that replaces an inactive or expired one.
    Successor { token_id: String, secure_url: String },
}

/// Applies token state rules to an access attempt and records its outcome.
///
/// | State | Logged | Result |
/// |---|---|---|
/// | unknown | nothing | `NotFound` |
/// | inactive, or active past expiry (deactivated with the log entry) | 301 / 410 | `Successor` / `Gone` |
/// | live | 200 | `Target` |
/// | live, ciphertext unreadable | 500 | `CorruptToken` |
///
/// Every attempt on a known token leaves exactly one access log entry.
pub struct RedirectResolver<S: TokenStore + ?Sized> {
    store: Arc<S>,
    tokens: Arc<TokenService<S>>,
}

impl<S: TokenStore + ?Sized> RedirectResolver<S> {
    pub fn new(store: Arc<S>, tokens: Arc<TokenService<S>>) -> Self {
        Self { store, tokens }
    }

    /// Resolves an access to `token_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for unknown or malformed ids.
    /// Returns [`AppError::Gone`] if the token is no longer live and has no successor.
    /// Returns [`AppError::CorruptToken`] if a live token cannot be decrypted.
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    pub async fn resolve(
        &self,
        token_id: &str,
        context: AccessContext,
    ) -> Result<Resolution, AppError> {
        if !is_well_formed_token_id(token_id) {
            debug!(token_id, "Rejected malformed token id");
            return Err(token_not_found(token_id));
        }

        let token = self
            .store
            .get_by_id(token_id)
            .await?
            .ok_or_else(|| token_not_found(token_id))?;

        let now = Utc::now();

        if token.is_live_at(now) {
            return self.serve_live(&token, &context).await;
        }

        self.redirect_to_successor(&token, &context).await
    }

    async fn serve_live(
        &self,
        token: &Token,
        context: &AccessContext,
    ) -> Result<Resolution, AppError> {
        let url = match self.tokens.decrypt_url(token) {
            Ok(url) => url,
            Err(e) => {
                let entry = NewAccessLog::new(&token.token_id, context, AccessStatus::Failed);
                if let Err(log_err) = self.store.append_access_log(entry).await {
                    warn!(token_id = %token.token_id, error = %log_err, "Failed to log access");
                }
                record_metric(AccessStatus::Failed);
                return Err(e);
            }
        };

        let entry = NewAccessLog::new(&token.token_id, context, AccessStatus::Success);
        self.store.record_access(entry).await?;
        record_metric(AccessStatus::Success);

        Ok(Resolution::Target(url))
    }

    async fn redirect_to_successor(
        &self,
        token: &Token,
        context: &AccessContext,
    ) -> Result<Resolution, AppError> {
        let successor = self
            .tokens
            .find_successor(token)
            .await?
            .filter(|s| s.token_id != token.token_id);

        let status = if successor.is_some() {
            AccessStatus::Superseded
        } else {
            AccessStatus::Gone
        };

        let entry = NewAccessLog::new(&token.token_id, context, status);
        if token.is_active {
            self.store.retire_with_log(entry).await?;
            info!(token_id = %token.token_id, "Deactivated token expired on access");
        } else {
            self.store.append_access_log(entry).await?;
        }
        record_metric(status);

        match successor {
            Some(next) => {
                debug!(
                    token_id = %token.token_id,
                    successor = %next.token_id,
                    "Redirecting to successor"
                );
                Ok(Resolution::Successor {
                    secure_url: self.tokens.secure_url(&next.token_id),
                    token_id: next.token_id,
                })
            }
            None => Err(AppError::gone(
                "Token expired or inactive",
                json!({ "token_id": token.token_id }),
            )),
        }
    }
}

fn record_metric(status: AccessStatus) {
    metrics::counter!("token_access_total", "status" => status.as_label()).increment(1);
}

fn token_not_found(token_id: &str) -> AppError {
    AppError::not_found("Token not found", json!({ "token_id": token_id }))
}
