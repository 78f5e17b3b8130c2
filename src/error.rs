//! Application error type and its HTTP mapping.
//!
//! Every fallible operation in the crate returns [`AppError`]. Handlers return it
//! directly; [`IntoResponse`] turns it into a JSON error body with a stable `code`.
//!
//! Server-side failures ([`AppError::CorruptToken`], [`AppError::StoreUnavailable`],
//! [`AppError::Internal`]) never expose their message or details to clients: the
//! response carries a generic "Internal error" and the cause is logged instead.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::utils::db_error::is_duplicate_token_id;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Error payload returned to API clients.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request body or query failed validation.
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// The target URL is not a well-formed absolute URL.
    #[error("{message}")]
    InvalidUrl { message: String, details: Value },

    /// Unknown token id or resource.
    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// Token is inactive or expired and no successor exists.
    #[error("{message}")]
    Gone { message: String, details: Value },

    /// Unique constraint violation, e.g. a duplicate token id.
    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// A live token whose stored ciphertext cannot be decrypted.
    #[error("{message}")]
    CorruptToken { message: String, details: Value },

    /// Backend connectivity or query failure.
    #[error("{message}")]
    StoreUnavailable { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn invalid_url(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidUrl {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn gone(message: impl Into<String>, details: Value) -> Self {
        Self::Gone {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn corrupt_token(message: impl Into<String>, details: Value) -> Self {
        Self::CorruptToken {
            message: message.into(),
            details,
        }
    }

    pub fn store_unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Gone { .. } => StatusCode::GONE,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::CorruptToken { .. }
            | AppError::StoreUnavailable { .. }
            | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true for errors caused by the server rather than the request.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Converts the error into the client-facing payload.
    ///
    /// Server errors are collapsed to a generic message with empty details.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (code, message, details) = match self {
            AppError::Validation { message, details } => ("validation_error", message, details),
            AppError::InvalidUrl { message, details } => ("invalid_url", message, details),
            AppError::NotFound { message, details } => ("not_found", message, details),
            AppError::Gone { message, details } => ("gone", message, details),
            AppError::Conflict { message, details } => ("conflict", message, details),
            AppError::CorruptToken { .. }
            | AppError::StoreUnavailable { .. }
            | AppError::Internal { .. } => {
                return ErrorInfo {
                    code: "internal_error",
                    message: "Internal error".to_string(),
                    details: json!({}),
                };
            }
        };

        ErrorInfo {
            code,
            message: message.clone(),
            details: details.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        }

        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(e.field_errors()).unwrap_or_else(|_| json!({}));
        AppError::bad_request("Request validation failed", details)
    }
}

pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if is_duplicate_token_id(&e) {
        return AppError::conflict("Token id already exists", json!({}));
    }

    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::conflict(
            "Unique constraint violation",
            json!({ "constraint": db.constraint() }),
        );
    }

    AppError::store_unavailable("Database error", json!({ "reason": e.to_string() }))
}
