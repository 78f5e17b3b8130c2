//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod access_logs;
pub mod fallback;
pub mod health;
pub mod info;
pub mod redirect;
pub mod tokens;

pub use access_logs::access_logs_handler;
pub use fallback::fallback_handler;
pub use health::health_handler;
pub use info::info_handler;
pub use redirect::redirect_handler;
pub use tokens::{create_token_handler, token_status_handler};
