//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating store calls,
//! validation and state rules. Services consume the [`TokenStore`] trait and
//! provide a clean API for HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::token_service::TokenService`] - Token creation, dedup and status
//! - [`services::redirect_resolver::RedirectResolver`] - Access resolution and logging
//! - [`sweeper::Sweeper`] - Background expiry sweeps
//!
//! [`TokenStore`]: crate::domain::repositories::TokenStore

pub mod services;
pub mod sweeper;
