//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated via
//! `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`TokenStore`] - Tokens, usage accounting and access logs
//!
//! # Testing
//!
//! See integration tests in `tests/repository_token_store.rs` for usage examples.

pub mod token_store;

pub use token_store::{AccessLogFilter, TokenStore};

#[cfg(test)]
pub use token_store::MockTokenStore;
