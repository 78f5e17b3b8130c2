//! Token store implementations.
//!
//! Concrete implementations of [`crate::domain::repositories::TokenStore`].
//!
//! # Stores
//!
//! - [`PgTokenStore`] - PostgreSQL storage via SQLx
//! - [`MemoryTokenStore`] - In-process storage for tests and local runs

pub mod memory_token_store;
pub mod pg_token_store;

pub use memory_token_store::MemoryTokenStore;
pub use pg_token_store::PgTokenStore;
