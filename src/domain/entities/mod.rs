//! Core domain entities.
//!
//! Entities are plain data structures. Each persisted entity has a separate
//! `New*` struct carrying only the fields the caller supplies on insert.
//!
//! - [`Token`] - An access token mapping to an encrypted target URL
//! - [`AccessLog`] - One access attempt against a token

pub mod access_log;
pub mod token;

pub use access_log::{AccessContext, AccessLog, AccessStatus, NewAccessLog};
pub use token::{NewToken, Token, TokenIdentity};
