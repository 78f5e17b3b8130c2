//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON serialization/deserialization and validator
//! for input validation.

pub mod access_logs;
pub mod health;
pub mod info;
pub mod pagination;
pub mod token;
