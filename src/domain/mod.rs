//! Domain layer containing entities and repository contracts.
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers. Business rules live in services (see [`crate::application::services`]).
//!
//! - [`entities`] - Tokens and access logs
//! - [`repositories`] - Data access trait definitions

pub mod entities;
pub mod repositories;
