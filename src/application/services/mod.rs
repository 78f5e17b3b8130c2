//! Business logic services for the application layer.

pub mod redirect_resolver;
pub mod token_service;

pub use redirect_resolver::{RedirectResolver, Resolution};
pub use token_service::{IssuedToken, TokenRequest, TokenService, TokenSettings, TokenView};
