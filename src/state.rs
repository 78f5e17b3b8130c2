//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{RedirectResolver, TokenService, TokenSettings};
use crate::domain::repositories::TokenStore;
use crate::utils::cipher::UrlCipher;

/// Application state shared across HTTP handlers.
///
/// Cloned per request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub token_service: Arc<TokenService<dyn TokenStore>>,
    pub redirect_resolver: Arc<RedirectResolver<dyn TokenStore>>,
    /// Trust `X-Forwarded-For` / `X-Real-IP` for access log addresses.
    pub behind_proxy: bool,
}

impl AppState {
    /// Wires the services around a store and cipher.
    pub fn new(
        store: Arc<dyn TokenStore>,
        cipher: Arc<UrlCipher>,
        settings: TokenSettings,
        behind_proxy: bool,
    ) -> Self {
        let token_service = Arc::new(TokenService::new(store.clone(), cipher, settings));
        let redirect_resolver = Arc::new(RedirectResolver::new(store, token_service.clone()));

        Self {
            token_service,
            redirect_resolver,
            behind_proxy,
        }
    }
}
