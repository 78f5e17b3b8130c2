#![allow(dead_code)]

use axum::{Router, extract::ConnectInfo, routing::get};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use content_guard::api;
use content_guard::api::handlers::{
    fallback_handler, health_handler, info_handler, redirect_handler,
};
use content_guard::application::services::TokenSettings;
use content_guard::domain::entities::{Token, TokenIdentity};
use content_guard::domain::repositories::TokenStore;
use content_guard::infrastructure::persistence::MemoryTokenStore;
use content_guard::state::AppState;
use content_guard::utils::cipher::UrlCipher;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

pub const BASE_URL: &str = "http://localhost:8000";

pub fn test_cipher() -> Arc<UrlCipher> {
    Arc::new(UrlCipher::new(&[7u8; 32]))
}

pub fn create_test_state() -> (AppState, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    let settings = TokenSettings {
        base_url: BASE_URL.to_string(),
        default_ttl_seconds: 3600,
    };

    let dyn_store: Arc<dyn TokenStore> = store.clone();
    let state = AppState::new(dyn_store, test_cipher(), settings, false);

    (state, store)
}

/// Same routes as the production router, with a fixed peer address.
pub fn test_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(info_handler))
        .route("/health", get(health_handler))
        .route("/content/{token_id}", get(redirect_handler))
        .nest("/api", api::routes::api_routes())
        .fallback(fallback_handler)
        .layer(MockConnectInfoLayer)
        .with_state(state)
}

pub fn test_server() -> (TestServer, AppState, Arc<MemoryTokenStore>) {
    let (state, store) = create_test_state();
    let server = TestServer::new(test_app(state.clone())).unwrap();
    (server, state, store)
}

/// Seeds a token whose lifetime ended an hour ago.
pub async fn create_expired_token(store: &MemoryTokenStore, token_id: &str, url: &str) {
    let now = Utc::now();
    store
        .insert_raw(Token {
            id: 0,
            token_id: token_id.to_string(),
            original_url: url.to_string(),
            encrypted_url: test_cipher().encrypt(url).unwrap(),
            identity: TokenIdentity::default(),
            created_at: now - Duration::hours(2),
            expires_at: now - Duration::hours(1),
            is_active: true,
            access_count: 0,
            last_accessed: None,
        })
        .await
        .unwrap();
}

/// Seeds a live token whose ciphertext was sealed with a different key.
pub async fn create_corrupt_token(store: &MemoryTokenStore, token_id: &str, url: &str) {
    let now = Utc::now();
    let foreign = UrlCipher::new(&[9u8; 32]);
    store
        .insert_raw(Token {
            id: 0,
            token_id: token_id.to_string(),
            original_url: url.to_string(),
            encrypted_url: foreign.encrypt(url).unwrap(),
            identity: TokenIdentity::default(),
            created_at: now,
            expires_at: now + Duration::hours(1),
            is_active: true,
            access_count: 0,
            last_accessed: None,
        })
        .await
        .unwrap();
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
