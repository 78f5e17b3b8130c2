//! Background task deactivating expired tokens.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::application::services::TokenService;
use crate::domain::repositories::TokenStore;

/// Periodic expiry sweeper.
///
/// Sweeps once immediately, then every `period`. Ticks missed while a sweep is
/// running are delayed, so sweeps never overlap. Stops when the cancel channel
/// flips to `true` or its sender is dropped.
pub struct Sweeper<S: TokenStore + ?Sized> {
    tokens: Arc<TokenService<S>>,
    period: Duration,
}

impl<S: TokenStore + ?Sized + 'static> Sweeper<S> {
    pub fn new(tokens: Arc<TokenService<S>>, period: Duration) -> Self {
        Self { tokens, period }
    }

    /// Spawns the sweep loop onto the runtime.
    pub fn spawn(self, cancel: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    /// Runs the sweep loop until cancelled.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(period_secs = self.period.as_secs(), "Expiry sweeper started");

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.tokens.sweep_expired().await;
                }
            }
        }

        tracing::info!("Expiry sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::TokenSettings;
    use crate::domain::entities::{Token, TokenIdentity};
    use crate::infrastructure::persistence::MemoryTokenStore;
    use crate::utils::cipher::UrlCipher;
    use chrono::Utc;

    fn expired_token(token_id: &str) -> Token {
        let now = Utc::now();
        Token {
            id: 0,
            token_id: token_id.to_string(),
            original_url: "https://example.com".to_string(),
            encrypted_url: "sealed".to_string(),
            identity: TokenIdentity::default(),
            created_at: now - chrono::Duration::hours(2),
            expires_at: now - chrono::Duration::hours(1),
            is_active: true,
            access_count: 0,
            last_accessed: None,
        }
    }

    fn service(store: Arc<MemoryTokenStore>) -> Arc<TokenService<MemoryTokenStore>> {
        Arc::new(TokenService::new(
            store,
            Arc::new(UrlCipher::new(&[1u8; 32])),
            TokenSettings {
                base_url: "http://localhost:8000".to_string(),
                default_ttl_seconds: 3600,
            },
        ))
    }

    #[tokio::test]
    async fn test_sweeps_on_start_and_stops_on_cancel() {
        let store = Arc::new(MemoryTokenStore::new());
        store.insert_raw(expired_token("expired-1")).await.unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = Sweeper::new(service(store.clone()), Duration::from_secs(3600)).spawn(rx);

        let mut swept = false;
        for _ in 0..100 {
            if !store.get_by_id("expired-1").await.unwrap().unwrap().is_active {
                swept = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(swept);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_stops_when_sender_dropped() {
        let store = Arc::new(MemoryTokenStore::new());
        let (tx, rx) = watch::channel(false);
        let handle = Sweeper::new(service(store), Duration::from_secs(3600)).spawn(rx);

        drop(tx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
