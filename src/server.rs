//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, migrations, the expiry sweeper and the Axum
//! server lifecycle.

use crate::application::services::{TokenService, TokenSettings};
use crate::application::sweeper::Sweeper;
use crate::config::Config;
use crate::domain::repositories::TokenStore;
use crate::infrastructure::persistence::PgTokenStore;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

const CONNECT_ATTEMPTS: usize = 5;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - URL cipher from `ENCRYPTION_KEY`
/// - PostgreSQL connection pool (with retry)
/// - Migrations
/// - Expiry sweeper on its own single-connection pool
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - The encryption key is invalid
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let cipher = Arc::new(config.cipher()?);

    let pool = connect_pool(&config, config.db_max_connections).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let settings = TokenSettings {
        base_url: config.base_url.clone(),
        default_ttl_seconds: config.token_expiry_seconds,
    };

    let store: Arc<dyn TokenStore> = Arc::new(PgTokenStore::new(Arc::new(pool)));
    let state = AppState::new(store, cipher.clone(), settings.clone(), config.behind_proxy);

    let sweeper_pool = connect_pool(&config, 1).await?;
    let sweeper_store: Arc<dyn TokenStore> = Arc::new(PgTokenStore::new(Arc::new(sweeper_pool)));
    let sweeper_service = Arc::new(TokenService::new(sweeper_store, cipher, settings));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = Sweeper::new(
        sweeper_service,
        Duration::from_secs(config.sweep_interval_seconds),
    )
    .spawn(shutdown_rx);

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("HTTP server stopped, stopping sweeper");
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        tracing::error!("Sweeper task failed: {e}");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Opens a PostgreSQL pool, retrying with exponential backoff.
pub async fn connect_pool(config: &Config, max_connections: u32) -> Result<PgPool> {
    let strategy = ExponentialBackoff::from_millis(100)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(CONNECT_ATTEMPTS);

    let options = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime));

    Retry::spawn(strategy, || {
        let options = options.clone();
        async move {
            options
                .connect(&config.database_url)
                .await
                .inspect_err(|e| tracing::warn!("Database connection attempt failed: {e}"))
        }
    })
    .await
    .context("Failed to connect to database")
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
