//! # keygate-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for Keygate.
//! Binds to the configured port (default 3000).

use std::sync::Arc;

use keygate_api::db::keys::PgKeyStore;
use keygate_api::state::{AppConfig, AppState, LogFormat};
use keygate_state::{KeyStore, MemoryKeyStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // Initialize structured tracing.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(?config, "configuration loaded");
    if config.auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set, management routes are unauthenticated");
    }

    // Postgres when configured, otherwise in-memory.
    let pool = keygate_api::db::init_pool(config.database_url.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("Database initialization failed: {e}");
            e
        })?;
    let store: Arc<dyn KeyStore> = match pool {
        Some(pool) => Arc::new(PgKeyStore::new(pool)),
        None => Arc::new(MemoryKeyStore::new()),
    };

    let port = config.port;
    let app = keygate_api::app(AppState::new(store, config));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Keygate API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
