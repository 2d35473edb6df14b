//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The key store is held behind `Arc<dyn KeyStore>`: Postgres in
//! production, [`MemoryKeyStore`] when no database is configured. Engines
//! are cheap handles over that store and are built per request.

use std::sync::Arc;

use axum::extract::FromRef;
use keygate_state::{ActivationEngine, IssuanceEngine, KeyAdmin, KeyStore, MemoryKeyStore};
use thiserror::Error;

use crate::middleware::metrics::ApiMetrics;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Log output format for the service binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Errors building [`AppConfig`] from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `PORT` was set but is not a valid port number.
    #[error("invalid PORT value: {0:?}")]
    InvalidPort(String),
}

/// Application configuration.
///
/// Custom `Debug` redacts the auth token and database URL, which may carry
/// credentials.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token for the management API.
    /// If `None`, management routes are unauthenticated.
    pub auth_token: Option<String>,
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            auth_token: None,
            database_url: None,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORT` (default: 3000)
    /// - `AUTH_TOKEN` (optional; absent disables management auth)
    /// - `DATABASE_URL` (optional; absent means in-memory store)
    /// - `LOG_FORMAT` (`json` for JSON lines, anything else for text)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
        };
        let log_format = match var("LOG_FORMAT") {
            Some(f) if f.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            port,
            auth_token: var("AUTH_TOKEN"),
            database_url: var("DATABASE_URL"),
            log_format,
        })
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The key store every engine runs against.
    pub store: Arc<dyn KeyStore>,
    /// Request and verification counters.
    pub metrics: ApiMetrics,
    /// Application configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Create state over the given store.
    pub fn new(store: Arc<dyn KeyStore>, config: AppConfig) -> Self {
        Self {
            store,
            metrics: ApiMetrics::new(),
            config,
        }
    }

    /// Create state over a fresh in-memory store.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(Arc::new(MemoryKeyStore::new()), config)
    }

    /// Verification engine over this state's store.
    pub fn activation(&self) -> ActivationEngine {
        ActivationEngine::new(Arc::clone(&self.store))
    }

    /// Issuance engine over this state's store.
    pub fn issuance(&self) -> IssuanceEngine {
        IssuanceEngine::new(Arc::clone(&self.store))
    }

    /// Reset, inspect and list over this state's store.
    pub fn admin(&self) -> KeyAdmin {
        KeyAdmin::new(Arc::clone(&self.store))
    }
}

impl FromRef<AppState> for ApiMetrics {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}
