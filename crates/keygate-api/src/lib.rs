//! # keygate-api — Axum Service for Keygate
//!
//! Serves the public verification endpoint that client runtimes call on
//! session start, and the operator API that issues and manages keys.
//!
//! ## API Surface
//!
//! | Path                  | Module                | Auth   |
//! |-----------------------|-----------------------|--------|
//! | `/api/verify`         | [`routes::verify`]    | none, CORS |
//! | `/v1/keys/*`          | [`routes::keys`]      | bearer |
//! | `/openapi.json`       | [`openapi`]           | bearer |
//! | `/health/*`, `/metrics` | this module         | none   |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware (management only) → Handler
//! ```

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::middleware::metrics::{metrics_handler, metrics_middleware};
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Verification, health probes and metrics are mounted outside the auth
/// middleware so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    // Authenticated operator routes.
    let management = Router::new()
        .merge(routes::keys::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config));

    // Unauthenticated routes.
    let public = Router::new()
        .merge(routes::verify::router())
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public)
        .merge(management)
        .layer(from_fn_with_state(state.metrics.clone(), metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe. Always 200 while the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 when the key store answers, 503 otherwise.
async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ready"),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "key store unavailable")
        }
    }
}
