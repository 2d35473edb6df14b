//! # Key Verification
//!
//! The endpoint client runtimes call on every session start.
//!
//! - `GET /api/verify?key=...&hwid=...` (`identifier` is accepted for `key`)
//!
//! Unauthenticated and CORS-permissive. Every business outcome is HTTP 200
//! with `{status, msg, expire?}`; only a key store failure returns 503.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use keygate_core::format_instant;
use keygate_state::Verdict;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use utoipa::ToSchema;

use crate::state::AppState;

/// Query parameters. All optional so that absence becomes a verdict, not a
/// rejection.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    /// The license key.
    pub key: Option<String>,
    /// Alias for `key`, used when `key` is absent.
    pub identifier: Option<String>,
    /// Hardware ID of the calling machine.
    pub hwid: Option<String>,
}

impl VerifyParams {
    /// The presented key, preferring `key` over `identifier`.
    fn presented_key(&self) -> &str {
        [&self.key, &self.identifier]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|k| !k.trim().is_empty())
            .unwrap_or("")
    }
}

/// Verification reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    /// One of `error`, `invalid`, `expired`, `success`, `hwid_mismatch`.
    pub status: String,
    /// Message for the end user.
    pub msg: String,
    /// New expiry, RFC 3339. Present only on first activation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<String>,
}

impl From<&Verdict> for VerifyResponse {
    fn from(verdict: &Verdict) -> Self {
        Self {
            status: verdict.status().to_string(),
            msg: verdict.message(),
            expire: verdict.expires_at().map(format_instant),
        }
    }
}

impl VerifyResponse {
    fn unavailable() -> Self {
        Self {
            status: "error".to_string(),
            msg: "service temporarily unavailable".to_string(),
            expire: None,
        }
    }
}

/// Build the verification router with its CORS policy.
pub fn router() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/verify", get(verify_key))
        .layer(cors)
}

/// GET /api/verify — Verify a key for a hardware ID, binding it on first use.
#[utoipa::path(
    get,
    path = "/api/verify",
    params(
        ("key" = Option<String>, Query, description = "License key"),
        ("identifier" = Option<String>, Query, description = "Alias of key"),
        ("hwid" = Option<String>, Query, description = "Hardware ID of the caller"),
    ),
    responses(
        (status = 200, description = "Verification outcome", body = VerifyResponse),
        (status = 503, description = "Key store unavailable", body = VerifyResponse),
    ),
    tag = "verify"
)]
pub(crate) async fn verify_key(
    State(state): State<AppState>,
    params: Result<Query<VerifyParams>, QueryRejection>,
) -> Response {
    // An undecodable query carries no usable key or hwid.
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let hwid = params.hwid.as_deref().unwrap_or("");

    match state
        .activation()
        .verify(params.presented_key(), hwid, Utc::now())
        .await
    {
        Ok(verdict) => {
            state.metrics.record_verdict(verdict.kind());
            (StatusCode::OK, Json(VerifyResponse::from(&verdict))).into_response()
        }
        Err(err) => {
            state.metrics.record_storage_failure();
            tracing::error!(error = %err, "verification failed on key store");
            (StatusCode::SERVICE_UNAVAILABLE, Json(VerifyResponse::unavailable())).into_response()
        }
    }
}
