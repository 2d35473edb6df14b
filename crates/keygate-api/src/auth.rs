//! # Bearer Token Authentication
//!
//! Guards the management API with a single static token:
//!
//! ```text
//! Authorization: Bearer {AUTH_TOKEN}
//! ```
//!
//! The verification endpoint and health probes are mounted outside this
//! middleware. When no token is configured, every request passes; the
//! binary logs a warning at startup in that case.

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token. `None` leaves the routes unauthenticated.
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Constant-time comparison of bearer tokens.
///
/// When lengths differ, a dummy comparison runs so timing does not reveal
/// the expected length.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Check the `Authorization` header value against the expected token.
fn check_header(header_value: Option<&str>, expected: &str) -> Result<(), AppError> {
    let value = header_value
        .ok_or_else(|| AppError::Unauthorized("missing authorization header".into()))?;
    let provided = value.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("authorization header must use Bearer scheme".into())
    })?;
    if constant_time_token_eq(provided.trim(), expected) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("invalid bearer token".into()))
    }
}

/// Reject requests without the configured bearer token.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone());

    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match check_header(header_value, &expected) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::warn!(reason = %err, path = %request.uri().path(), "authentication failed");
            err.into_response()
        }
    }
}
