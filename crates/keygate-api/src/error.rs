//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps engine and validation errors to HTTP status codes with a JSON body
//! `{"error": {"code", "message"}}`. Storage details are logged, never
//! returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keygate_core::KeyId;
use keygate_state::EngineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// The error detail.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type for the management API.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (422).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid bearer token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Identifier generation kept colliding (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Key store unreachable or failing (503). Message is logged only.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }

    /// The structured body for this error, as sent to clients.
    pub fn body(&self) -> ErrorBody {
        let (_, code) = self.status_and_code();
        let message = match self {
            Self::ServiceUnavailable(_) => "service temporarily unavailable".to_string(),
            other => other.to_string(),
        };
        ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();

        match &self {
            Self::ServiceUnavailable(_) => tracing::error!(error = %self, "key store failure"),
            Self::Conflict(_) => tracing::warn!(error = %self, "key generation conflict"),
            _ => {}
        }

        (status, Json(self.body())).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Storage(msg) => Self::ServiceUnavailable(msg),
            EngineError::NotFound(key) => Self::NotFound(format!("key {key} not found")),
            EngineError::Validation(e) => Self::Validation(e.to_string()),
            EngineError::GenerationConflict {
                prefix,
                attempts,
                issued,
            } => {
                let mut message = format!(
                    "could not generate a unique key under prefix {prefix} after {attempts} attempts"
                );
                if !issued.is_empty() {
                    let keys: Vec<&str> = issued.iter().map(KeyId::as_str).collect();
                    message.push_str(&format!(
                        "; keys issued before the failure: {}",
                        keys.join(", ")
                    ));
                }
                Self::Conflict(message)
            }
        }
    }
}

impl From<keygate_core::ValidationError> for AppError {
    fn from(err: keygate_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn not_found_status_code() {
        let (status, code) = AppError::NotFound("k".into()).status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }

    #[test]
    fn validation_status_code() {
        let (status, code) = AppError::Validation("bad".into()).status_and_code();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "VALIDATION_ERROR");
    }

    #[test]
    fn engine_errors_map_to_statuses() {
        let cases = [
            (EngineError::Storage("db down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (EngineError::NotFound("K-1".into()), StatusCode::NOT_FOUND),
            (
                EngineError::GenerationConflict {
                    prefix: "X".into(),
                    attempts: 5,
                    issued: Vec::new(),
                },
                StatusCode::CONFLICT,
            ),
            (
                EngineError::Validation(keygate_core::ValidationError::EmptyKeyId),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (engine_err, expected) in cases {
            let (status, _) = AppError::from(engine_err).status_and_code();
            assert_eq!(status, expected);
        }
    }

    #[tokio::test]
    async fn storage_details_are_not_leaked() {
        let err = AppError::from(EngineError::Storage("password authentication failed".into()));
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
        assert_eq!(body["error"]["message"], "service temporarily unavailable");
    }

    #[tokio::test]
    async fn generation_conflict_names_keys_already_issued() {
        let err = AppError::from(EngineError::GenerationConflict {
            prefix: "SWIFT".into(),
            attempts: 5,
            issued: vec![
                KeyId::new("SWIFT-a").unwrap(),
                KeyId::new("SWIFT-b").unwrap(),
            ],
        });
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body["error"]["message"],
            "conflict: could not generate a unique key under prefix SWIFT after 5 attempts; \
             keys issued before the failure: SWIFT-a, SWIFT-b"
        );
    }

    #[tokio::test]
    async fn client_errors_keep_their_message() {
        let (status, body) = response_parts(AppError::NotFound("key K-9 not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"]["message"].as_str().unwrap().contains("K-9"));
    }
}
