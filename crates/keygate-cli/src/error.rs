use serde::Deserialize;

/// Errors from the management API client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The API returned a non-2xx status.
    #[error("{endpoint} returned {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Client configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl ClientError {
    /// Build an [`ClientError::Api`] from a raw response body, preferring the
    /// `{ "error": { "message" } }` field when the body carries one.
    pub(crate) fn api(endpoint: impl Into<String>, status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        Self::Api {
            endpoint: endpoint.into(),
            status,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_extracts_structured_message() {
        let err = ClientError::api(
            "POST /v1/keys",
            422,
            r#"{"error":{"code":"VALIDATION_ERROR","message":"invalid prefix"}}"#,
        );
        assert_eq!(err.to_string(), "POST /v1/keys returned 422: invalid prefix");
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let err = ClientError::api("GET /v1/keys", 502, "bad gateway\n");
        match err {
            ClientError::Api { message, status, .. } => {
                assert_eq!(status, 502);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
