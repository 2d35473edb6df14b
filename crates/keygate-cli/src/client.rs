//! # Management API Client
//!
//! Typed access to the authenticated `/v1/keys` endpoints of `keygate-api`.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/v1/keys` | Issue keys |
//! | GET    | `/v1/keys?filter=` | List keys, newest first |
//! | GET    | `/v1/keys/{key}` | Inspect one key |
//! | POST   | `/v1/keys/{key}/reset` | Clear a key's hardware binding |
//!
//! Key identifiers are percent-encoded as path segments, so keys issued
//! under older naming schemes still address correctly.

use std::time::Duration;

use chrono::{DateTime, Utc};
use keygate_core::{DurationPolicy, KeyFilter, KeyStatus};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Body of `POST /v1/keys`.
#[derive(Debug, Clone, Serialize)]
pub struct IssueKeys {
    pub prefix: String,
    pub duration: DurationPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Reply to `POST /v1/keys`.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuedKeys {
    pub keys: Vec<String>,
    /// Hours, or `random`.
    pub duration: String,
    pub note: String,
}

/// A key as reported by the management API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeySummary {
    pub key: String,
    pub duration_hours: u32,
    pub status: KeyStatus,
    #[serde(default)]
    pub bound_hwid: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// HTTP client for the key management API.
#[derive(Debug, Clone)]
pub struct KeygateClient {
    http: reqwest::Client,
    base_url: Url,
}

impl KeygateClient {
    /// Create a client for the API rooted at `api_url`.
    ///
    /// When `token` is set it is sent as a bearer token on every request.
    pub fn new(api_url: &str, token: Option<&str>) -> Result<Self, ClientError> {
        let base_url = Url::parse(api_url)
            .map_err(|e| ClientError::Config(format!("invalid API URL {api_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "API URL {api_url:?} cannot carry a path"
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ClientError::Config("token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self { http, base_url })
    }

    /// Issue keys.
    ///
    /// Calls `POST {base_url}/v1/keys`.
    pub async fn issue(&self, req: &IssueKeys) -> Result<IssuedKeys, ClientError> {
        let endpoint = "POST /v1/keys";
        let url = self.url(&["v1", "keys"])?;

        let resp = self
            .http
            .post(url)
            .json(req)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        decode(endpoint, resp).await
    }

    /// Inspect one key. `Ok(None)` when the key does not exist.
    ///
    /// Calls `GET {base_url}/v1/keys/{key}`.
    pub async fn get_key(&self, key: &str) -> Result<Option<KeySummary>, ClientError> {
        let endpoint = format!("GET /v1/keys/{key}");
        let url = self.url(&["v1", "keys", key])?;

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(&endpoint, resp).await.map(Some)
    }

    /// Clear a key's binding. `Ok(None)` when the key does not exist.
    ///
    /// Calls `POST {base_url}/v1/keys/{key}/reset`.
    pub async fn reset_key(&self, key: &str) -> Result<Option<KeySummary>, ClientError> {
        let endpoint = format!("POST /v1/keys/{key}/reset");
        let url = self.url(&["v1", "keys", key, "reset"])?;

        let resp = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(&endpoint, resp).await.map(Some)
    }

    /// List keys matching `filter`, newest first.
    ///
    /// Calls `GET {base_url}/v1/keys?filter={filter}`.
    pub async fn list_keys(&self, filter: KeyFilter) -> Result<Vec<KeySummary>, ClientError> {
        let endpoint = "GET /v1/keys";
        let url = self.url(&["v1", "keys"])?;

        let resp = self
            .http
            .get(url)
            .query(&[("filter", filter.as_str())])
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        decode(endpoint, resp).await
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Config(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn decode<T: DeserializeOwned>(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::api(endpoint, status, &body));
    }

    resp.json().await.map_err(|e| ClientError::Deserialization {
        endpoint: endpoint.into(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_url() {
        assert!(matches!(
            KeygateClient::new("not a url", None),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            KeygateClient::new("mailto:ops@example.com", None),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn rejects_token_with_control_characters() {
        assert!(matches!(
            KeygateClient::new("http://127.0.0.1:3000", Some("bad\ntoken")),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn key_segments_are_percent_encoded() {
        let client = KeygateClient::new("http://127.0.0.1:3000/", None).unwrap();
        let url = client.url(&["v1", "keys", "OLD KEY/1"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:3000/v1/keys/OLD%20KEY%2F1");
    }

    #[test]
    fn base_path_is_preserved() {
        let client = KeygateClient::new("https://ops.example.com/keygate", None).unwrap();
        let url = client.url(&["v1", "keys"]).unwrap();
        assert_eq!(url.as_str(), "https://ops.example.com/keygate/v1/keys");
    }

    #[test]
    fn issue_body_omits_absent_fields() {
        let body = IssueKeys {
            prefix: "swift".into(),
            duration: DurationPolicy::Random,
            count: None,
            note: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"prefix": "swift", "duration": "random"}));
    }
}
