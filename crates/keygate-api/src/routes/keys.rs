//! # Key Management API
//!
//! Operator endpoints. Mounted behind bearer token auth.
//!
//! ## Endpoints
//!
//! - `POST /v1/keys` — issue keys
//! - `GET /v1/keys?filter=all|used|unused` — list keys, newest first
//! - `GET /v1/keys/:key` — inspect one key
//! - `POST /v1/keys/:key/reset` — clear a key's hardware binding

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use keygate_core::{DurationPolicy, KeyFilter, KeyId, KeyPrefix, KeyRecord, KeyStatus};
use keygate_state::IssueRequest;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_query, extract_validated_json, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to issue one or more keys.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueKeysRequest {
    /// Key prefix, uppercased on issue. At most 32 characters, no whitespace.
    pub prefix: String,
    /// Hours as a number or string (1-8760), or `"random"` for 6/12/24.
    #[schema(value_type = String, example = "24")]
    pub duration: DurationPolicy,
    /// How many keys to create. Clamped to 1-50; absent means 1.
    /// Any JSON number is accepted and saturates to the `i64` range first.
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<i64>,
    /// Operator note stored on every key. Defaults to "Free Key".
    pub note: Option<String>,
}

fn lenient_count<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<serde_json::Number>::deserialize(de)?.map(|n| saturate(&n)))
}

fn saturate(n: &serde_json::Number) -> i64 {
    if let Some(v) = n.as_i64() {
        v
    } else if n.is_u64() {
        i64::MAX
    } else {
        // `as` saturates float to int casts.
        n.as_f64().map_or(0, |f| f as i64)
    }
}

impl Validate for IssueKeysRequest {
    fn validate(&self) -> Result<(), String> {
        KeyPrefix::new(self.prefix.as_str())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Keys created by one request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssueKeysResponse {
    /// Identifiers in generation order.
    pub keys: Vec<String>,
    /// The policy keys were issued under: hours, or `random`.
    pub duration: String,
    /// Note stored on every key.
    pub note: String,
}

/// Listing query.
#[derive(Debug, Default, Deserialize)]
pub struct ListKeysParams {
    /// `all` (default), `used` or `unused`.
    pub filter: Option<String>,
}

/// A key as shown to operators, with status derived at request time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KeyView {
    /// The license key.
    pub key: String,
    /// Validity window started by first activation.
    pub duration_hours: u32,
    /// `unused`, `active` or `expired`.
    #[schema(value_type = String)]
    pub status: KeyStatus,
    /// Hardware ID the key is bound to, if activated.
    pub bound_hwid: Option<String>,
    /// End of the validity window, if activated.
    pub expires_at: Option<DateTime<Utc>>,
    /// Operator note.
    pub note: String,
    /// When the key was issued.
    pub created_at: DateTime<Utc>,
}

impl KeyView {
    /// Render `record` as seen at `now`.
    pub fn at(record: KeyRecord, now: DateTime<Utc>) -> Self {
        let status = record.status_at(now);
        let expires_at = record.expires_at();
        let bound_hwid = record.bound_hwid().map(|h| h.to_string());
        Self {
            key: record.id.into(),
            duration_hours: record.duration_hours.get(),
            status,
            bound_hwid,
            expires_at,
            note: record.note,
            created_at: record.created_at,
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the key management router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/keys", get(list_keys).post(issue_keys))
        .route("/v1/keys/:key", get(get_key))
        .route("/v1/keys/:key/reset", post(reset_key))
}

fn parse_key(raw: String) -> Result<KeyId, AppError> {
    Ok(KeyId::new(raw)?)
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/keys — Issue new keys.
#[utoipa::path(
    post,
    path = "/v1/keys",
    request_body = IssueKeysRequest,
    responses(
        (status = 201, description = "Keys issued", body = IssueKeysResponse),
        (status = 409, description = "Could not generate a unique key", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
        (status = 503, description = "Key store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "keys"
)]
pub(crate) async fn issue_keys(
    State(state): State<AppState>,
    body: Result<Json<IssueKeysRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssueKeysResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let request = IssueRequest {
        prefix: KeyPrefix::new(req.prefix)?,
        policy: req.duration,
        count: req.count,
        note: req.note,
    };

    let mut rng = StdRng::from_entropy();
    let issued = state.issuance().issue(request, &mut rng, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueKeysResponse {
            keys: issued.keys.into_iter().map(String::from).collect(),
            duration: issued.policy.to_string(),
            note: issued.note,
        }),
    ))
}

/// GET /v1/keys — List keys, newest first.
#[utoipa::path(
    get,
    path = "/v1/keys",
    params(("filter" = Option<String>, Query, description = "all (default), used or unused")),
    responses(
        (status = 200, description = "Matching keys", body = Vec<KeyView>),
        (status = 422, description = "Unknown filter", body = crate::error::ErrorBody),
        (status = 503, description = "Key store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "keys"
)]
pub(crate) async fn list_keys(
    State(state): State<AppState>,
    params: Result<Query<ListKeysParams>, QueryRejection>,
) -> Result<Json<Vec<KeyView>>, AppError> {
    let params = extract_query(params)?;
    let filter = match params.filter.as_deref() {
        None | Some("") => KeyFilter::All,
        Some(raw) => raw.parse()?,
    };

    let now = Utc::now();
    let records = state.admin().list(filter).await?;
    Ok(Json(records.into_iter().map(|r| KeyView::at(r, now)).collect()))
}

/// GET /v1/keys/:key — Inspect one key.
#[utoipa::path(
    get,
    path = "/v1/keys/{key}",
    params(("key" = String, Path, description = "License key")),
    responses(
        (status = 200, description = "Key found", body = KeyView),
        (status = 404, description = "Key not found", body = crate::error::ErrorBody),
        (status = 503, description = "Key store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "keys"
)]
pub(crate) async fn get_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<KeyView>, AppError> {
    let id = parse_key(key)?;
    let record = state.admin().inspect(&id).await?;
    Ok(Json(KeyView::at(record, Utc::now())))
}

/// POST /v1/keys/:key/reset — Clear a key's hardware binding.
#[utoipa::path(
    post,
    path = "/v1/keys/{key}/reset",
    params(("key" = String, Path, description = "License key")),
    responses(
        (status = 200, description = "Key reset", body = KeyView),
        (status = 404, description = "Key not found", body = crate::error::ErrorBody),
        (status = 503, description = "Key store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "keys"
)]
pub(crate) async fn reset_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<KeyView>, AppError> {
    let id = parse_key(key)?;
    let record = state.admin().reset(&id).await?;
    Ok(Json(KeyView::at(record, Utc::now())))
}
