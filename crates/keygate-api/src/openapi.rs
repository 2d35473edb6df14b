//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI document,
//! served at `/openapi.json` behind management auth.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Keygate API",
        version = "0.3.0",
        description = "License key issuance and hardware-bound verification.",
        license(name = "BUSL-1.1")
    ),
    paths(
        crate::routes::verify::verify_key,
        crate::routes::keys::issue_keys,
        crate::routes::keys::list_keys,
        crate::routes::keys::get_key,
        crate::routes::keys::reset_key,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::verify::VerifyResponse,
        crate::routes::keys::IssueKeysRequest,
        crate::routes::keys::IssueKeysResponse,
        crate::routes::keys::KeyView,
        crate::middleware::metrics::MetricsSnapshot,
        crate::middleware::metrics::VerificationCounts,
    )),
    tags(
        (name = "verify", description = "Client key verification"),
        (name = "keys", description = "Operator key management"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
