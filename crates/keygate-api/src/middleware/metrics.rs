//! # Request Metrics
//!
//! Lightweight in-process counters using atomics, served as JSON at
//! `/metrics`. Request and error totals are counted by middleware;
//! verification outcomes are counted by the verify handler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use keygate_state::VerdictKind;
use serde::Serialize;
use utoipa::ToSchema;

/// Per-outcome verification counters.
#[derive(Debug, Default)]
struct VerdictCounters {
    malformed_request: AtomicU64,
    invalid: AtomicU64,
    expired: AtomicU64,
    activated: AtomicU64,
    welcome: AtomicU64,
    hwid_mismatch: AtomicU64,
    storage_failure: AtomicU64,
}

impl VerdictCounters {
    fn slot(&self, kind: VerdictKind) -> &AtomicU64 {
        match kind {
            VerdictKind::MalformedRequest => &self.malformed_request,
            VerdictKind::Invalid => &self.invalid,
            VerdictKind::Expired => &self.expired,
            VerdictKind::Activated => &self.activated,
            VerdictKind::Welcome => &self.welcome,
            VerdictKind::HwidMismatch => &self.hwid_mismatch,
        }
    }
}

/// Shared metrics state. Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    request_count: Arc<AtomicU64>,
    error_count: Arc<AtomicU64>,
    verdicts: Arc<VerdictCounters>,
}

/// Point-in-time copy of all counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MetricsSnapshot {
    /// Requests served, all routes.
    pub requests: u64,
    /// Responses with a 4xx or 5xx status.
    pub errors: u64,
    /// Verification outcomes by kind.
    pub verifications: VerificationCounts,
}

/// Verification outcome totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct VerificationCounts {
    /// Requests missing a key or HWID.
    pub malformed_request: u64,
    /// Unknown keys.
    pub invalid: u64,
    /// Keys past their expiry.
    pub expired: u64,
    /// First activations that bound a key.
    pub activated: u64,
    /// Repeat checks from the bound HWID.
    pub welcome: u64,
    /// Keys presented from a different HWID.
    pub hwid_mismatch: u64,
    /// Checks that failed on the key store.
    pub storage_failure: u64,
}

impl ApiMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return current request count.
    pub fn requests(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Return current error count.
    pub fn errors(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Count one verification outcome.
    pub fn record_verdict(&self, kind: VerdictKind) {
        self.verdicts.slot(kind).fetch_add(1, Ordering::Relaxed);
    }

    /// Count one verification that failed on the store.
    pub fn record_storage_failure(&self) {
        self.verdicts.storage_failure.fetch_add(1, Ordering::Relaxed);
    }

    /// Current count for one verification outcome.
    pub fn verdicts(&self, kind: VerdictKind) -> u64 {
        self.verdicts.slot(kind).load(Ordering::Relaxed)
    }

    /// Copy all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let v = &self.verdicts;
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            requests: self.requests(),
            errors: self.errors(),
            verifications: VerificationCounts {
                malformed_request: load(&v.malformed_request),
                invalid: load(&v.invalid),
                expired: load(&v.expired),
                activated: load(&v.activated),
                welcome: load(&v.welcome),
                hwid_mismatch: load(&v.hwid_mismatch),
                storage_failure: load(&v.storage_failure),
            },
        }
    }
}

/// Middleware that increments request and error counters.
pub async fn metrics_middleware(
    State(metrics): State<ApiMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    metrics.request_count.fetch_add(1, Ordering::Relaxed);
    if response.status().is_server_error() || response.status().is_client_error() {
        metrics.error_count.fetch_add(1, Ordering::Relaxed);
    }

    response
}

/// GET /metrics — Return a JSON snapshot of all counters.
pub async fn metrics_handler(State(metrics): State<ApiMetrics>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}
