//! # Activation Engine
//!
//! Decides the outcome of a verification request and commits the one
//! mutation verification can cause: binding a fresh key to its first HWID.
//!
//! ## Decision order
//!
//! 1. Key or HWID blank: [`Verdict::MalformedRequest`], store not touched.
//! 2. Unknown key: [`Verdict::Invalid`].
//! 3. Bound and `now > expires_at`: [`Verdict::Expired`], whatever the HWID.
//! 4. Unbound: conditional bind. The winner gets [`Verdict::Activated`];
//!    a loser re-runs steps 3, 5 and 6 against the record the store returns.
//! 5. Same HWID: [`Verdict::Welcome`].
//! 6. Otherwise: [`Verdict::HwidMismatch`].
//!
//! Store faults surface as [`EngineError::Storage`] and never as a verdict.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use keygate_core::{format_instant, DurationHours, Hwid, KeyId, KeyRecord};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, StoreError};
use crate::store::{BindAttempt, KeyStore};

/// Upper bound on bind rounds for one request. A round is only repeated when
/// the record was reset between a lost bind and the re-read.
const MAX_BIND_ROUNDS: u32 = 3;

/// Verification outcome. All variants are business answers, not faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Key or HWID missing or blank.
    MalformedRequest,
    /// No such key.
    Invalid,
    /// The key's validity window has passed.
    Expired,
    /// This request bound the key.
    Activated {
        /// When the new binding expires.
        expires_at: DateTime<Utc>,
        /// The key's duration.
        duration_hours: DurationHours,
    },
    /// The key is already bound to this HWID and still valid.
    Welcome,
    /// The key is bound to a different HWID.
    HwidMismatch,
}

/// Stable verdict labels, for metrics and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    /// See [`Verdict::MalformedRequest`].
    MalformedRequest,
    /// See [`Verdict::Invalid`].
    Invalid,
    /// See [`Verdict::Expired`].
    Expired,
    /// See [`Verdict::Activated`].
    Activated,
    /// See [`Verdict::Welcome`].
    Welcome,
    /// See [`Verdict::HwidMismatch`].
    HwidMismatch,
}

impl VerdictKind {
    /// Return the string representation of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedRequest => "malformed_request",
            Self::Invalid => "invalid",
            Self::Expired => "expired",
            Self::Activated => "activated",
            Self::Welcome => "welcome",
            Self::HwidMismatch => "hwid_mismatch",
        }
    }
}

impl std::fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Verdict {
    /// The label for this verdict.
    pub fn kind(&self) -> VerdictKind {
        match self {
            Self::MalformedRequest => VerdictKind::MalformedRequest,
            Self::Invalid => VerdictKind::Invalid,
            Self::Expired => VerdictKind::Expired,
            Self::Activated { .. } => VerdictKind::Activated,
            Self::Welcome => VerdictKind::Welcome,
            Self::HwidMismatch => VerdictKind::HwidMismatch,
        }
    }

    /// Client-facing status word. Activation and welcome share `success`.
    pub fn status(&self) -> &'static str {
        match self {
            Self::MalformedRequest => "error",
            Self::Invalid => "invalid",
            Self::Expired => "expired",
            Self::Activated { .. } | Self::Welcome => "success",
            Self::HwidMismatch => "hwid_mismatch",
        }
    }

    /// Human-readable message shown to the client.
    pub fn message(&self) -> String {
        match self {
            Self::MalformedRequest => "missing key or hwid".to_string(),
            Self::Invalid => "key not found".to_string(),
            Self::Expired => "key has expired".to_string(),
            Self::Activated { duration_hours, .. } => {
                format!("Activated! ({duration_hours} Hours)")
            }
            Self::Welcome => "Welcome Back".to_string(),
            Self::HwidMismatch => "Hardware ID mismatch".to_string(),
        }
    }

    /// The new expiry, only for [`Verdict::Activated`].
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Activated { expires_at, .. } => Some(*expires_at),
            _ => None,
        }
    }
}

/// Verdict for a record that is already bound. `None` if it is unbound.
fn judge_bound(record: &KeyRecord, hwid: &Hwid, now: DateTime<Utc>) -> Option<Verdict> {
    let bound = record.bound_hwid()?;
    if record.is_expired_at(now) {
        return Some(Verdict::Expired);
    }
    if bound == hwid {
        Some(Verdict::Welcome)
    } else {
        Some(Verdict::HwidMismatch)
    }
}

/// Verification front door over a [`KeyStore`].
#[derive(Clone)]
pub struct ActivationEngine {
    store: Arc<dyn KeyStore>,
}

impl ActivationEngine {
    /// Create an engine over `store`.
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Verify `raw_key` for `raw_hwid` at instant `now`.
    ///
    /// Inputs are raw client strings. Blank values short-circuit to
    /// [`Verdict::MalformedRequest`] without touching the store.
    ///
    /// # Errors
    ///
    /// [`EngineError::Storage`] if the store fails at any step.
    pub async fn verify(
        &self,
        raw_key: &str,
        raw_hwid: &str,
        now: DateTime<Utc>,
    ) -> Result<Verdict, EngineError> {
        let (Ok(id), Ok(hwid)) = (KeyId::new(raw_key), Hwid::new(raw_hwid)) else {
            tracing::debug!("verification rejected: missing key or hwid");
            return Ok(Verdict::MalformedRequest);
        };

        let verdict = self.decide(&id, hwid, now).await?;
        tracing::debug!(key = %id, verdict = %verdict.kind(), "verification decided");
        Ok(verdict)
    }

    async fn decide(
        &self,
        id: &KeyId,
        hwid: Hwid,
        now: DateTime<Utc>,
    ) -> Result<Verdict, EngineError> {
        let Some(mut record) = self.store.fetch(id).await? else {
            return Ok(Verdict::Invalid);
        };

        for _ in 0..MAX_BIND_ROUNDS {
            if let Some(verdict) = judge_bound(&record, &hwid, now) {
                return Ok(verdict);
            }

            let binding = record.activation_binding(hwid.clone(), now)?;
            match self.store.bind_if_unbound(id, binding).await? {
                BindAttempt::Bound(bound) => {
                    let expires_at = bound.expires_at().ok_or_else(|| {
                        StoreError::Backend(format!("bind of {id} returned an unbound record"))
                    })?;
                    tracing::info!(
                        key = %id,
                        expires_at = %format_instant(expires_at),
                        "key activated"
                    );
                    tracing::debug!(key = %id, hwid = %hwid, "activation bound to hwid");
                    return Ok(Verdict::Activated {
                        expires_at,
                        duration_hours: bound.duration_hours,
                    });
                }
                BindAttempt::Lost(current) => {
                    tracing::debug!(key = %id, "lost activation race, re-evaluating");
                    record = current;
                }
                BindAttempt::Missing => return Ok(Verdict::Invalid),
            }
        }

        tracing::warn!(key = %id, rounds = MAX_BIND_ROUNDS, "activation kept losing to resets");
        Err(StoreError::Backend(format!("activation of {id} did not settle")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKeyStore;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
    }

    async fn engine_with(hours: u32) -> (ActivationEngine, MemoryKeyStore) {
        let store = MemoryKeyStore::new();
        store
            .insert(KeyRecord::new(
                KeyId::new("SWIFT-test").unwrap(),
                DurationHours::new(hours).unwrap(),
                "Free Key",
                t0(),
            ))
            .await
            .unwrap();
        (ActivationEngine::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn blank_inputs_are_malformed() {
        let (engine, _) = engine_with(6).await;
        assert_eq!(engine.verify("", "hw", t0()).await.unwrap(), Verdict::MalformedRequest);
        assert_eq!(engine.verify("SWIFT-test", "  ", t0()).await.unwrap(), Verdict::MalformedRequest);
    }

    #[tokio::test]
    async fn unknown_key_is_invalid() {
        let (engine, _) = engine_with(6).await;
        assert_eq!(engine.verify("SWIFT-nope", "hw", t0()).await.unwrap(), Verdict::Invalid);
    }

    #[tokio::test]
    async fn first_use_activates_with_computed_expiry() {
        let (engine, store) = engine_with(12).await;
        let now = t0() + Duration::minutes(30);
        let verdict = engine.verify("SWIFT-test", "pc-1", now).await.unwrap();
        assert_eq!(
            verdict,
            Verdict::Activated {
                expires_at: now + Duration::hours(12),
                duration_hours: DurationHours::new(12).unwrap(),
            }
        );
        assert_eq!(verdict.message(), "Activated! (12 Hours)");
        assert_eq!(verdict.status(), "success");

        let stored = store.fetch(&KeyId::new("SWIFT-test").unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.bound_hwid().unwrap().as_str(), "pc-1");
        assert_eq!(stored.expires_at(), Some(now + Duration::hours(12)));
    }

    #[tokio::test]
    async fn same_hwid_is_welcomed_without_mutation() {
        let (engine, store) = engine_with(6).await;
        engine.verify("SWIFT-test", "pc-1", t0()).await.unwrap();
        let before = store.fetch(&KeyId::new("SWIFT-test").unwrap()).await.unwrap();

        let later = t0() + Duration::hours(5);
        assert_eq!(engine.verify("SWIFT-test", "pc-1", later).await.unwrap(), Verdict::Welcome);
        let after = store.fetch(&KeyId::new("SWIFT-test").unwrap()).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn other_hwid_is_rejected() {
        let (engine, _) = engine_with(6).await;
        engine.verify("SWIFT-test", "pc-1", t0()).await.unwrap();
        let verdict = engine.verify("SWIFT-test", "pc-2", t0()).await.unwrap();
        assert_eq!(verdict, Verdict::HwidMismatch);
        assert_eq!(verdict.message(), "Hardware ID mismatch");
        assert!(verdict.expires_at().is_none());
    }

    #[tokio::test]
    async fn expiry_wins_over_hwid() {
        let (engine, _) = engine_with(6).await;
        engine.verify("SWIFT-test", "pc-1", t0()).await.unwrap();
        let exp = t0() + Duration::hours(6);

        assert_eq!(engine.verify("SWIFT-test", "pc-1", exp).await.unwrap(), Verdict::Welcome);
        let past = exp + Duration::seconds(1);
        assert_eq!(engine.verify("SWIFT-test", "pc-1", past).await.unwrap(), Verdict::Expired);
        assert_eq!(engine.verify("SWIFT-test", "pc-2", past).await.unwrap(), Verdict::Expired);
    }

    #[test]
    fn verdict_labels() {
        assert_eq!(Verdict::MalformedRequest.status(), "error");
        assert_eq!(Verdict::Welcome.status(), "success");
        assert_eq!(Verdict::Welcome.message(), "Welcome Back");
        assert_eq!(Verdict::Invalid.message(), "key not found");
        assert_eq!(Verdict::Expired.message(), "key has expired");
        assert_eq!(Verdict::HwidMismatch.kind().as_str(), "hwid_mismatch");
    }
}
