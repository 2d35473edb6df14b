//! # Issuance Engine
//!
//! Generates key identifiers and commits fresh, unbound records.
//!
//! Each key resolves its own duration from the policy, draws an identifier
//! `PREFIX-<16 alphanumerics>`, and is committed with insert-if-absent. A
//! collision redraws the suffix, up to [`GENERATION_ATTEMPTS`] tries per key.
//! Keys committed before a failure stay committed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use keygate_core::{DurationHours, DurationPolicy, KeyId, KeyPrefix, KeyRecord, DEFAULT_NOTE};
use rand::Rng;

use crate::error::{EngineError, StoreError};
use crate::store::KeyStore;

/// Most keys one request may create.
pub const MAX_ISSUE_COUNT: u32 = 50;

/// Identifier draws per key before giving up.
pub const GENERATION_ATTEMPTS: u32 = 5;

/// Clamp a requested count into `1..=MAX_ISSUE_COUNT`. Absent means one.
pub fn clamp_count(requested: Option<i64>) -> u32 {
    match requested {
        None => 1,
        Some(n) => n.clamp(1, i64::from(MAX_ISSUE_COUNT)) as u32,
    }
}

/// Normalize an operator note, falling back to [`DEFAULT_NOTE`] when blank.
pub fn normalize_note(note: Option<&str>) -> String {
    match note.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => DEFAULT_NOTE.to_string(),
    }
}

/// An operator's request for new keys.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    /// Normalized prefix.
    pub prefix: KeyPrefix,
    /// Duration rule, resolved per key.
    pub policy: DurationPolicy,
    /// Requested count, clamped by [`clamp_count`].
    pub count: Option<i64>,
    /// Operator note.
    pub note: Option<String>,
}

/// Keys created by one request, in generation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedKeys {
    /// Committed identifiers.
    pub keys: Vec<KeyId>,
    /// The policy they were issued under.
    pub policy: DurationPolicy,
    /// The note stored on every key.
    pub note: String,
}

/// Key creation over a [`KeyStore`].
#[derive(Clone)]
pub struct IssuanceEngine {
    store: Arc<dyn KeyStore>,
}

impl IssuanceEngine {
    /// Create an engine over `store`.
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Issue keys per `request`, drawing randomness from `rng` and stamping
    /// `now` as the creation time.
    ///
    /// # Errors
    ///
    /// - [`EngineError::GenerationConflict`] if one key collides
    ///   [`GENERATION_ATTEMPTS`] times in a row. The error carries the keys
    ///   committed before that point.
    /// - [`EngineError::Storage`] if the store fails.
    pub async fn issue<R: Rng + Send + ?Sized>(
        &self,
        request: IssueRequest,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<IssuedKeys, EngineError> {
        let count = clamp_count(request.count);
        let note = normalize_note(request.note.as_deref());
        let mut keys = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let duration = request.policy.resolve(rng);
            match self.commit_one(&request.prefix, duration, &note, rng, now).await {
                Ok(id) => keys.push(id),
                Err(EngineError::GenerationConflict {
                    prefix, attempts, ..
                }) => {
                    return Err(EngineError::GenerationConflict {
                        prefix,
                        attempts,
                        issued: keys,
                    })
                }
                Err(err) => return Err(err),
            }
        }

        tracing::info!(
            prefix = %request.prefix,
            count = keys.len(),
            policy = %request.policy,
            "issued keys"
        );
        Ok(IssuedKeys {
            keys,
            policy: request.policy,
            note,
        })
    }

    async fn commit_one<R: Rng + Send + ?Sized>(
        &self,
        prefix: &KeyPrefix,
        duration: DurationHours,
        note: &str,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<KeyId, EngineError> {
        for attempt in 1..=GENERATION_ATTEMPTS {
            let id = KeyId::generate(prefix, rng);
            let record = KeyRecord::new(id.clone(), duration, note, now);
            match self.store.insert(record).await {
                Ok(()) => return Ok(id),
                Err(StoreError::Conflict(taken)) => {
                    tracing::debug!(key = %taken, attempt, "identifier collision, redrawing");
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::warn!(prefix = %prefix, attempts = GENERATION_ATTEMPTS, "identifier space exhausted");
        Err(EngineError::GenerationConflict {
            prefix: prefix.to_string(),
            attempts: GENERATION_ATTEMPTS,
            issued: Vec::new(),
        })
    }
}
