//! # Engine and Store Errors
//!
//! Faults, not outcomes. A key that is unknown, expired or bound elsewhere
//! is a [`Verdict`](crate::Verdict), never an error. Errors here mean the
//! request could not be answered at all.

use keygate_core::{KeyId, ValidationError};
use thiserror::Error;

/// Errors raised by a [`KeyStore`](crate::KeyStore) adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Insert collided with an existing identifier.
    #[error("key {0} already exists")]
    Conflict(KeyId),

    /// The backend could not complete the operation.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Errors raised by the activation, issuance and admin operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The store failed. Retryable; never implies a business outcome.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Every identifier drawn for one key collided with an existing key.
    ///
    /// Keys committed earlier in the same request stay in the store and are
    /// listed in `issued`.
    #[error(
        "could not generate a unique key under prefix {prefix} after {attempts} attempts \
         ({} key(s) issued before the failure)",
        .issued.len()
    )]
    GenerationConflict {
        /// The normalized prefix.
        prefix: String,
        /// Attempts made before giving up.
        attempts: u32,
        /// Keys committed by the request before it gave up.
        issued: Vec<KeyId>,
    },

    /// No record with the given identifier.
    #[error("key {0} not found")]
    NotFound(String),

    /// Operator input failed domain validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl EngineError {
    /// Shorthand for [`EngineError::NotFound`].
    pub(crate) fn not_found(id: &KeyId) -> Self {
        Self::NotFound(id.to_string())
    }
}
