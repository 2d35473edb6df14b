//! # keygate-state: Key Lifecycle
//!
//! The engines that move a license key through its lifecycle, and the
//! storage contract they run against.
//!
//! - [`KeyStore`]: the storage seam, with [`MemoryKeyStore`] for
//!   development and tests. The Postgres adapter lives in `keygate-api`.
//! - [`ActivationEngine`]: verification and bind-on-first-use.
//! - [`IssuanceEngine`]: identifier generation and record creation.
//! - [`KeyAdmin`]: reset, inspect and list.
//!
//! Engines take the current instant and randomness as arguments. They never
//! read the clock or seed an RNG themselves.

#![deny(missing_docs)]

pub mod activation;
pub mod admin;
pub mod error;
pub mod issuance;
pub mod memory;
pub mod store;

pub use activation::{ActivationEngine, Verdict, VerdictKind};
pub use admin::KeyAdmin;
pub use error::{EngineError, StoreError};
pub use issuance::{
    clamp_count, normalize_note, IssueRequest, IssuanceEngine, IssuedKeys, GENERATION_ATTEMPTS,
    MAX_ISSUE_COUNT,
};
pub use memory::MemoryKeyStore;
pub use store::{sort_newest_first, BindAttempt, KeyStore};
