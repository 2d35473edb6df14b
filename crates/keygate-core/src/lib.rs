#![deny(missing_docs)]

//! # keygate-core — Foundational Types for Keygate
//!
//! This crate defines the vocabulary every other crate in the workspace
//! speaks. It performs no I/O and has no internal crate dependencies.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** A [`KeyId`] is not a
//!    [`Hwid`] is not a [`KeyPrefix`]. Each validates at construction.
//!
//! 2. **Binding and expiry travel together.** [`KeyRecord`] stores an
//!    `Option<Binding>`, so a record can never carry a bound HWID without an
//!    expiry instant or vice versa.
//!
//! 3. **Expiry arithmetic lives in one place.** [`temporal`] owns the
//!    "activation instant + duration" computation and the strict
//!    `now > expires_at` comparison.
//!
//! 4. **[`ValidationError`] at every boundary.** Structured errors with `thiserror`,
//!    no `.unwrap()` outside tests.

pub mod duration;
pub mod error;
pub mod identity;
pub mod record;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use duration::{DurationHours, DurationPolicy, MAX_DURATION_HOURS, RANDOM_DURATION_CHOICES};
pub use error::ValidationError;
pub use identity::{Hwid, KeyId, KeyPrefix, KEY_SUFFIX_LEN};
pub use record::{Binding, KeyFilter, KeyRecord, KeyStatus, DEFAULT_NOTE};
pub use temporal::{expiry_after, format_instant, is_expired};
