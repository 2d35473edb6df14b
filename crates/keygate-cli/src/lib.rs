//! # keygate-cli — Operator CLI for Keygate
//!
//! Provides the `keygate` command-line interface. Every command is a thin
//! call to the authenticated management API of `keygate-api`; the CLI never
//! touches the key store directly.
//!
//! ```bash
//! keygate genkey --prefix SWIFT --duration random --amount 10 --note "event"
//! keygate checkkey SWIFT-a8Kd0qPz3LmN7xYc
//! keygate resetkey SWIFT-a8Kd0qPz3LmN7xYc
//! keygate listkeys --filter unused --output unused.txt
//! ```

pub mod client;
pub mod error;
pub mod keys;
pub mod render;

pub use client::{IssueKeys, IssuedKeys, KeySummary, KeygateClient};
pub use error::ClientError;

/// API base URL used when neither `--api-url` nor `KEYGATE_API_URL` is set.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";
