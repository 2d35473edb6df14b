//! HTTP middleware for the Keygate API.

pub mod metrics;
