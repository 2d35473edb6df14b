//! Route modules for the Keygate API.

pub mod keys;
pub mod verify;
