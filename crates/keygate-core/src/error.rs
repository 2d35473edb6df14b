//! # Validation Errors
//!
//! Errors for Keygate's domain primitives, built with `thiserror`.
//! Variants carry the rejected input, where there is one, so operators see what was
//! wrong without re-running the command.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Key identifier is empty or whitespace.
    #[error("key identifier must be non-empty")]
    EmptyKeyId,

    /// Hardware identifier is empty or whitespace.
    #[error("hardware ID must be non-empty")]
    EmptyHwid,

    /// Key prefix is empty, too long, or contains whitespace.
    #[error("invalid key prefix: \"{value}\" ({reason})")]
    InvalidPrefix {
        /// The rejected prefix.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Duration is zero, non-numeric, or above the allowed maximum.
    #[error("invalid duration: \"{0}\" (expected 1-8760 hours or \"random\")")]
    InvalidDuration(String),

    /// Listing filter is not one of all/used/unused.
    #[error("invalid filter: \"{0}\" (expected all, used or unused)")]
    InvalidFilter(String),

    /// Expiry computation left the representable time range.
    #[error("expiry out of range: {hours} hours after {from}")]
    ExpiryOutOfRange {
        /// The activation instant, RFC 3339.
        from: String,
        /// The duration that overflowed.
        hours: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_prefix_carries_value_and_reason() {
        let err = ValidationError::InvalidPrefix {
            value: "A B".to_string(),
            reason: "must not contain whitespace",
        };
        let msg = format!("{err}");
        assert!(msg.contains("A B"));
        assert!(msg.contains("whitespace"));
    }

    #[test]
    fn invalid_duration_mentions_random() {
        let err = ValidationError::InvalidDuration("0".to_string());
        assert!(format!("{err}").contains("random"));
    }

    #[test]
    fn invalid_filter_lists_choices() {
        let err = ValidationError::InvalidFilter("maybe".to_string());
        let msg = format!("{err}");
        assert!(msg.contains("maybe"));
        assert!(msg.contains("unused"));
    }
}
