//! # Identity Newtypes
//!
//! String identifiers that flow through Keygate. Each is a distinct type:
//! you cannot pass a [`Hwid`] where a [`KeyId`] is expected.
//!
//! All three validate at construction and on deserialization
//! (`serde(try_from = "String")`), so an invalid value never reaches the
//! engines.
//!
//! Key identifiers have the shape `PREFIX-<suffix>` where the suffix is
//! [`KEY_SUFFIX_LEN`] characters drawn uniformly from the 62-symbol
//! case-sensitive alphanumeric alphabet. The suffix is unpredictable but not
//! cryptographically hardened.

use rand::distributions::{Alphanumeric, DistString};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Length of the random suffix appended to every generated key.
pub const KEY_SUFFIX_LEN: usize = 16;

/// Maximum accepted prefix length, in characters.
const MAX_PREFIX_LEN: usize = 32;

/// A license key identifier, e.g. `SWIFT-a8Kd0qPz3LmN7xYc`.
///
/// Surrounding whitespace is trimmed; the remainder must be non-empty.
/// Identifiers presented by clients are otherwise taken verbatim, so keys
/// issued under an older naming scheme still resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyId(String);

impl KeyId {
    /// Create a key identifier, rejecting empty input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyKeyId`] if the trimmed value is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyKeyId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Generate a fresh identifier under `prefix` with a random suffix.
    pub fn generate<R: Rng + ?Sized>(prefix: &KeyPrefix, rng: &mut R) -> Self {
        let suffix = Alphanumeric.sample_string(rng, KEY_SUFFIX_LEN);
        Self(format!("{}-{suffix}", prefix.as_str()))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for KeyId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KeyId> for String {
    fn from(id: KeyId) -> Self {
        id.0
    }
}

/// A hardware identifier reported by the client runtime.
///
/// Opaque to Keygate: compared byte-for-byte after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hwid(String);

impl Hwid {
    /// Create a hardware identifier, rejecting empty input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyHwid`] if the trimmed value is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyHwid);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the hardware identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Hwid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Hwid {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Hwid> for String {
    fn from(hwid: Hwid) -> Self {
        hwid.0
    }
}

/// Operator-chosen key prefix, normalized to uppercase.
///
/// # Validation
///
/// - Non-empty after trimming
/// - At most 32 characters
/// - No interior whitespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyPrefix(String);

impl KeyPrefix {
    /// Create a prefix, trimming and uppercasing the input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPrefix`] if the prefix is empty,
    /// too long, or contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let trimmed = s.trim();
        let reject = |reason| ValidationError::InvalidPrefix {
            value: s.clone(),
            reason,
        };
        if trimmed.is_empty() {
            return Err(reject("must not be empty"));
        }
        if trimmed.chars().count() > MAX_PREFIX_LEN {
            return Err(reject("must not exceed 32 characters"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(reject("must not contain whitespace"));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// Access the normalized prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for KeyPrefix {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KeyPrefix> for String {
    fn from(prefix: KeyPrefix) -> Self {
        prefix.0
    }
}
