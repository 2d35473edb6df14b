//! # Duration Policies
//!
//! How long a key stays valid once activated. A policy is chosen by the
//! operator at issuance; [`DurationPolicy::resolve`] turns it into a concrete
//! [`DurationHours`] per key, and the result is frozen into the record.
//!
//! The textual form accepted from operators is either a decimal hour count
//! (`"24"`) or `"random"`, which draws uniformly from
//! [`RANDOM_DURATION_CHOICES`] for every key independently.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Candidate durations for [`DurationPolicy::Random`], in hours.
pub const RANDOM_DURATION_CHOICES: [u32; 3] = [6, 12, 24];

/// Upper bound on a fixed duration: one year.
pub const MAX_DURATION_HOURS: u32 = 8760;

/// A positive validity window, in whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DurationHours(u32);

impl DurationHours {
    /// Create a duration, rejecting zero and values above [`MAX_DURATION_HOURS`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDuration`] when out of range.
    pub fn new(hours: u32) -> Result<Self, ValidationError> {
        if hours == 0 || hours > MAX_DURATION_HOURS {
            return Err(ValidationError::InvalidDuration(hours.to_string()));
        }
        Ok(Self(hours))
    }

    /// The number of hours.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for DurationHours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for DurationHours {
    type Error = ValidationError;

    fn try_from(hours: u32) -> Result<Self, Self::Error> {
        Self::new(hours)
    }
}

impl From<DurationHours> for u32 {
    fn from(d: DurationHours) -> Self {
        d.0
    }
}

/// The duration rule requested at issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPolicy", into = "String")]
pub enum DurationPolicy {
    /// Every key gets the same duration.
    Fixed(DurationHours),
    /// Each key draws independently from [`RANDOM_DURATION_CHOICES`].
    Random,
}

impl DurationPolicy {
    /// Resolve the policy to a concrete duration for one key.
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> DurationHours {
        match self {
            Self::Fixed(hours) => *hours,
            Self::Random => {
                let hours = RANDOM_DURATION_CHOICES
                    .choose(rng)
                    .copied()
                    .unwrap_or(RANDOM_DURATION_CHOICES[0]);
                DurationHours(hours)
            }
        }
    }

    /// Operator-facing description, e.g. `24 hours` or `random (6/12/24 hours)`.
    pub fn describe(&self) -> String {
        match self {
            Self::Fixed(hours) => format!("{hours} hours"),
            Self::Random => {
                let choices: Vec<String> =
                    RANDOM_DURATION_CHOICES.iter().map(u32::to_string).collect();
                format!("random ({} hours)", choices.join("/"))
            }
        }
    }
}

impl std::fmt::Display for DurationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(hours) => write!(f, "{hours}"),
            Self::Random => f.write_str("random"),
        }
    }
}

impl std::str::FromStr for DurationPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("random") {
            return Ok(Self::Random);
        }
        let hours: u32 = trimmed
            .parse()
            .map_err(|_| ValidationError::InvalidDuration(s.to_string()))?;
        DurationHours::new(hours)
            .map(Self::Fixed)
            .map_err(|_| ValidationError::InvalidDuration(s.to_string()))
    }
}

impl From<DurationPolicy> for String {
    fn from(policy: DurationPolicy) -> Self {
        policy.to_string()
    }
}

/// Wire forms accepted for a policy: `24` or `"24"` or `"random"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPolicy {
    Hours(u64),
    Text(String),
}

impl TryFrom<RawPolicy> for DurationPolicy {
    type Error = ValidationError;

    fn try_from(raw: RawPolicy) -> Result<Self, Self::Error> {
        match raw {
            RawPolicy::Hours(h) => u32::try_from(h)
                .map_err(|_| ValidationError::InvalidDuration(h.to_string()))
                .and_then(DurationHours::new)
                .map(Self::Fixed),
            RawPolicy::Text(s) => s.parse(),
        }
    }
}
