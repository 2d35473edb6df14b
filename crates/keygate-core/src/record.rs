//! # Key Record
//!
//! The single persisted entity. A record is created unbound, becomes bound
//! on first successful verification, and returns to unbound only through an
//! explicit reset.
//!
//! ```text
//! UNUSED ─first verify──▶ ACTIVE ─now > expires_at──▶ EXPIRED
//!    ▲                      │                            │
//!    └────────reset─────────┴────────────reset───────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::DurationHours;
use crate::error::ValidationError;
use crate::identity::{Hwid, KeyId};
use crate::temporal::{expiry_after, is_expired};

/// Note attached to keys when the operator supplies none.
pub const DEFAULT_NOTE: &str = "Free Key";

/// The hardware binding established on first use.
///
/// HWID and expiry are one value so that neither can exist without the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// The hardware identifier that activated the key.
    pub hwid: Hwid,
    /// Activation instant plus the key's duration.
    pub expires_at: DateTime<Utc>,
}

/// A license key and its lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Unique identifier. Immutable.
    pub id: KeyId,
    /// `None` until first activation, and again after a reset.
    pub binding: Option<Binding>,
    /// Validity window once activated. Fixed at creation.
    pub duration_hours: DurationHours,
    /// Operator free text.
    pub note: String,
    /// Creation instant. Immutable.
    pub created_at: DateTime<Utc>,
}

impl KeyRecord {
    /// Create a fresh, unbound record.
    pub fn new(
        id: KeyId,
        duration_hours: DurationHours,
        note: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            binding: None,
            duration_hours,
            note: note.into(),
            created_at,
        }
    }

    /// Whether a hardware ID has been bound.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// The bound hardware ID, if any.
    pub fn bound_hwid(&self) -> Option<&Hwid> {
        self.binding.as_ref().map(|b| &b.hwid)
    }

    /// The expiry instant, if activated.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.binding.as_ref().map(|b| b.expires_at)
    }

    /// Whether the key is past its expiry at `now`. Unbound keys never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| is_expired(exp, now))
    }

    /// Derived lifecycle status at `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> KeyStatus {
        match self.expires_at() {
            None => KeyStatus::Unused,
            Some(exp) if is_expired(exp, now) => KeyStatus::Expired,
            Some(_) => KeyStatus::Active,
        }
    }

    /// The binding this record would receive if `hwid` activated it at `now`.
    ///
    /// Pure: the record is not modified. Committing the binding is the
    /// store's job, conditional on the record still being unbound.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ExpiryOutOfRange`] if the expiry overflows.
    pub fn activation_binding(
        &self,
        hwid: Hwid,
        now: DateTime<Utc>,
    ) -> Result<Binding, ValidationError> {
        Ok(Binding {
            hwid,
            expires_at: expiry_after(now, self.duration_hours)?,
        })
    }
}

/// Derived status of a key, used for inspection and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    /// Never activated, or reset since.
    Unused,
    /// Bound and within its validity window.
    Active,
    /// Bound and past its expiry.
    Expired,
}

impl KeyStatus {
    /// Return the string representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing filter. Considers binding only, never expiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyFilter {
    /// Every record.
    #[default]
    All,
    /// Records with a bound HWID.
    Used,
    /// Records without a bound HWID.
    Unused,
}

impl KeyFilter {
    /// Whether `record` passes this filter.
    pub fn matches(&self, record: &KeyRecord) -> bool {
        match self {
            Self::All => true,
            Self::Used => record.is_bound(),
            Self::Unused => !record.is_bound(),
        }
    }

    /// Return the string representation of this filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Used => "used",
            Self::Unused => "unused",
        }
    }
}

impl std::fmt::Display for KeyFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KeyFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "used" => Ok(Self::Used),
            "unused" => Ok(Self::Unused),
            _ => Err(ValidationError::InvalidFilter(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    fn fresh(hours: u32) -> KeyRecord {
        KeyRecord::new(
            KeyId::new("SWIFT-abc").unwrap(),
            DurationHours::new(hours).unwrap(),
            DEFAULT_NOTE,
            t0(),
        )
    }

    #[test]
    fn new_record_is_unbound() {
        let r = fresh(6);
        assert!(!r.is_bound());
        assert!(r.bound_hwid().is_none());
        assert!(r.expires_at().is_none());
        assert_eq!(r.status_at(t0()), KeyStatus::Unused);
        assert!(!r.is_expired_at(t0() + Duration::days(365)));
    }

    #[test]
    fn activation_binding_computes_expiry() {
        let r = fresh(12);
        let now = t0() + Duration::minutes(5);
        let b = r.activation_binding(Hwid::new("pc-1").unwrap(), now).unwrap();
        assert_eq!(b.expires_at, now + Duration::hours(12));
        assert_eq!(b.hwid.as_str(), "pc-1");
        assert!(!r.is_bound(), "activation_binding must not mutate");
    }

    #[test]
    fn status_follows_expiry() {
        let mut r = fresh(6);
        r.binding = Some(r.activation_binding(Hwid::new("pc").unwrap(), t0()).unwrap());
        assert_eq!(r.status_at(t0() + Duration::hours(6)), KeyStatus::Active);
        assert_eq!(
            r.status_at(t0() + Duration::hours(6) + Duration::seconds(1)),
            KeyStatus::Expired
        );
    }

    #[test]
    fn filter_ignores_expiry() {
        let mut r = fresh(6);
        assert!(KeyFilter::Unused.matches(&r));
        assert!(!KeyFilter::Used.matches(&r));
        r.binding = Some(Binding {
            hwid: Hwid::new("pc").unwrap(),
            expires_at: t0() - Duration::days(30),
        });
        assert!(KeyFilter::Used.matches(&r));
        assert!(KeyFilter::All.matches(&r));
    }

    #[test]
    fn filter_parses_case_insensitively() {
        assert_eq!("USED".parse::<KeyFilter>().unwrap(), KeyFilter::Used);
        assert_eq!("unused".parse::<KeyFilter>().unwrap(), KeyFilter::Unused);
        assert!("expired".parse::<KeyFilter>().is_err());
    }

    #[test]
    fn record_serde_roundtrip_keeps_binding() {
        let mut r = fresh(24);
        r.binding = Some(r.activation_binding(Hwid::new("hw").unwrap(), t0()).unwrap());
        let json = serde_json::to_string(&r).unwrap();
        let back: KeyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
