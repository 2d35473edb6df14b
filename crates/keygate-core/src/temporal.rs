//! # Temporal Helpers
//!
//! Expiry arithmetic for activated keys. All instants are UTC.
//!
//! A key activated at `t` with duration `h` expires at `t + h hours`, and
//! is expired at `now` only when `now > expires_at`: the expiry instant
//! itself is still valid.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::duration::DurationHours;
use crate::error::ValidationError;

/// Compute the expiry instant for a key activated at `activated_at`.
///
/// # Errors
///
/// Returns [`ValidationError::ExpiryOutOfRange`] if the sum leaves chrono's
/// representable range.
pub fn expiry_after(
    activated_at: DateTime<Utc>,
    duration: DurationHours,
) -> Result<DateTime<Utc>, ValidationError> {
    activated_at
        .checked_add_signed(Duration::hours(i64::from(duration.get())))
        .ok_or_else(|| ValidationError::ExpiryOutOfRange {
            from: format_instant(activated_at),
            hours: duration.get(),
        })
}

/// Whether a key expiring at `expires_at` is expired at `now`.
pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > expires_at
}

/// Render an instant as ISO 8601 with millisecond precision and `Z` suffix,
/// e.g. `2026-01-15T12:00:00.000Z`.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
