//! # Key Store Contract
//!
//! The durable mapping from [`KeyId`] to [`KeyRecord`]. Every adapter owns
//! the atomicity of the two state transitions that matter:
//!
//! - **Insert-if-absent** at issuance, so two keys never share an identifier.
//! - **Bind-if-unbound** at first verification, so exactly one HWID wins the
//!   race for a fresh key.
//!
//! Everything else is a plain read or an unconditional write to one record.
//! No operation spans more than one record.

use async_trait::async_trait;
use keygate_core::{Binding, KeyFilter, KeyId, KeyRecord};

use crate::error::StoreError;

/// Result of a conditional bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindAttempt {
    /// The record was unbound and now carries the requested binding.
    Bound(KeyRecord),
    /// Another caller bound the record first. Carries the current record.
    Lost(KeyRecord),
    /// No record with that identifier exists.
    Missing,
}

/// Storage backend for license key records.
///
/// Implementations must be safe to share across tasks behind an
/// `Arc<dyn KeyStore>`.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Fetch a record by identifier.
    async fn fetch(&self, id: &KeyId) -> Result<Option<KeyRecord>, StoreError>;

    /// Insert a new record.
    ///
    /// Returns [`StoreError::Conflict`] if the identifier is already taken.
    /// The existing record is left untouched.
    async fn insert(&self, record: KeyRecord) -> Result<(), StoreError>;

    /// Attach `binding` to the record only if it is still unbound.
    async fn bind_if_unbound(&self, id: &KeyId, binding: Binding)
        -> Result<BindAttempt, StoreError>;

    /// Remove any binding from the record. Returns the updated record, or
    /// `None` if it does not exist.
    async fn clear_binding(&self, id: &KeyId) -> Result<Option<KeyRecord>, StoreError>;

    /// Records passing `filter`, newest first.
    async fn list(&self, filter: KeyFilter) -> Result<Vec<KeyRecord>, StoreError>;

    /// Cheap reachability probe for readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Sort records newest first, breaking ties by identifier.
///
/// Adapters that cannot order at the source use this so every backend
/// returns listings in the same order.
pub fn sort_newest_first(records: &mut [KeyRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use keygate_core::DurationHours;

    fn record(id: &str, minutes: i64) -> KeyRecord {
        let base = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        KeyRecord::new(
            KeyId::new(id).unwrap(),
            DurationHours::new(6).unwrap(),
            "n",
            base + Duration::minutes(minutes),
        )
    }

    #[test]
    fn sorts_newest_first_then_by_id() {
        let mut rs = vec![record("B", 0), record("C", 5), record("A", 0)];
        sort_newest_first(&mut rs);
        let ids: Vec<&str> = rs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }
}
