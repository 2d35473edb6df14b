//! # In-Memory Key Store
//!
//! A [`KeyStore`] over `Arc<RwLock<HashMap>>`, for development and tests.
//! Contents are lost on restart.
//!
//! All operations are synchronous under the hood: the lock is
//! `parking_lot`, never held across an `.await`, and not poisonable. Each
//! conditional transition runs under a single write guard, so the
//! read-check-write sequence cannot interleave with another writer.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use keygate_core::{Binding, KeyFilter, KeyId, KeyRecord};
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::store::{sort_newest_first, BindAttempt, KeyStore};

/// Thread-safe, cloneable in-memory key store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    data: Arc<RwLock<HashMap<KeyId, KeyRecord>>>,
}

impl MemoryKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn fetch(&self, id: &KeyId) -> Result<Option<KeyRecord>, StoreError> {
        Ok(self.data.read().get(id).cloned())
    }

    async fn insert(&self, record: KeyRecord) -> Result<(), StoreError> {
        match self.data.write().entry(record.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(record.id)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn bind_if_unbound(
        &self,
        id: &KeyId,
        binding: Binding,
    ) -> Result<BindAttempt, StoreError> {
        let mut guard = self.data.write();
        let Some(record) = guard.get_mut(id) else {
            return Ok(BindAttempt::Missing);
        };
        if record.is_bound() {
            return Ok(BindAttempt::Lost(record.clone()));
        }
        record.binding = Some(binding);
        Ok(BindAttempt::Bound(record.clone()))
    }

    async fn clear_binding(&self, id: &KeyId) -> Result<Option<KeyRecord>, StoreError> {
        Ok(self.data.write().get_mut(id).map(|record| {
            record.binding = None;
            record.clone()
        }))
    }

    async fn list(&self, filter: KeyFilter) -> Result<Vec<KeyRecord>, StoreError> {
        let mut records: Vec<KeyRecord> = self
            .data
            .read()
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use keygate_core::{DurationHours, Hwid};

    fn record(id: &str) -> KeyRecord {
        KeyRecord::new(
            KeyId::new(id).unwrap(),
            DurationHours::new(24).unwrap(),
            "Free Key",
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
        )
    }

    fn binding(hwid: &str) -> Binding {
        Binding {
            hwid: Hwid::new(hwid).unwrap(),
            expires_at: Utc.with_ymd_and_hms(2026, 2, 2, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicates_and_keeps_original() {
        let store = MemoryKeyStore::new();
        store.insert(record("K-1")).await.unwrap();
        let mut dup = record("K-1");
        dup.note = "other".into();
        let err = store.insert(dup).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref id) if id.as_str() == "K-1"));
        let kept = store.fetch(&KeyId::new("K-1").unwrap()).await.unwrap().unwrap();
        assert_eq!(kept.note, "Free Key");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn bind_is_first_writer_wins() {
        let store = MemoryKeyStore::new();
        let id = KeyId::new("K-2").unwrap();
        store.insert(record("K-2")).await.unwrap();

        let first = store.bind_if_unbound(&id, binding("alpha")).await.unwrap();
        assert!(matches!(first, BindAttempt::Bound(ref r) if r.bound_hwid().unwrap().as_str() == "alpha"));

        let second = store.bind_if_unbound(&id, binding("beta")).await.unwrap();
        match second {
            BindAttempt::Lost(current) => {
                assert_eq!(current.bound_hwid().unwrap().as_str(), "alpha");
            }
            other => panic!("expected Lost, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bind_on_missing_key() {
        let store = MemoryKeyStore::new();
        let res = store
            .bind_if_unbound(&KeyId::new("nope").unwrap(), binding("x"))
            .await
            .unwrap();
        assert_eq!(res, BindAttempt::Missing);
    }

    #[tokio::test]
    async fn clear_binding_keeps_other_fields() {
        let store = MemoryKeyStore::new();
        let id = KeyId::new("K-3").unwrap();
        store.insert(record("K-3")).await.unwrap();
        store.bind_if_unbound(&id, binding("alpha")).await.unwrap();

        let cleared = store.clear_binding(&id).await.unwrap().unwrap();
        assert!(!cleared.is_bound());
        assert_eq!(cleared.duration_hours.get(), 24);
        assert_eq!(cleared.note, "Free Key");
        assert!(store.clear_binding(&KeyId::new("nope").unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_and_orders() {
        let store = MemoryKeyStore::new();
        let mut older = record("K-old");
        older.created_at -= Duration::hours(1);
        store.insert(older).await.unwrap();
        store.insert(record("K-new")).await.unwrap();
        store
            .bind_if_unbound(&KeyId::new("K-old").unwrap(), binding("hw"))
            .await
            .unwrap();

        let all = store.list(KeyFilter::All).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["K-new", "K-old"]);

        let used = store.list(KeyFilter::Used).await.unwrap();
        assert_eq!(used.len(), 1);
        assert_eq!(used[0].id.as_str(), "K-old");

        let unused = store.list(KeyFilter::Unused).await.unwrap();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].id.as_str(), "K-new");
    }

    #[tokio::test]
    async fn clones_share_state() {
        let a = MemoryKeyStore::new();
        let b = a.clone();
        a.insert(record("K-4")).await.unwrap();
        assert!(b.fetch(&KeyId::new("K-4").unwrap()).await.unwrap().is_some());
        assert!(b.ping().await.is_ok());
    }
}
