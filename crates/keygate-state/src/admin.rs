//! Operator-side operations: reset, inspect and list.

use std::sync::Arc;

use keygate_core::{KeyFilter, KeyId, KeyRecord};

use crate::error::EngineError;
use crate::store::KeyStore;

/// Reset, inspection and listing over a [`KeyStore`].
#[derive(Clone)]
pub struct KeyAdmin {
    store: Arc<dyn KeyStore>,
}

impl KeyAdmin {
    /// Create an admin handle over `store`.
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Clear the key's binding so the next verification re-binds it.
    ///
    /// Duration, note and creation time are kept. Resetting an unbound key
    /// is a no-op that still succeeds.
    pub async fn reset(&self, id: &KeyId) -> Result<KeyRecord, EngineError> {
        let record = self
            .store
            .clear_binding(id)
            .await?
            .ok_or_else(|| EngineError::not_found(id))?;
        tracing::info!(key = %id, "key reset");
        Ok(record)
    }

    /// Snapshot of one key.
    pub async fn inspect(&self, id: &KeyId) -> Result<KeyRecord, EngineError> {
        self.store
            .fetch(id)
            .await?
            .ok_or_else(|| EngineError::not_found(id))
    }

    /// Keys matching `filter`, newest first.
    pub async fn list(&self, filter: KeyFilter) -> Result<Vec<KeyRecord>, EngineError> {
        Ok(self.store.list(filter).await?)
    }
}
