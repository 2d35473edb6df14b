//! License key persistence.
//!
//! [`PgKeyStore`] implements [`KeyStore`] over the `license_keys` table.
//! Conditional transitions are single statements, so Postgres row locking
//! provides the atomicity:
//!
//! - insert-if-absent is `INSERT .. ON CONFLICT DO NOTHING` plus a
//!   `rows_affected` check
//! - bind-if-unbound is `UPDATE .. WHERE bound_hwid IS NULL RETURNING ..`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keygate_core::{Binding, DurationHours, Hwid, KeyFilter, KeyId, KeyRecord};
use keygate_state::{BindAttempt, KeyStore, StoreError};
use sqlx::PgPool;

const COLUMNS: &str = "identifier, bound_hwid, duration_hours, expires_at, note, created_at";

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Postgres-backed key store.
#[derive(Debug, Clone)]
pub struct PgKeyStore {
    pool: PgPool,
}

impl PgKeyStore {
    /// Create a store over an initialized pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyStore for PgKeyStore {
    async fn fetch(&self, id: &KeyId) -> Result<Option<KeyRecord>, StoreError> {
        let row = sqlx::query_as::<_, KeyRow>(&format!(
            "SELECT {COLUMNS} FROM license_keys WHERE identifier = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(KeyRow::into_record).transpose()
    }

    async fn insert(&self, record: KeyRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO license_keys (identifier, bound_hwid, duration_hours, expires_at, note, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (identifier) DO NOTHING",
        )
        .bind(record.id.as_str())
        .bind(record.bound_hwid().map(Hwid::as_str))
        .bind(hours_column(record.duration_hours)?)
        .bind(record.expires_at())
        .bind(&record.note)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(record.id));
        }
        Ok(())
    }

    async fn bind_if_unbound(
        &self,
        id: &KeyId,
        binding: Binding,
    ) -> Result<BindAttempt, StoreError> {
        let row = sqlx::query_as::<_, KeyRow>(&format!(
            "UPDATE license_keys SET bound_hwid = $2, expires_at = $3
             WHERE identifier = $1 AND bound_hwid IS NULL
             RETURNING {COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(binding.hwid.as_str())
        .bind(binding.expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        if let Some(row) = row {
            return Ok(BindAttempt::Bound(row.into_record()?));
        }

        Ok(match self.fetch(id).await? {
            Some(current) => BindAttempt::Lost(current),
            None => BindAttempt::Missing,
        })
    }

    async fn clear_binding(&self, id: &KeyId) -> Result<Option<KeyRecord>, StoreError> {
        let row = sqlx::query_as::<_, KeyRow>(&format!(
            "UPDATE license_keys SET bound_hwid = NULL, expires_at = NULL
             WHERE identifier = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(KeyRow::into_record).transpose()
    }

    async fn list(&self, filter: KeyFilter) -> Result<Vec<KeyRecord>, StoreError> {
        let condition = match filter {
            KeyFilter::All => "",
            KeyFilter::Used => "WHERE bound_hwid IS NOT NULL",
            KeyFilter::Unused => "WHERE bound_hwid IS NULL",
        };
        // Byte-order tie break, matching the in-memory store.
        let rows = sqlx::query_as::<_, KeyRow>(&format!(
            "SELECT {COLUMNS} FROM license_keys {condition}
             ORDER BY created_at DESC, identifier COLLATE \"C\" ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(KeyRow::into_record).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(backend)
    }
}

fn hours_column(hours: DurationHours) -> Result<i32, StoreError> {
    i32::try_from(hours.get())
        .map_err(|_| StoreError::Backend(format!("duration {hours} does not fit the hours column")))
}

/// Internal row type for SQLx mapping.
#[derive(Debug, sqlx::FromRow)]
struct KeyRow {
    identifier: String,
    bound_hwid: Option<String>,
    duration_hours: i32,
    expires_at: Option<DateTime<Utc>>,
    note: String,
    created_at: DateTime<Utc>,
}

impl KeyRow {
    fn into_record(self) -> Result<KeyRecord, StoreError> {
        let corrupt = |what: String| {
            tracing::error!(key = %self.identifier, problem = %what, "corrupt license_keys row");
            StoreError::Backend(format!("corrupt row {}: {what}", self.identifier))
        };

        let id = KeyId::new(self.identifier.clone()).map_err(|e| corrupt(e.to_string()))?;
        let duration_hours = u32::try_from(self.duration_hours)
            .map_err(|e| corrupt(e.to_string()))
            .and_then(|h| DurationHours::new(h).map_err(|e| corrupt(e.to_string())))?;
        let binding = match (self.bound_hwid.clone(), self.expires_at) {
            (None, None) => None,
            (Some(hwid), Some(expires_at)) => Some(Binding {
                hwid: Hwid::new(hwid).map_err(|e| corrupt(e.to_string()))?,
                expires_at,
            }),
            _ => return Err(corrupt("hwid and expiry out of step".to_string())),
        };

        Ok(KeyRecord {
            id,
            binding,
            duration_hours,
            note: self.note,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row() -> KeyRow {
        KeyRow {
            identifier: "SWIFT-row".into(),
            bound_hwid: None,
            duration_hours: 12,
            expires_at: None,
            note: "Free Key".into(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn unbound_row_maps_to_fresh_record() {
        let record = row().into_record().unwrap();
        assert_eq!(record.id.as_str(), "SWIFT-row");
        assert!(!record.is_bound());
        assert_eq!(record.duration_hours.get(), 12);
    }

    #[test]
    fn bound_row_maps_binding() {
        let exp = Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap();
        let record = KeyRow {
            bound_hwid: Some("rig".into()),
            expires_at: Some(exp),
            ..row()
        }
        .into_record()
        .unwrap();
        assert_eq!(record.bound_hwid().unwrap().as_str(), "rig");
        assert_eq!(record.expires_at(), Some(exp));
    }

    #[test]
    fn half_bound_row_is_rejected() {
        let err = KeyRow {
            bound_hwid: Some("rig".into()),
            ..row()
        }
        .into_record()
        .unwrap_err();
        assert!(matches!(err, StoreError::Backend(ref m) if m.contains("SWIFT-row")));
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        assert!(KeyRow {
            duration_hours: 0,
            ..row()
        }
        .into_record()
        .is_err());
        assert!(KeyRow {
            duration_hours: -4,
            ..row()
        }
        .into_record()
        .is_err());
    }
}
