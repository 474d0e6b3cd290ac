//! `SQLite` implementation of [`RecordStore`].

use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use synthetix_app::ports::RecordStore;
use synthetix_domain::device::{DeviceRecord, DeviceState};
use synthetix_domain::error::StoreError;
use synthetix_domain::id::DeviceId;
use synthetix_domain::time::now;

use crate::error::StorageError;

/// Wrapper for converting database rows into a domain [`DeviceRecord`].
struct Wrapper(DeviceRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let device_type: Option<String> = row.try_get("device_type")?;
        let config: String = row.try_get("config")?;
        let state: String = row.try_get("state")?;
        let last_seen: Option<String> = row.try_get("last_seen")?;

        let device_id =
            DeviceId::from_str(&id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let config =
            serde_json::from_str(&config).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let state =
            serde_json::from_str(&state).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let last_seen = last_seen
            .map(|s| chrono::DateTime::parse_from_rfc3339(&s))
            .transpose()
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .map(|dt| dt.with_timezone(&chrono::Utc));

        Ok(Self(DeviceRecord {
            device_id,
            name,
            device_type,
            config,
            state,
            last_seen,
        }))
    }
}

const SELECT_BY_ID: &str = "SELECT * FROM devices WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM devices ORDER BY id";
// Unknown devices get a row named after their id.
const UPSERT_STATE: &str = r"
    INSERT INTO devices (id, name, state, last_seen)
    VALUES (?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET state = excluded.state, last_seen = excluded.last_seen
";
// Persisted state survives a re-seed.
const UPSERT_RECORD: &str = r"
    INSERT INTO devices (id, name, device_type, config, state)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        device_type = excluded.device_type,
        config = excluded.config
";

/// `SQLite`-backed device record store.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a record, or update the name, type and configuration of an
    /// existing one. The stored state of an existing record is kept.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if serialization or the query fails.
    pub async fn upsert_record(&self, record: &DeviceRecord) -> Result<(), StorageError> {
        sqlx::query(UPSERT_RECORD)
            .bind(record.device_id.as_str())
            .bind(&record.name)
            .bind(&record.device_type)
            .bind(serde_json::to_string(&record.config)?)
            .bind(serde_json::to_string(&record.state)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Every stored record, ordered by device id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query or row decoding fails.
    pub async fn list_records(&self) -> Result<Vec<DeviceRecord>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

impl RecordStore for SqliteRecordStore {
    fn fetch_device_record(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, StoreError>> + Send {
        let pool = self.pool.clone();
        let id = device_id.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|w| w.0))
        }
    }

    fn persist_device_state(
        &self,
        device_id: &DeviceId,
        state: &DeviceState,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let pool = self.pool.clone();
        let id = device_id.to_string();
        let state = serde_json::to_string(state);
        async move {
            let state = state.map_err(StorageError::from)?;
            sqlx::query(UPSERT_STATE)
                .bind(&id)
                .bind(&id)
                .bind(state)
                .bind(now().to_rfc3339())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}
