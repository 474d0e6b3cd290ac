//! Opens the device record database.
//!
//! The schema is a single `devices` table (see `migrations/`), brought up
//! to date every time the database is opened.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::StorageError;
use crate::record_store::SqliteRecordStore;

/// Where the device records live.
pub struct Config {
    /// `SQLite` URL, e.g. `sqlite:synthetix.db` or `sqlite::memory:`.
    /// A missing database file is created.
    pub database_url: String,
}

impl Config {
    /// Open the database and apply the `devices` schema.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the URL is invalid, the database cannot
    /// be opened, or a migration fails.
    pub async fn build(self) -> Result<Database, StorageError> {
        let options = SqliteConnectOptions::from_str(&self.database_url)?.create_if_missing(true);
        let pool = if self.is_in_memory() {
            // Every in-memory connection is a separate, empty database, so
            // the pool must keep exactly one alive for the whole run.
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePool::connect_with(options).await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Database { pool })
    }

    fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}

/// An open, migrated device record database.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// The connection pool, shared by every clone.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// A record store over this database.
    #[must_use]
    pub fn record_store(&self) -> SqliteRecordStore {
        SqliteRecordStore::new(self.pool.clone())
    }
}
