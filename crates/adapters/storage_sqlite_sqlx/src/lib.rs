//! # synthetix-adapter-storage-sqlite-sqlx
//!
//! `SQLite` record store using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the [`RecordStore`](synthetix_app::ports::RecordStore) port
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between device records and database rows
//!
//! ## Dependency rule
//! Depends on `synthetix-app` (for port traits) and `synthetix-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod record_store;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use record_store::SqliteRecordStore;
