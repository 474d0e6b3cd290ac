//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the core and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod driver;
pub mod observer;
pub mod record_store;

pub use driver::{Driver, DriverConstructor};
pub use observer::ObserverConnection;
pub use record_store::RecordStore;
