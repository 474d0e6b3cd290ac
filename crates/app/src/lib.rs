//! # synthetix-app
//!
//! Application layer — the device-control core and its **port definitions**.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `Driver` — one controllable device (connect, read state, apply commands)
//!   - `RecordStore` — fetch device records and persist device state
//!   - `ObserverConnection` — a live connection that receives state changes
//! - Own the concurrency core:
//!   - `DriverRegistry` — device-type name to driver constructor
//!   - `DeviceManager` — loaded drivers, serialized per device
//!   - `NotificationHub` — best-effort fan-out to observers
//! - Orchestrate the inbound command path in `CommandService`
//!
//! ## Dependency rule
//! Depends on `synthetix-domain` only (plus `tokio::sync`/`tokio::time`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod device_manager;
pub mod notification_hub;
mod panic;
pub mod ports;
pub mod registry;
pub mod services;

#[cfg(test)]
mod testing;
