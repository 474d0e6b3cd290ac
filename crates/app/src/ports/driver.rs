//! Driver port: the capability contract every device class implements.
//!
//! A driver bridges one physical or simulated device into the broker. It is
//! created by the [`DriverRegistry`](crate::registry::DriverRegistry) and
//! owned exclusively by the [`DeviceManager`](crate::device_manager::DeviceManager)
//! from a successful `connect` until `unload`.
//!
//! Drivers are dispatched dynamically (`Box<dyn Driver>`) because the
//! variant is chosen at runtime from a type name.

use async_trait::async_trait;

use synthetix_domain::device::{Command, DeviceState, DriverConfig};
use synthetix_domain::error::DriverError;
use synthetix_domain::id::DeviceId;

/// A pluggable device driver.
///
/// The manager calls the lifecycle methods in order:
///
/// 1. [`connect`](Self::connect), exactly once
/// 2. any number of [`state`](Self::state) / [`set_state`](Self::set_state)
///    calls, never concurrently for the same instance
/// 3. [`disconnect`](Self::disconnect) on unload
///
/// Variants share no base state; each keeps its own connectivity flag.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Device this instance drives.
    fn device_id(&self) -> &DeviceId;

    /// Name of the variant, for diagnostics (e.g. `"virtual_light"`).
    fn driver_type(&self) -> &'static str;

    /// Current value of the connectivity flag.
    fn is_connected(&self) -> bool;

    /// Establish readiness and set the connectivity flag on success.
    ///
    /// Not guaranteed idempotent: callers must not connect twice without an
    /// intervening [`disconnect`](Self::disconnect).
    async fn connect(&mut self) -> Result<(), DriverError>;

    /// Release resources and clear the connectivity flag.
    ///
    /// Errors are reported but callers never propagate them.
    async fn disconnect(&mut self) -> Result<(), DriverError>;

    /// Snapshot of the in-memory state. Works whether connected or not.
    async fn state(&self) -> DeviceState;

    /// Apply a partial update.
    ///
    /// Must return [`DriverError::NotConnected`] while disconnected. Each
    /// variant documents its own lenient merge policy: unknown keys are
    /// ignored and out-of-range values clamped rather than rejected.
    async fn set_state(&mut self, update: &Command) -> Result<(), DriverError>;
}

/// Constructor capability stored in the registry for one driver type.
pub type DriverConstructor =
    dyn Fn(DeviceId, DriverConfig) -> Result<Box<dyn Driver>, DriverError> + Send + Sync;
