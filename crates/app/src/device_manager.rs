//! Device manager: owns the loaded drivers and routes commands to them.
//!
//! The table maps each device id to a slot holding its driver behind a
//! fair async mutex. The table lock is held only for lookups and
//! insert/remove, never across an `.await`; each device's own mutex
//! serializes its commands in arrival order, so devices never wait on
//! each other.
//!
//! Per device:
//!
//! ```text
//! unloaded ──load──▶ connecting ──ok──▶ loaded ──unload──▶ unloaded
//!     │                  │
//!     └──unknown type────┴──connect error──▶ failed (nothing left in the table)
//! ```

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::FutureExt;
use tokio::sync::Mutex;

use synthetix_domain::device::{Command, DeviceState, DriverConfig};
use synthetix_domain::error::{DeviceError, DriverError};
use synthetix_domain::id::DeviceId;

use crate::panic::panic_message;
use crate::ports::Driver;
use crate::registry::DriverRegistry;

/// One table entry. `driver` is `None` while connecting, and after an
/// unload took the driver out.
struct DeviceSlot {
    driver_type: String,
    driver: Mutex<Option<Box<dyn Driver>>>,
}

/// Table entry claimed by an in-flight `load`.
///
/// Dropping it removes the entry, so a failed connect and a `load` future
/// dropped mid-connect both leave the table as it was.
struct Reservation<'a> {
    manager: &'a DeviceManager,
    device_id: &'a DeviceId,
    slot: &'a Arc<DeviceSlot>,
    confirmed: bool,
}

impl Reservation<'_> {
    /// Keep the entry: the driver is connected and stored in the slot.
    fn confirm(mut self) {
        self.confirmed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.confirmed {
            self.manager.remove_slot(self.device_id, self.slot);
        }
    }
}

/// Owns every loaded driver, keyed by device id.
pub struct DeviceManager {
    registry: Arc<DriverRegistry>,
    table: RwLock<HashMap<DeviceId, Arc<DeviceSlot>>>,
}

impl DeviceManager {
    /// Create a manager that builds drivers from `registry`.
    #[must_use]
    pub fn new(registry: Arc<DriverRegistry>) -> Self {
        Self {
            registry,
            table: RwLock::new(HashMap::new()),
        }
    }

    /// The registry this manager builds drivers from.
    #[must_use]
    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Construct and connect a driver for `device_id`.
    ///
    /// While connecting, the id is reserved: a concurrent `load` fails with
    /// [`DeviceError::AlreadyLoaded`] and commands queue behind the connect.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::UnknownDriverType`] if `type_name` is not registered
    /// - [`DeviceError::AlreadyLoaded`] if the device is loaded or connecting;
    ///   the existing driver is left untouched
    /// - [`DeviceError::ConnectFailure`] if construction or `connect` fails;
    ///   the device is then absent from the table
    #[tracing::instrument(skip_all, fields(device_id = %device_id, driver_type = type_name))]
    pub async fn load(
        &self,
        device_id: &DeviceId,
        type_name: &str,
        config: DriverConfig,
    ) -> Result<(), DeviceError> {
        if self.is_loaded(device_id) {
            return Err(DeviceError::AlreadyLoaded(device_id.clone()));
        }

        let mut driver = self.registry.create(type_name, device_id.clone(), config)?;

        let slot = Arc::new(DeviceSlot {
            driver_type: type_name.to_string(),
            driver: Mutex::new(None),
        });
        // Nobody else can reach the slot yet, so this lock is immediate.
        let mut guard = slot.driver.lock().await;
        let reservation = {
            let mut table = self.write_table();
            if table.contains_key(device_id) {
                return Err(DeviceError::AlreadyLoaded(device_id.clone()));
            }
            table.insert(device_id.clone(), Arc::clone(&slot));
            Reservation {
                manager: self,
                device_id,
                slot: &slot,
                confirmed: false,
            }
        };

        let connected = match AssertUnwindSafe(driver.connect()).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(DriverError::Panicked(panic_message(&*payload))),
        };

        match connected {
            Ok(()) => {
                *guard = Some(driver);
                reservation.confirm();
                tracing::info!("device loaded");
                Ok(())
            }
            Err(source) => {
                drop(reservation);
                tracing::warn!(error = %source, "failed to connect device");
                Err(DeviceError::ConnectFailure {
                    device_id: device_id.clone(),
                    source,
                })
            }
        }
    }

    /// Disconnect and remove a device's driver.
    ///
    /// No-op when the device is not loaded. Waits for commands already
    /// queued on the device, then disconnects; disconnect errors and panics
    /// are logged and swallowed. Returns the driver's last state, or `None`
    /// if nothing was unloaded.
    #[tracing::instrument(skip_all, fields(device_id = %device_id))]
    pub async fn unload(&self, device_id: &DeviceId) -> Option<DeviceState> {
        let slot = self.write_table().remove(device_id)?;

        let mut driver = slot.driver.lock().await.take()?;
        let last_state = driver.state().await;

        match AssertUnwindSafe(driver.disconnect()).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "driver failed to disconnect cleanly");
            }
            Err(payload) => {
                tracing::error!(panic = %panic_message(&*payload), "driver panicked on disconnect");
            }
        }
        tracing::info!(driver_type = %slot.driver_type, "device unloaded");
        Some(last_state)
    }

    /// Unload every device, disconnecting them concurrently.
    pub async fn unload_all(&self) {
        let ids = self.loaded_devices();
        futures::future::join_all(ids.iter().map(|id| self.unload(id))).await;
    }

    /// Current state of a device, `None` if it is not loaded.
    pub async fn get_state(&self, device_id: &DeviceId) -> Option<DeviceState> {
        let slot = self.slot(device_id)?;
        let guard = slot.driver.lock().await;
        let driver = guard.as_ref()?;

        match AssertUnwindSafe(driver.state()).catch_unwind().await {
            Ok(state) => Some(state),
            Err(payload) => {
                tracing::error!(
                    device_id = %device_id,
                    panic = %panic_message(&*payload),
                    "driver panicked while reading state"
                );
                None
            }
        }
    }

    /// Apply a command to a loaded device.
    ///
    /// Commands to the same device run one at a time in arrival order;
    /// commands to different devices run in parallel.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::NotLoaded`] if no driver is loaded; no driver is invoked
    /// - [`DeviceError::CommandRejected`] if the driver fails or panics
    #[tracing::instrument(skip_all, fields(device_id = %device_id))]
    pub async fn send_command(
        &self,
        device_id: &DeviceId,
        command: &Command,
    ) -> Result<(), DeviceError> {
        let Some(slot) = self.slot(device_id) else {
            tracing::warn!("device not loaded, dropping command");
            return Err(DeviceError::NotLoaded(device_id.clone()));
        };

        let mut guard = slot.driver.lock().await;
        let Some(driver) = guard.as_mut() else {
            return Err(DeviceError::NotLoaded(device_id.clone()));
        };

        tracing::debug!(?command, driver_type = %slot.driver_type, "sending command");
        let applied = match AssertUnwindSafe(driver.set_state(command)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(DriverError::Panicked(panic_message(&*payload))),
        };

        applied.map_err(|source| {
            tracing::warn!(error = %source, "driver rejected command");
            DeviceError::CommandRejected {
                device_id: device_id.clone(),
                source,
            }
        })
    }

    /// Whether the device is loaded or currently connecting.
    #[must_use]
    pub fn is_loaded(&self, device_id: &DeviceId) -> bool {
        self.read_table().contains_key(device_id)
    }

    /// Ids of all loaded devices, sorted.
    #[must_use]
    pub fn loaded_devices(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self.read_table().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of loaded devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_table().len()
    }

    /// Whether no device is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_table().is_empty()
    }

    fn slot(&self, device_id: &DeviceId) -> Option<Arc<DeviceSlot>> {
        self.read_table().get(device_id).cloned()
    }

    /// Remove `slot` from the table unless it was already replaced.
    fn remove_slot(&self, device_id: &DeviceId, slot: &Arc<DeviceSlot>) {
        let mut table = self.write_table();
        if table
            .get(device_id)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            table.remove(device_id);
        }
    }

    fn read_table(&self) -> RwLockReadGuard<'_, HashMap<DeviceId, Arc<DeviceSlot>>> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_table(&self) -> RwLockWriteGuard<'_, HashMap<DeviceId, Arc<DeviceSlot>>> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }
}
