//! Command service: the inbound command path.
//!
//! Lazily loads the target driver, applies the command, reads back the
//! new state, persists it and broadcasts it to observers.

use std::sync::Arc;

use synthetix_domain::device::{Command, DeviceState, DriverConfig};
use synthetix_domain::error::DeviceError;
use synthetix_domain::event::StateChangeEvent;
use synthetix_domain::id::DeviceId;

use crate::device_manager::DeviceManager;
use crate::notification_hub::NotificationHub;
use crate::ports::{ObserverConnection, RecordStore};

/// Driver type used when a device record does not name one.
pub const DEFAULT_DRIVER_TYPE: &str = "virtual_light";

/// Coordinates the [`DeviceManager`], the [`NotificationHub`] and the
/// external [`RecordStore`] for each inbound command.
pub struct CommandService<S, C> {
    manager: Arc<DeviceManager>,
    hub: Arc<NotificationHub<C>>,
    store: S,
    default_driver_type: String,
}

impl<S, C> CommandService<S, C>
where
    S: RecordStore,
    C: ObserverConnection,
{
    /// Create a new service falling back to [`DEFAULT_DRIVER_TYPE`].
    pub fn new(manager: Arc<DeviceManager>, hub: Arc<NotificationHub<C>>, store: S) -> Self {
        Self {
            manager,
            hub,
            store,
            default_driver_type: DEFAULT_DRIVER_TYPE.to_string(),
        }
    }

    /// Override the fallback driver type name.
    #[must_use]
    pub fn with_default_driver_type(mut self, type_name: impl Into<String>) -> Self {
        self.default_driver_type = type_name.into();
        self
    }

    /// The device manager commands are routed through.
    #[must_use]
    pub fn manager(&self) -> &Arc<DeviceManager> {
        &self.manager
    }

    /// The hub state changes are broadcast on.
    #[must_use]
    pub fn hub(&self) -> &Arc<NotificationHub<C>> {
        &self.hub
    }

    /// Apply `command` to a device and return its new state.
    ///
    /// Loads the driver first if needed, using the device record's type
    /// and configuration. On success the new state is persisted and then
    /// broadcast; broadcast problems are never reported here.
    ///
    /// # Errors
    ///
    /// - load errors ([`DeviceError::UnknownDriverType`],
    ///   [`DeviceError::ConnectFailure`]) or [`DeviceError::RecordStore`]
    ///   when the record cannot be fetched
    /// - [`DeviceError::NotLoaded`] / [`DeviceError::CommandRejected`] from
    ///   the manager; nothing is persisted or broadcast in that case
    /// - [`DeviceError::PersistenceFailure`] when the command was applied
    ///   but the store write failed; observers were still notified
    #[tracing::instrument(skip_all, fields(device_id = %device_id))]
    pub async fn execute(
        &self,
        device_id: &DeviceId,
        command: &Command,
    ) -> Result<DeviceState, DeviceError> {
        self.ensure_loaded(device_id).await?;
        self.manager.send_command(device_id, command).await?;

        let state = self
            .manager
            .get_state(device_id)
            .await
            .ok_or_else(|| DeviceError::NotLoaded(device_id.clone()))?;

        let persisted = self.store.persist_device_state(device_id, &state).await;

        let event = StateChangeEvent::device_update(device_id.clone(), state.clone());
        self.hub.broadcast(&event).await;

        match persisted {
            Ok(()) => Ok(state),
            Err(source) => {
                tracing::error!(error = %source, "device state applied but not persisted");
                Err(DeviceError::PersistenceFailure {
                    device_id: device_id.clone(),
                    state,
                    source,
                })
            }
        }
    }

    /// Current in-memory state of a loaded device.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::NotLoaded`] if no driver is loaded.
    pub async fn state(&self, device_id: &DeviceId) -> Result<DeviceState, DeviceError> {
        self.manager
            .get_state(device_id)
            .await
            .ok_or_else(|| DeviceError::NotLoaded(device_id.clone()))
    }

    /// Unload a device and tell observers about it.
    ///
    /// Returns `false` if the device was not loaded.
    #[tracing::instrument(skip_all, fields(device_id = %device_id))]
    pub async fn release(&self, device_id: &DeviceId) -> bool {
        let Some(last_state) = self.manager.unload(device_id).await else {
            return false;
        };
        let event = StateChangeEvent::device_unloaded(device_id.clone(), last_state);
        self.hub.broadcast(&event).await;
        true
    }

    async fn ensure_loaded(&self, device_id: &DeviceId) -> Result<(), DeviceError> {
        if self.manager.is_loaded(device_id) {
            return Ok(());
        }

        let record = self
            .store
            .fetch_device_record(device_id)
            .await
            .map_err(|source| DeviceError::RecordStore {
                device_id: device_id.clone(),
                source,
            })?;

        let (type_name, config) = match &record {
            Some(record) => (
                record.device_type_or(&self.default_driver_type),
                record.driver_config(),
            ),
            None => {
                tracing::debug!("no device record, loading with defaults");
                (self.default_driver_type.as_str(), DriverConfig::new())
            }
        };

        match self.manager.load(device_id, type_name, config).await {
            Ok(()) | Err(DeviceError::AlreadyLoaded(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }
}
