//! Error taxonomy shared across the workspace.
//!
//! Runtime and environmental failures are values: drivers return
//! [`DriverError`], the device manager and command service return
//! [`DeviceError`], and observer transports return [`NotificationError`],
//! which never leaves the notification hub.

use std::error::Error as StdError;

use crate::device::DeviceState;
use crate::id::DeviceId;

/// Boxed error used to carry adapter-specific causes through the core.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure reported by the broker's core operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// No constructor registered under this driver type name.
    #[error("unknown driver type `{0}`")]
    UnknownDriverType(String),

    /// The driver could not be built or refused to connect.
    #[error("failed to connect device `{device_id}`")]
    ConnectFailure {
        device_id: DeviceId,
        #[source]
        source: DriverError,
    },

    /// A driver is already loaded (or connecting) for this device.
    #[error("device `{0}` is already loaded")]
    AlreadyLoaded(DeviceId),

    /// No driver is loaded for this device.
    #[error("device `{0}` is not loaded")]
    NotLoaded(DeviceId),

    /// The driver refused or failed to apply the command.
    #[error("device `{device_id}` rejected the command")]
    CommandRejected {
        device_id: DeviceId,
        #[source]
        source: DriverError,
    },

    /// The command was applied but the record store write failed.
    ///
    /// Carries the in-memory state the driver ended up in.
    #[error("state of device `{device_id}` changed but could not be persisted")]
    PersistenceFailure {
        device_id: DeviceId,
        state: DeviceState,
        #[source]
        source: StoreError,
    },

    /// The device record could not be fetched from the record store.
    #[error("failed to fetch the record of device `{device_id}`")]
    RecordStore {
        device_id: DeviceId,
        #[source]
        source: StoreError,
    },

    /// A caller supplied a malformed device identifier.
    #[error(transparent)]
    InvalidDeviceId(#[from] InvalidDeviceIdError),
}

impl DeviceError {
    /// Whether retrying the same call later may succeed without any
    /// configuration change.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailure { .. } | Self::NotLoaded(_) | Self::RecordStore { .. }
        )
    }
}

/// Failure returned by a driver implementation.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A write was attempted while the connectivity flag is false.
    #[error("driver is not connected")]
    NotConnected,

    /// The physical device could not be reached.
    #[error("device unreachable: {0}")]
    Unreachable(String),

    /// A configuration key holds an unusable value.
    #[error("invalid driver configuration for `{key}`")]
    InvalidConfig { key: String },

    /// The driver panicked; the panic was caught at the manager boundary.
    #[error("driver panicked: {0}")]
    Panicked(String),
}

/// Failure to deliver an event to one observer.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The observer's channel is already closed.
    #[error("observer connection closed")]
    Closed,

    /// The event could not be encoded.
    #[error("failed to serialize event")]
    Serialize(#[from] serde_json::Error),

    /// The underlying transport reported an error.
    #[error("transport error")]
    Transport(#[source] BoxError),

    /// The send did not complete within the hub's send timeout.
    #[error("send timed out")]
    Timeout,
}

/// Failure reported by a record store adapter.
#[derive(Debug, thiserror::Error)]
#[error("record store error")]
pub struct StoreError(#[source] BoxError);

impl StoreError {
    /// Wrap an adapter-specific error.
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self(err.into())
    }
}

/// Rejected device identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDeviceIdError {
    #[error("device id must not be empty")]
    Empty,
    #[error("device id `{0}` has leading or trailing whitespace")]
    Whitespace(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp() -> DeviceId {
        DeviceId::new("lamp-1").unwrap()
    }

    #[test]
    fn should_mention_device_in_not_loaded_message() {
        let err = DeviceError::NotLoaded(lamp());
        assert_eq!(err.to_string(), "device `lamp-1` is not loaded");
    }

    #[test]
    fn should_expose_driver_error_as_source() {
        let err = DeviceError::CommandRejected {
            device_id: lamp(),
            source: DriverError::NotConnected,
        };
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "driver is not connected");
    }

    #[test]
    fn should_treat_connect_failure_as_retryable() {
        let err = DeviceError::ConnectFailure {
            device_id: lamp(),
            source: DriverError::Unreachable("timeout".to_string()),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn should_not_retry_unknown_driver_type() {
        assert!(!DeviceError::UnknownDriverType("toaster".to_string()).is_retryable());
    }

    #[test]
    fn should_wrap_any_error_in_store_error() {
        let err = StoreError::new("disk full");
        assert_eq!(err.source().unwrap().to_string(), "disk full");
    }
}
