//! State-change events pushed to observers.

use serde::{Deserialize, Serialize};

use crate::device::DeviceState;
use crate::id::DeviceId;
use crate::time::{Timestamp, now};

/// What happened to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A command was applied; `state` is the device's new state.
    DeviceUpdate,
    /// The driver was released; `state` is the last known state.
    DeviceUnloaded,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeviceUpdate => f.write_str("device_update"),
            Self::DeviceUnloaded => f.write_str("device_unloaded"),
        }
    }
}

/// Immutable notification describing a device's new state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChangeEvent {
    pub event: EventKind,
    pub device_id: DeviceId,
    pub state: DeviceState,
    pub timestamp: Timestamp,
}

impl StateChangeEvent {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(event: EventKind, device_id: DeviceId, state: DeviceState) -> Self {
        Self {
            event,
            device_id,
            state,
            timestamp: now(),
        }
    }

    /// Shorthand for a [`EventKind::DeviceUpdate`] event.
    #[must_use]
    pub fn device_update(device_id: DeviceId, state: DeviceState) -> Self {
        Self::new(EventKind::DeviceUpdate, device_id, state)
    }

    /// Shorthand for a [`EventKind::DeviceUnloaded`] event.
    #[must_use]
    pub fn device_unloaded(device_id: DeviceId, state: DeviceState) -> Self {
        Self::new(EventKind::DeviceUnloaded, device_id, state)
    }
}
