//! Device state, driver configuration, commands and device records.
//!
//! State, configuration and commands are opaque JSON objects: each driver
//! variant decides which keys it understands.

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;
use crate::time::Timestamp;

/// Snapshot of a device's in-memory state.
pub type DeviceState = serde_json::Map<String, serde_json::Value>;

/// Configuration blob handed to a driver constructor.
pub type DriverConfig = serde_json::Map<String, serde_json::Value>;

/// Partial state update sent to a device.
pub type Command = serde_json::Map<String, serde_json::Value>;

/// A device as the external record store knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device_id: DeviceId,
    pub name: String,
    /// Registered driver type name; `None` means "use the broker default".
    pub device_type: Option<String>,
    #[serde(default)]
    pub config: DriverConfig,
    /// Last persisted state.
    #[serde(default)]
    pub state: DeviceState,
    pub last_seen: Option<Timestamp>,
}

impl DeviceRecord {
    /// Create a record with no type, configuration or state.
    #[must_use]
    pub fn new(device_id: DeviceId, name: impl Into<String>) -> Self {
        Self {
            device_id,
            name: name.into(),
            device_type: None,
            config: DriverConfig::new(),
            state: DeviceState::new(),
            last_seen: None,
        }
    }

    /// Set the driver type name.
    #[must_use]
    pub fn with_device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    /// Set the driver configuration.
    #[must_use]
    pub fn with_config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the last persisted state.
    #[must_use]
    pub fn with_state(mut self, state: DeviceState) -> Self {
        self.state = state;
        self
    }

    /// Driver type name, falling back to `default` when unset or blank.
    #[must_use]
    pub fn device_type_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.device_type.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => default,
        }
    }

    /// Configuration handed to the driver on load.
    ///
    /// The last persisted state is the base so drivers can restore it;
    /// explicit configuration keys win over state keys of the same name.
    #[must_use]
    pub fn driver_config(&self) -> DriverConfig {
        let mut merged = self.state.clone();
        for (key, value) in &self.config {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}
