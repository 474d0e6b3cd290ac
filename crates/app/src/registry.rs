//! Driver registry: maps device-type names to driver constructors.
//!
//! Populated once at startup, then shared read-only behind an `Arc`.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use synthetix_domain::device::DriverConfig;
use synthetix_domain::error::{DeviceError, DriverError};
use synthetix_domain::id::DeviceId;

use crate::panic::panic_message;
use crate::ports::{Driver, DriverConstructor};

/// Registry of known driver types.
#[derive(Default)]
pub struct DriverRegistry {
    constructors: HashMap<String, Arc<DriverConstructor>>,
}

impl DriverRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `type_name` with a constructor.
    ///
    /// Registering the same name twice replaces the earlier constructor.
    pub fn register<F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn(DeviceId, DriverConfig) -> Result<Box<dyn Driver>, DriverError>
            + Send
            + Sync
            + 'static,
    {
        let type_name = type_name.into();
        if self
            .constructors
            .insert(type_name.clone(), Arc::new(constructor))
            .is_some()
        {
            tracing::debug!(driver_type = %type_name, "replaced driver type registration");
        } else {
            tracing::info!(driver_type = %type_name, "registered driver type");
        }
    }

    /// Whether a constructor is registered under `type_name`.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build a (not yet connected) driver instance.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::UnknownDriverType`] if nothing is registered
    /// under `type_name`, or [`DeviceError::ConnectFailure`] if the
    /// constructor fails or panics.
    pub fn create(
        &self,
        type_name: &str,
        device_id: DeviceId,
        config: DriverConfig,
    ) -> Result<Box<dyn Driver>, DeviceError> {
        let constructor = self
            .constructors
            .get(type_name)
            .ok_or_else(|| DeviceError::UnknownDriverType(type_name.to_string()))?;

        let id = device_id.clone();
        let built = std::panic::catch_unwind(AssertUnwindSafe(|| constructor(id, config)))
            .unwrap_or_else(|payload| Err(DriverError::Panicked(panic_message(&*payload))));

        built.map_err(|source| DeviceError::ConnectFailure { device_id, source })
    }
}
