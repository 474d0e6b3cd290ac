//! Virtual switch — a plain on/off device with no latency.

use async_trait::async_trait;
use serde_json::Value;

use synthetix_app::ports::Driver;
use synthetix_domain::device::{Command, DeviceState, DriverConfig};
use synthetix_domain::error::DriverError;
use synthetix_domain::id::DeviceId;

/// A simulated switch that can be turned on and off.
#[derive(Debug)]
pub struct VirtualSwitch {
    device_id: DeviceId,
    connected: bool,
    power: bool,
}

impl VirtualSwitch {
    pub const TYPE_NAME: &'static str = "virtual_switch";

    /// Build a switch, seeding `power` (or `on`) from the config.
    #[must_use]
    pub fn new(device_id: DeviceId, config: &DriverConfig) -> Self {
        Self {
            device_id,
            connected: false,
            power: super::power(config).unwrap_or(false),
        }
    }
}

#[async_trait]
impl Driver for VirtualSwitch {
    fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    fn driver_type(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self) -> Result<(), DriverError> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), DriverError> {
        self.connected = false;
        Ok(())
    }

    async fn state(&self) -> DeviceState {
        let mut state = DeviceState::new();
        state.insert("power".to_string(), Value::Bool(self.power));
        state
    }

    async fn set_state(&mut self, update: &Command) -> Result<(), DriverError> {
        if !self.connected {
            return Err(DriverError::NotConnected);
        }
        if let Some(power) = super::power(update) {
            self.power = power;
        }
        Ok(())
    }
}
