//! Virtual light — `power`, `brightness` and `color`, with simulated latency.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use synthetix_app::ports::Driver;
use synthetix_domain::device::{Command, DeviceState, DriverConfig};
use synthetix_domain::error::DriverError;
use synthetix_domain::id::DeviceId;

/// Write latency when the config does not set `latency_ms`.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(100);

/// A simulated dimmable colour light.
#[derive(Debug)]
pub struct VirtualLight {
    device_id: DeviceId,
    connected: bool,
    power: bool,
    brightness: i64,
    color: String,
    latency: Duration,
}

impl VirtualLight {
    pub const TYPE_NAME: &'static str = "virtual_light";

    /// Build a light, seeding its state from `power`/`brightness`/`color`
    /// config keys.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidConfig`] if `latency_ms` is malformed.
    pub fn new(device_id: DeviceId, config: &DriverConfig) -> Result<Self, DriverError> {
        let mut light = Self {
            device_id,
            connected: false,
            power: false,
            brightness: 100,
            color: "white".to_string(),
            latency: super::latency(config, DEFAULT_LATENCY)?,
        };
        light.merge(config);
        Ok(light)
    }

    fn merge(&mut self, update: &serde_json::Map<String, Value>) {
        if let Some(power) = super::power(update) {
            self.power = power;
        }
        if let Some(brightness) = update.get("brightness").and_then(super::brightness) {
            self.brightness = brightness;
        }
        if let Some(color) = update.get("color").and_then(super::color) {
            self.color = color.to_string();
        }
    }
}

#[async_trait]
impl Driver for VirtualLight {
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
        tracing::debug!(device_id = %self.device_id, "virtual light connected");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), DriverError> {
        self.connected = false;
        tracing::debug!(device_id = %self.device_id, "virtual light disconnected");
        Ok(())
    }

    async fn state(&self) -> DeviceState {
        let mut state = DeviceState::new();
        state.insert("power".to_string(), Value::Bool(self.power));
        state.insert("brightness".to_string(), Value::from(self.brightness));
        state.insert("color".to_string(), Value::String(self.color.clone()));
        state
    }

    async fn set_state(&mut self, update: &Command) -> Result<(), DriverError> {
        if !self.connected {
            return Err(DriverError::NotConnected);
        }
        tokio::time::sleep(self.latency).await;
        self.merge(update);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn light(config: Value) -> VirtualLight {
        VirtualLight::new(DeviceId::new("lamp-1").unwrap(), &object(config)).unwrap()
    }

    #[tokio::test]
    async fn should_start_off_at_full_brightness_in_white() {
        let light = light(json!({}));
        assert_eq!(
            light.state().await,
            object(json!({"power": false, "brightness": 100, "color": "white"}))
        );
        assert!(!light.is_connected());
    }

    #[tokio::test]
    async fn should_seed_state_from_config() {
        let light = light(json!({"power": true, "brightness": "30", "color": "amber"}));
        assert_eq!(
            light.state().await,
            object(json!({"power": true, "brightness": 30, "color": "amber"}))
        );
    }

    #[test]
    fn should_reject_malformed_latency() {
        let result = VirtualLight::new(
            DeviceId::new("lamp-1").unwrap(),
            &object(json!({"latency_ms": -1})),
        );
        assert!(matches!(result, Err(DriverError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn should_refuse_writes_while_disconnected() {
        let mut light = light(json!({}));
        let result = light.set_state(&object(json!({"power": true}))).await;

        assert!(matches!(result, Err(DriverError::NotConnected)));
        assert_eq!(light.state().await.get("power"), Some(&json!(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn should_merge_update_and_clamp_brightness() {
        let mut light = light(json!({}));
        light.connect().await.unwrap();

        light
            .set_state(&object(json!({"power": true, "brightness": 150})))
            .await
            .unwrap();

        assert_eq!(
            light.state().await,
            object(json!({"power": true, "brightness": 100, "color": "white"}))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_accept_on_alias_and_ignore_unknown_keys() {
        let mut light = light(json!({}));
        light.connect().await.unwrap();

        light
            .set_state(&object(json!({"on": true, "hue": 200, "brightness": "dim"})))
            .await
            .unwrap();

        assert_eq!(
            light.state().await,
            object(json!({"power": true, "brightness": 100, "color": "white"}))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_color_when_update_is_empty_string() {
        let mut light = light(json!({"color": "red"}));
        light.connect().await.unwrap();

        light.set_state(&object(json!({"color": ""}))).await.unwrap();

        assert_eq!(light.state().await.get("color"), Some(&json!("red")));
    }

    #[tokio::test(start_paused = true)]
    async fn should_simulate_write_latency() {
        let mut light = light(json!({}));
        light.connect().await.unwrap();

        let started = tokio::time::Instant::now();
        light.set_state(&object(json!({"power": true}))).await.unwrap();

        assert!(started.elapsed() >= DEFAULT_LATENCY);
    }

    #[tokio::test]
    async fn should_keep_state_across_reconnect() {
        let mut light = light(json!({"latency_ms": 0}));
        light.connect().await.unwrap();
        light.set_state(&object(json!({"brightness": 10}))).await.unwrap();
        light.disconnect().await.unwrap();

        assert!(!light.is_connected());
        assert_eq!(light.state().await.get("brightness"), Some(&json!(10)));
    }
}
