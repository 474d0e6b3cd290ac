//! # synthetix-adapter-virtual
//!
//! Simulated drivers for testing and demonstration.
//!
//! ## Provided driver types
//!
//! | Type name | State | Behaviour |
//! |-----------|-------|-----------|
//! | `virtual_light` | `power`, `brightness`, `color` | Clamps brightness to `0..=100`, waits `latency_ms` (default 100) per write |
//! | `virtual_switch` | `power` | Immediate writes |
//!
//! ## Dependency rule
//!
//! Depends on `synthetix-app` (port traits) and `synthetix-domain` only.

mod devices;

use synthetix_app::ports::Driver;
use synthetix_app::registry::DriverRegistry;

pub use devices::{VirtualLight, VirtualSwitch};

/// Register every virtual driver type with `registry`.
pub fn register(registry: &mut DriverRegistry) {
    registry.register(VirtualLight::TYPE_NAME, |device_id, config| {
        Ok(Box::new(VirtualLight::new(device_id, &config)?) as Box<dyn Driver>)
    });
    registry.register(VirtualSwitch::TYPE_NAME, |device_id, config| {
        Ok(Box::new(VirtualSwitch::new(device_id, &config)) as Box<dyn Driver>)
    });
}
