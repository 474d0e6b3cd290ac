//! Virtual device implementations — light and switch.
//!
//! Both variants share the lenient coercion rules below: a key whose value
//! cannot be coerced is ignored, never rejected.

mod light;
mod switch;

pub use light::VirtualLight;
pub use switch::VirtualSwitch;

use std::time::Duration;

use serde_json::Value;
use synthetix_domain::device::DriverConfig;
use synthetix_domain::error::DriverError;

/// Read the desired power flag from `power`, or its alias `on`.
fn power(update: &serde_json::Map<String, Value>) -> Option<bool> {
    update
        .get("power")
        .or_else(|| update.get("on"))
        .and_then(Value::as_bool)
}

/// Coerce a brightness value to an integer percentage in `0..=100`.
///
/// Accepts integers, integral floats and strings holding an integer.
#[allow(clippy::cast_possible_truncation)]
fn brightness(value: &Value) -> Option<i64> {
    let raw = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        })?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Some(raw.clamp(0, 100))
}

/// Non-empty string value.
fn color(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// Artificial write latency from the `latency_ms` config key.
///
/// # Errors
///
/// Returns [`DriverError::InvalidConfig`] if the key holds anything other
/// than a non-negative integer.
fn latency(config: &DriverConfig, default: Duration) -> Result<Duration, DriverError> {
    match config.get("latency_ms") {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_u64()
            .map(Duration::from_millis)
            .ok_or_else(|| DriverError::InvalidConfig {
                key: "latency_ms".to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn should_clamp_brightness_into_percent_range() {
        for (input, expected) in [
            (json!(-20), 0),
            (json!(0), 0),
            (json!(42), 42),
            (json!(100), 100),
            (json!(150), 100),
            (json!(i64::MAX), 100),
            (json!(i64::MIN), 0),
        ] {
            assert_eq!(brightness(&input), Some(expected), "input {input}");
        }
    }

    #[test]
    fn should_coerce_integral_float_and_numeric_string() {
        assert_eq!(brightness(&json!(40.0)), Some(40));
        assert_eq!(brightness(&json!("42")), Some(42));
        assert_eq!(brightness(&json!(" 7 ")), Some(7));
        assert_eq!(brightness(&json!("250")), Some(100));
    }

    #[test]
    fn should_ignore_non_integer_brightness() {
        for input in [
            json!(40.5),
            json!("bright"),
            json!("4.2"),
            json!(true),
            json!(null),
            json!([50]),
            json!({"value": 50}),
        ] {
            assert_eq!(brightness(&input), None, "input {input}");
        }
    }

    #[test]
    fn should_prefer_power_over_on_alias() {
        assert_eq!(power(&object(json!({"on": true}))), Some(true));
        assert_eq!(power(&object(json!({"power": false, "on": true}))), Some(false));
        assert_eq!(power(&object(json!({"power": "yes"}))), None);
        assert_eq!(power(&object(json!({}))), None);
    }

    #[test]
    fn should_reject_empty_color() {
        assert_eq!(color(&json!("")), None);
        assert_eq!(color(&json!(3)), None);
        assert_eq!(color(&json!("red")), Some("red"));
    }

    #[test]
    fn should_read_latency_from_config() {
        let default = Duration::from_millis(100);
        assert_eq!(latency(&DriverConfig::new(), default).unwrap(), default);
        assert_eq!(
            latency(&object(json!({"latency_ms": 5})), default).unwrap(),
            Duration::from_millis(5)
        );
        assert!(matches!(
            latency(&object(json!({"latency_ms": "fast"})), default),
            Err(DriverError::InvalidConfig { key }) if key == "latency_ms"
        ));
    }
}
