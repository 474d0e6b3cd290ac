//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `synthetix.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;
use synthetix_domain::device::{DeviceRecord, DriverConfig};
use synthetix_domain::error::InvalidDeviceIdError;
use synthetix_domain::id::DeviceId;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Device broker settings.
    pub broker: BrokerConfig,
    /// Device records written to the store at startup.
    pub devices: Vec<DeviceSeed>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Device broker configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Driver type used for devices whose record names none.
    pub default_driver_type: String,
    /// Upper bound for one observer send, in milliseconds.
    pub send_timeout_ms: u64,
}

/// A device record declared in the configuration file.
#[derive(Debug, Deserialize)]
pub struct DeviceSeed {
    pub id: String,
    /// Display name, the id when omitted.
    pub name: Option<String>,
    pub device_type: Option<String>,
    #[serde(default)]
    pub config: DriverConfig,
}

impl DeviceSeed {
    /// Convert into a record with no persisted state.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or padded with whitespace.
    pub fn to_record(&self) -> Result<DeviceRecord, InvalidDeviceIdError> {
        let device_id = DeviceId::new(self.id.clone())?;
        let name = self.name.clone().unwrap_or_else(|| self.id.clone());
        let mut record = DeviceRecord::new(device_id, name).with_config(self.config.clone());
        record.device_type.clone_from(&self.device_type);
        Ok(record)
    }
}

impl Config {
    /// Load configuration from `synthetix.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("synthetix.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SYNTHETIX_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("SYNTHETIX_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("SYNTHETIX_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("SYNTHETIX_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("SYNTHETIX_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("SYNTHETIX_DEFAULT_DRIVER") {
            self.broker.default_driver_type = val;
        }
        if let Ok(val) = std::env::var("SYNTHETIX_SEND_TIMEOUT_MS") {
            if let Ok(ms) = val.parse() {
                self.broker.send_timeout_ms = ms;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.broker.default_driver_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default driver type must not be empty".to_string(),
            ));
        }
        if self.broker.send_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "send timeout must be non-zero".to_string(),
            ));
        }
        for seed in &self.devices {
            seed.to_record().map_err(|err| {
                ConfigError::Validation(format!("device `{}`: {err}", seed.id))
            })?;
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Return the observer send timeout.
    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.broker.send_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:synthetix.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "synthetixd=info,synthetix=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            default_driver_type: "virtual_light".to_string(),
            send_timeout_ms: 5_000,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:synthetix.db?mode=rwc");
        assert_eq!(config.broker.default_driver_type, "virtual_light");
        assert_eq!(config.send_timeout(), Duration::from_secs(5));
        assert!(config.devices.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [broker]
            default_driver_type = 'virtual_switch'
            send_timeout_ms = 250

            [[devices]]
            id = 'lamp-1'
            name = 'Desk lamp'
            device_type = 'virtual_light'
            config = { latency_ms = 0, brightness = 40 }

            [[devices]]
            id = 'plug-1'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.broker.default_driver_type, "virtual_switch");
        assert_eq!(config.send_timeout(), Duration::from_millis(250));
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].config.get("brightness"), Some(&json!(40)));
    }

    #[test]
    fn should_convert_seed_to_record() {
        let toml = "
            [[devices]]
            id = 'plug-1'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        let record = config.devices[0].to_record().unwrap();
        assert_eq!(record.device_id.as_str(), "plug-1");
        assert_eq!(record.name, "plug-1");
        assert_eq!(record.device_type, None);
        assert!(record.state.is_empty());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_send_timeout() {
        let mut config = Config::default();
        config.broker.send_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_blank_default_driver_type() {
        let mut config = Config::default();
        config.broker.default_driver_type = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_seed_with_blank_id() {
        let config: Config = toml::from_str("[[devices]]\nid = ''").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn should_accept_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_format_custom_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_return_database_url() {
        let config = Config::default();
        assert_eq!(config.database_url(), "sqlite:synthetix.db?mode=rwc");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
