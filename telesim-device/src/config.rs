//! Device Configuration
//!
//! Everything comes from the environment. Identity and broker location have
//! sane defaults; credentials do not, and their absence is fatal at startup
//! so the process never attempts an unauthenticated connection. The error
//! names every missing variable at once instead of failing one at a time.

use std::env;
use std::time::Duration;

use thiserror::Error;

use telesim_connectors::TransportConfig;

/// Default device identifier.
pub const DEFAULT_DEVICE_ID: &str = "device_001";

/// Default human-readable device name.
pub const DEFAULT_DEVICE_NAME: &str = "Sensor_Temperature_001";

/// Default broker hostname.
pub const DEFAULT_HOST: &str = "mqtt.tago.io";

/// Default publish cycle interval.
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration failures; all are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required variables are absent or empty.
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    /// A variable is present but unparseable.
    #[error("invalid value for {name}: {value:?}")]
    Invalid {
        /// Variable name
        name: String,
        /// The offending value
        value: String,
    },
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Device identifier, stamped on readings and used in the topic
    pub device_id: String,
    /// Human-readable device name
    pub device_name: String,
    /// Seconds between publish cycles
    pub publish_interval: Duration,
    /// Broker connection parameters
    pub transport: TransportConfig,
}

impl DeviceConfig {
    /// Reads configuration from the process environment.
    ///
    /// `TAGO_MQTT_USERNAME` and `TAGO_MQTT_PASSWORD` are required;
    /// everything else falls back to defaults (`DEVICE_ID`, `DEVICE_NAME`,
    /// `TAGO_MQTT_HOST`, `TAGO_MQTT_PORT`, `PUBLISH_INTERVAL_SECS`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), but with an injectable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let mut missing = Vec::new();
        let username = get("TAGO_MQTT_USERNAME").unwrap_or_else(|| {
            missing.push("TAGO_MQTT_USERNAME".to_string());
            String::new()
        });
        let password = get("TAGO_MQTT_PASSWORD").unwrap_or_else(|| {
            missing.push("TAGO_MQTT_PASSWORD".to_string());
            String::new()
        });
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let device_id = get("DEVICE_ID").unwrap_or_else(|| DEFAULT_DEVICE_ID.to_string());
        let device_name = get("DEVICE_NAME").unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string());
        let host = get("TAGO_MQTT_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match get("TAGO_MQTT_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "TAGO_MQTT_PORT".to_string(),
                value: raw,
            })?,
            None => telesim_connectors::config::DEFAULT_PORT,
        };

        let publish_interval = match get("PUBLISH_INTERVAL_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                    name: "PUBLISH_INTERVAL_SECS".to_string(),
                    value: raw,
                })?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_PUBLISH_INTERVAL,
        };

        let transport = TransportConfig::new(host, username, password)
            .port(port)
            .client_id(device_id.clone());

        Ok(Self {
            device_id,
            device_name,
            publish_interval,
            transport,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config = DeviceConfig::from_lookup(lookup(&[
            ("TAGO_MQTT_USERNAME", "token"),
            ("TAGO_MQTT_PASSWORD", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.device_id, "device_001");
        assert_eq!(config.device_name, "Sensor_Temperature_001");
        assert_eq!(config.transport.host, "mqtt.tago.io");
        assert_eq!(config.transport.port, 8883);
        assert_eq!(config.transport.client_id, "device_001");
        assert_eq!(config.publish_interval, Duration::from_secs(10));
    }

    #[test]
    fn missing_credentials_are_reported_together() {
        let err = DeviceConfig::from_lookup(lookup(&[])).unwrap_err();

        match err {
            ConfigError::Missing(fields) => {
                assert_eq!(fields, ["TAGO_MQTT_USERNAME", "TAGO_MQTT_PASSWORD"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_credential_counts_as_missing() {
        let err = DeviceConfig::from_lookup(lookup(&[
            ("TAGO_MQTT_USERNAME", ""),
            ("TAGO_MQTT_PASSWORD", "secret"),
        ]))
        .unwrap_err();

        match err {
            ConfigError::Missing(fields) => assert_eq!(fields, ["TAGO_MQTT_USERNAME"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn overrides_are_honored() {
        let config = DeviceConfig::from_lookup(lookup(&[
            ("TAGO_MQTT_USERNAME", "token"),
            ("TAGO_MQTT_PASSWORD", "secret"),
            ("DEVICE_ID", "plant_42"),
            ("DEVICE_NAME", "Press_Sensor_42"),
            ("TAGO_MQTT_HOST", "broker.example.com"),
            ("TAGO_MQTT_PORT", "18883"),
            ("PUBLISH_INTERVAL_SECS", "2"),
        ]))
        .unwrap();

        assert_eq!(config.device_id, "plant_42");
        assert_eq!(config.device_name, "Press_Sensor_42");
        assert_eq!(config.transport.host, "broker.example.com");
        assert_eq!(config.transport.port, 18883);
        assert_eq!(config.transport.client_id, "plant_42");
        assert_eq!(config.publish_interval, Duration::from_secs(2));
    }

    #[test]
    fn unparseable_port_is_rejected() {
        let err = DeviceConfig::from_lookup(lookup(&[
            ("TAGO_MQTT_USERNAME", "token"),
            ("TAGO_MQTT_PASSWORD", "secret"),
            ("TAGO_MQTT_PORT", "tls"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { name, .. } if name == "TAGO_MQTT_PORT"));
    }
}
