//! Transport configuration
//!
//! Connection parameters for the encrypted broker session. Defaults follow
//! the production deployment: TLS on port 8883, ten-second connect timeout,
//! `{prefix}/data/{device_id}` topics.

use std::time::Duration;

/// Default broker TLS port.
pub const DEFAULT_PORT: u16 = 8883;

/// Default bound on how long `connect` waits for the handshake result.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default MQTT keep-alive interval.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Default topic prefix; data topics are `{prefix}/data/{device_id}`.
pub const DEFAULT_TOPIC_PREFIX: &str = "tago";

/// Broker connection parameters.
///
/// Credentials are required: their presence is checked at startup by the
/// device configuration layer, before any connection attempt.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Broker hostname
    pub host: String,
    /// Broker port (TLS)
    pub port: u16,
    /// Broker username
    pub username: String,
    /// Broker password
    pub password: String,
    /// Client identifier presented to the broker
    pub client_id: String,
    /// MQTT keep-alive interval
    pub keep_alive: Duration,
    /// Topic prefix for outbound data
    pub topic_prefix: String,
    /// Bound on the connect handshake wait
    pub connect_timeout: Duration,
}

impl TransportConfig {
    /// Configuration with production defaults.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: password.into(),
            client_id: "telesim".into(),
            keep_alive: DEFAULT_KEEP_ALIVE,
            topic_prefix: DEFAULT_TOPIC_PREFIX.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the broker port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the client identifier.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Set the keep-alive interval.
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Set the topic prefix.
    pub fn topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topic_prefix = prefix.into();
        self
    }

    /// Set the connect handshake timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Data topic for a device: `{prefix}/data/{device_id}`.
    pub fn data_topic(&self, device_id: &str) -> String {
        format!("{}/data/{}", self.topic_prefix, device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_defaults() {
        let config = TransportConfig::new("mqtt.tago.io", "token", "secret")
            .client_id("device_001")
            .connect_timeout(Duration::from_secs(5));

        assert_eq!(config.port, 8883);
        assert_eq!(config.keep_alive, Duration::from_secs(60));
        assert_eq!(config.client_id, "device_001");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn data_topic_shape() {
        let config = TransportConfig::new("mqtt.tago.io", "token", "secret");
        assert_eq!(config.data_topic("device_001"), "tago/data/device_001");

        let config = config.topic_prefix("sensors");
        assert_eq!(config.data_topic("abc"), "sensors/data/abc");
    }
}
