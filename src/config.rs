//! Node configuration.
//!
//! Every tunable lives in [`NodeConfig`]. The firmware starts from
//! [`NodeConfig::default`] and, when the `RADTHING_CONFIG` environment
//! variable held a JSON document at build time, overlays it with
//! [`NodeConfig::from_json`]. Nothing is persisted on the device.

use serde::{Deserialize, Serialize};

use crate::adapters::utils::{is_printable_ascii, is_topic_level};
use crate::app::ports::BrokerEndpoint;
use crate::connectivity::RetryPolicy;
use crate::error::ConfigError;

/// WiFi station credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub ssid: String,
    /// Empty for open networks.
    pub passphrase: String,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: "my-ssid".into(),
            passphrase: "my-wifi-password".into(),
        }
    }
}

/// MQTT broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// IP address or resolvable host name.
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// MQTT client id. Empty means "use the device id".
    pub client_id: String,
    pub keep_alive_secs: u16,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "10.0.0.2".into(),
            port: 1883,
            username: "this-device".into(),
            password: "my-mqtt-password".into(),
            client_id: String::new(),
            keep_alive_secs: 60,
        }
    }
}

/// Identity presented to the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Topic-safe device id; prefixes every unique id and entity name.
    pub id: String,
    /// Human-readable device name shown by the hub.
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub firmware_version: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            id: "esp8266thing".into(),
            name: "RadiationWatcher".into(),
            manufacturer: "Sparkfun".into(),
            model: "ESP8266 Thing Dev".into(),
            firmware_version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub wifi: WifiConfig,
    pub broker: BrokerConfig,
    pub device: DeviceConfig,
    pub retry: RetryPolicy,

    // --- Timing ---
    /// Liveness + diagnostics report interval (seconds).
    pub report_interval_secs: u32,
    /// Pause between discovery passes that left records pending (milliseconds).
    pub discovery_retry_ms: u32,
    /// Idle pause at the end of each poll cycle (milliseconds).
    pub loop_idle_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            wifi: WifiConfig::default(),
            broker: BrokerConfig::default(),
            device: DeviceConfig::default(),
            retry: RetryPolicy::default(),
            report_interval_secs: 300, // 5 min
            discovery_retry_ms: 1_000,
            loop_idle_ms: 10,
        }
    }
}

/// JSON overlay baked in at build time, if any.
pub const BUILD_CONFIG: Option<&str> = option_env!("RADTHING_CONFIG");

impl NodeConfig {
    /// Defaults, overlaid with [`BUILD_CONFIG`] when present, then validated.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match BUILD_CONFIG {
            Some(doc) => Self::from_json(doc)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document. Missing keys keep their defaults.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(doc).map_err(|_| ConfigError::Malformed)
    }

    /// Range-check every field. The first violation wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg| Err(ConfigError::ValidationFailed(msg));

        let ssid = self.wifi.ssid.as_str();
        if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
            return fail("wifi.ssid must be 1-32 printable ASCII bytes");
        }
        let pass_len = self.wifi.passphrase.len();
        if pass_len != 0 && !(8..=64).contains(&pass_len) {
            return fail("wifi.passphrase must be empty or 8-64 bytes");
        }
        if self.broker.host.trim().is_empty() {
            return fail("broker.host must be set");
        }
        if self.broker.port == 0 {
            return fail("broker.port must be non-zero");
        }
        if !is_topic_level(&self.device.id) {
            return fail("device.id must be a single topic level");
        }
        if self.device.name.is_empty() {
            return fail("device.name must be set");
        }
        if let Some(msg) = self.retry.first_zero_field() {
            return fail(msg);
        }
        if self.discovery_retry_ms == 0 {
            return fail("discovery_retry_ms must be non-zero");
        }
        if !(60..=3_600).contains(&self.report_interval_secs) {
            return fail("report_interval_secs must be 60-3600");
        }
        Ok(())
    }

    /// Broker endpoint with the client id resolved.
    pub fn broker_endpoint(&self) -> BrokerEndpoint {
        let client_id = if self.broker.client_id.is_empty() {
            self.device.id.clone()
        } else {
            self.broker.client_id.clone()
        };
        BrokerEndpoint {
            host: self.broker.host.clone(),
            port: self.broker.port,
            client_id,
            username: self.broker.username.clone(),
            password: self.broker.password.clone(),
            keep_alive_secs: self.broker.keep_alive_secs,
        }
    }
}
