use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{BridgeError, Result};

pub const DEFAULT_SOCKET_HOST: &str = "127.0.0.1";
pub const DEFAULT_SOCKET_PORT: u16 = 1445;
pub const DEFAULT_SOCKET_SECRET: &str = "youshouldchangethis";
pub const DEFAULT_MQTT_HOSTNAME: &str = "127.0.0.1";
pub const DEFAULT_MQTT_PORT: u16 = 1883;
pub const DEFAULT_MQTT_KEEP_ALIVE_SECS: u16 = 60;

/// Process-wide configuration. Loaded once at startup and never mutated.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BridgeConfig {
    pub debug: bool,
    pub socket: SocketConfig,
    pub mqtt: MqttConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SocketConfig {
    pub host: String,
    pub port: u16,
    pub secret: String,
    /// Maximum simultaneously open connections; 0 means unlimited.
    pub max_connections: usize,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SOCKET_HOST.to_string(),
            port: DEFAULT_SOCKET_PORT,
            secret: DEFAULT_SOCKET_SECRET.to_string(),
            max_connections: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MqttConfig {
    /// Reserved; carried through but not applied to topics.
    pub namespace: String,
    pub hostname: String,
    pub port: u16,
    pub client_id: Option<String>,
    pub keep_alive_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            hostname: DEFAULT_MQTT_HOSTNAME.to_string(),
            port: DEFAULT_MQTT_PORT,
            client_id: None,
            keep_alive_secs: DEFAULT_MQTT_KEEP_ALIVE_SECS,
        }
    }
}

impl MqttConfig {
    pub fn uri(&self) -> String {
        format!("mqtt://{}:{}", self.hostname, self.port)
    }
}

impl BridgeConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("Failed to read config file: {}", e)))?;

        let config: BridgeConfig = toml::from_str(&content)
            .map_err(|e| BridgeError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a key lookup. Unset and empty values
    /// both fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let defaults = SocketConfig::default();
        let mqtt_defaults = MqttConfig::default();

        Ok(Self {
            debug: get("DEBUG").map(|v| parse_flag(&v)).unwrap_or(false),
            socket: SocketConfig {
                host: get("SOCKET_HOST").unwrap_or(defaults.host),
                port: parse_or("SOCKET_PORT", get("SOCKET_PORT"), defaults.port)?,
                secret: get("SOCKET_SECRET").unwrap_or(defaults.secret),
                max_connections: parse_or(
                    "SOCKET_MAX_CONNECTIONS",
                    get("SOCKET_MAX_CONNECTIONS"),
                    defaults.max_connections,
                )?,
            },
            mqtt: MqttConfig {
                namespace: get("MQTT_NAMESPACE").unwrap_or(mqtt_defaults.namespace),
                hostname: get("MQTT_HOSTNAME").unwrap_or(mqtt_defaults.hostname),
                port: parse_or("MQTT_PORT", get("MQTT_PORT"), mqtt_defaults.port)?,
                client_id: get("MQTT_CLIENT_ID"),
                keep_alive_secs: parse_or(
                    "MQTT_KEEP_ALIVE_SECS",
                    get("MQTT_KEEP_ALIVE_SECS"),
                    mqtt_defaults.keep_alive_secs,
                )?,
            },
        })
    }

    /// Bind address in `host:port` form.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.socket.host, self.socket.port)
    }

    pub fn mqtt_uri(&self) -> String {
        self.mqtt.uri()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| BridgeError::Config(format!("Invalid value for {}: '{}'", key, raw))),
        None => Ok(default),
    }
}
