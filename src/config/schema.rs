//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! coordinator and its demo host. All types derive Serde traits for
//! deserialization from config files.

use serde::{Deserialize, Serialize};

/// Environment variable that overrides `store.connection_string`.
pub const CONNECTION_STRING_ENV: &str = "MONGODB_CONNECTION_STRING";

/// Connection string used when neither the file nor the environment set one.
pub const DEFAULT_CONNECTION_STRING: &str = "mongodb://localhost:27017";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct SctcConfig {
    /// Host listener configuration.
    pub listener: ListenerConfig,

    /// Data store connection settings.
    pub store: StoreConfig,

    /// Real-time transport settings.
    pub transport: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl SctcConfig {
    /// Apply the connection-string override, if one was supplied.
    ///
    /// Called once at startup with the value read from
    /// [`CONNECTION_STRING_ENV`]; acquisition never consults the environment.
    pub fn with_connection_override(mut self, value: Option<String>) -> Self {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.store.connection_string = value;
        }
        self
    }

    /// Resolve the override from the process environment.
    pub fn resolve_env(self) -> Self {
        let value = std::env::var(CONNECTION_STRING_ENV).ok();
        self.with_connection_override(value)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Data store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Connection string, e.g. `mongodb://db.internal:27017`.
    pub connection_string: String,

    /// Upper bound on a single connection attempt, enforced by the connector.
    pub connect_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            connection_string: DEFAULT_CONNECTION_STRING.to_string(),
            connect_timeout_secs: 30,
        }
    }
}

/// Real-time transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// Path under which WebSocket upgrades are accepted.
    pub path: String,

    /// Capacity of the inbound and outbound broadcast channels.
    pub channel_capacity: usize,

    /// Largest accepted text frame, in bytes.
    pub max_message_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            path: "/socket.io".to_string(),
            channel_capacity: 256,
            max_message_bytes: 64 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
