//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::security::HostAllowList;

/// Root configuration for the origin guard server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Origin validation settings.
    pub origin: OriginConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Which validator guards the WebSocket route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginMode {
    /// Fixed `allowed_origins` pattern list. Changes need a restart.
    Patterns,
    /// `allowed_hosts` plus `debug` bypass. Reloaded at runtime.
    #[default]
    AllowedHosts,
}

/// Origin validation configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    pub mode: OriginMode,

    /// Origin patterns: `*`, `host`, `.host`, `scheme://host[:port]`.
    pub allowed_origins: Vec<String>,

    /// Host patterns trusted for any scheme and port.
    pub allowed_hosts: Vec<String>,

    /// Trust loopback origins (localhost, 127.0.0.1, [::1]).
    pub debug: bool,
}

impl OriginConfig {
    /// Allow-list view of this configuration.
    pub fn host_allow_list(&self) -> HostAllowList {
        HostAllowList::new(self.allowed_hosts.clone(), self.debug)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
