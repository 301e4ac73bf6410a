//! Configuration for the pairing gateway.

use crate::pairing::PairingSettings;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Protocol bridge configuration
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Session storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Pairing orchestration configuration
    #[serde(default)]
    pub pairing: PairingConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Protocol bridge REST API URL
    #[serde(default = "default_bridge_api_url")]
    pub api_url: String,

    /// Per-request timeout against the bridge. This is also what bounds an
    /// unresolved pairing-code request; the gateway imposes no further
    /// end-to-end deadline.
    #[serde(with = "humantime_serde", default = "default_bridge_timeout")]
    pub request_timeout: Duration,

    /// How often open sessions poll the bridge for lifecycle events
    #[serde(with = "humantime_serde", default = "default_events_poll_interval")]
    pub events_poll_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory under which one directory per number is created
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairingConfig {
    /// Delay between a successful open and session-directory removal
    #[serde(with = "humantime_serde", default = "default_cleanup_grace")]
    pub cleanup_grace: Duration,

    /// Close the client proactively once cleanup is done
    #[serde(default)]
    pub close_after_cleanup: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm")]
    pub global_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_url: default_bridge_api_url(),
            request_timeout: default_bridge_timeout(),
            events_poll_interval: default_events_poll_interval(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            cleanup_grace: default_cleanup_grace(),
            close_after_cleanup: false,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bridge_api_url() -> String {
    "http://mdproto-bridge:8080".into()
}

fn default_bridge_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_events_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_storage_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8000
}

fn default_cleanup_grace() -> Duration {
    Duration::from_secs(2)
}

fn default_global_rpm() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl PairingConfig {
    pub fn settings(&self) -> PairingSettings {
        PairingSettings {
            cleanup_grace: self.cleanup_grace,
            close_after_cleanup: self.close_after_cleanup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.root, PathBuf::from("."));
        assert_eq!(config.pairing.cleanup_grace, Duration::from_secs(2));
        assert!(!config.pairing.close_after_cleanup);
        assert_eq!(config.rate_limit.global_per_minute, 10);
    }

    #[test]
    fn test_humantime_durations() {
        let config: Config = serde_json::from_str(
            r#"{"pairing": {"cleanup_grace": "500ms"},
                "bridge": {"request_timeout": "1m", "events_poll_interval": "100ms"}}"#,
        )
        .unwrap();

        assert_eq!(config.pairing.cleanup_grace, Duration::from_millis(500));
        assert_eq!(config.bridge.request_timeout, Duration::from_secs(60));
        assert_eq!(
            config.bridge.events_poll_interval,
            Duration::from_millis(100)
        );
    }
}
