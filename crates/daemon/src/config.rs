// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: paths plus the settings file.

use drender_engine::RuntimeConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot determine state directory (set DRENDER_STATE_DIR)")]
    NoStateDir,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Daemon paths and settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/drender)
    pub state_dir: PathBuf,
    /// Path to the control socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Parsed settings file
    pub settings: Settings,
}

/// Contents of `config.toml`. Every field has a default, so a missing
/// file yields a runnable local configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub cloud: CloudSettings,
    pub timers: TimerSettings,
}

/// Broker credentials and coordinates. The host comes from the START
/// request; port and queue have protocol defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    pub port: u16,
    pub queue: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            port: drender_core::DEFAULT_BROKER_PORT,
            queue: drender_core::DRIVER_FRAME_QUEUE.to_string(),
            username: None,
            password: None,
        }
    }
}

/// Cloud endpoints and the software catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CloudSettings {
    /// Resource-service endpoint for machine provisioning
    pub resource_url: String,
    /// Storage-service endpoint for buckets and existence checks
    pub storage_url: String,
    /// Worker control/status port
    pub worker_port: u16,
    /// Software package tag -> machine image
    pub ami: HashMap<String, String>,
    /// Bounded pool size for blocking cloud work
    pub parallelism: usize,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            resource_url: "http://127.0.0.1:9100".to_string(),
            storage_url: "http://127.0.0.1:9200".to_string(),
            worker_port: 8080,
            ami: HashMap::new(),
            parallelism: 10,
        }
    }
}

/// Intervals and timeouts, in seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimerSettings {
    pub heartbeat_secs: u64,
    pub probe_timeout_secs: u64,
    pub sweep_secs: u64,
    pub spawn_timeout_secs: u64,
    pub restart_timeout_secs: u64,
    pub terminate_timeout_secs: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            heartbeat_secs: 15,
            probe_timeout_secs: 30,
            sweep_secs: 10,
            spawn_timeout_secs: 8 * 60,
            restart_timeout_secs: 5 * 60,
            terminate_timeout_secs: 8 * 60,
        }
    }
}

impl Settings {
    /// Project the settings into the engine's tuning knobs.
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            heartbeat_interval: Duration::from_secs(self.timers.heartbeat_secs),
            probe_timeout: Duration::from_secs(self.timers.probe_timeout_secs),
            sweep_interval: Duration::from_secs(self.timers.sweep_secs),
            spawn_timeout: Duration::from_secs(self.timers.spawn_timeout_secs),
            restart_timeout: Duration::from_secs(self.timers.restart_timeout_secs),
            terminate_timeout: Duration::from_secs(self.timers.terminate_timeout_secs),
            cloud_parallelism: self.cloud.parallelism,
            ami_catalog: self.cloud.ami.clone(),
        }
    }
}

impl Config {
    /// Load configuration from the state directory.
    ///
    /// `$DRENDER_STATE_DIR` overrides the default
    /// `$XDG_STATE_HOME/drender` (or `~/.local/state/drender`).
    /// `config.toml` in that directory is optional.
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = match std::env::var_os("DRENDER_STATE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::state_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join(".local/state")))
                .ok_or(ConfigError::NoStateDir)?
                .join("drender"),
        };
        Self::load_from(state_dir)
    }

    /// Load configuration rooted at an explicit state directory.
    pub fn load_from(state_dir: PathBuf) -> Result<Self, ConfigError> {
        let settings_path = state_dir.join("config.toml");
        let settings = if settings_path.exists() {
            let text = std::fs::read_to_string(&settings_path).map_err(|source| {
                ConfigError::Read {
                    path: settings_path.clone(),
                    source,
                }
            })?;
            toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: settings_path,
                source,
            })?
        } else {
            Settings::default()
        };

        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            state_dir,
            settings,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
