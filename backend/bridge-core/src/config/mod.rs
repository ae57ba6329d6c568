use crate::error::config::ConfigError;
use crate::facade::probe::ConnectionProbe;
use crate::{BRIDGE_LOOPBACK_HOST, DEFAULT_WINDOW_PORT};

use common::ErrorLocation;

use std::net::IpAddr;
use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "bridge.json";
const CONFIG_VERSION: u32 = 1;

const MAX_PROBE_ATTEMPTS: u32 = 100;
const MAX_ATTEMPT_TIMEOUT_MS: u64 = 60_000;
const MAX_CONNECT_ELAPSED_MS: u64 = 300_000;

// ============================================
// CONFIG STRUCTS
// ============================================

/// Connectivity probe run by the consuming side before its first call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
        }
    }
}

impl ProbeConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn connection_probe(&self) -> ConnectionProbe {
        ConnectionProbe::new(self.max_attempts, self.attempt_timeout())
    }
}

/// Loopback WebSocket used by window-style channels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// 0 lets the OS pick a free port.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_max_elapsed_ms")]
    pub connect_max_elapsed_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_max_elapsed_ms: default_connect_max_elapsed_ms(),
        }
    }
}

impl WindowConfig {
    /// How long [`crate::channel::connect_window`] keeps retrying.
    pub fn connect_max_elapsed(&self) -> Duration {
        Duration::from_millis(self.connect_max_elapsed_ms)
    }

    /// Rejects anything that is not a loopback address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let is_loopback = self
            .host
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false);

        if !is_loopback {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Window host must be a loopback address, got {}", self.host),
            });
        }

        if self.connect_max_elapsed_ms == 0 || self.connect_max_elapsed_ms > MAX_CONNECT_ELAPSED_MS {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid connect_max_elapsed_ms: {} (must be 1-{MAX_CONNECT_ELAPSED_MS})",
                    self.connect_max_elapsed_ms
                ),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BridgeConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub window: WindowConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            probe: ProbeConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_max_attempts() -> u32 {
    10
}
fn default_attempt_timeout_ms() -> u64 {
    200
}
fn default_host() -> String {
    BRIDGE_LOOPBACK_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_WINDOW_PORT
}
fn default_connect_max_elapsed_ms() -> u64 {
    5_000
}

// ============================================
// IMPLEMENTATION
// ============================================

impl BridgeConfig {
    /// Load config from {config_dir}/bridge.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(BridgeConfig)` if loaded successfully or defaults if file missing.
    /// Returns `Err(ConfigError)` if file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Bridge config not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read bridge config: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: BridgeConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse bridge config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Bridge config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/bridge.json using atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - Validation fails
    /// - Directory creation fails
    /// - Serialization fails
    /// - Write or rename fails
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        // Atomic rename (POSIX guarantees atomicity)
        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Bridge config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if self.probe.max_attempts == 0 || self.probe.max_attempts > MAX_PROBE_ATTEMPTS {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid probe max_attempts: {} (must be 1-{MAX_PROBE_ATTEMPTS})",
                    self.probe.max_attempts
                ),
            });
        }

        if self.probe.attempt_timeout_ms == 0 || self.probe.attempt_timeout_ms > MAX_ATTEMPT_TIMEOUT_MS
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid probe attempt_timeout_ms: {} (must be 1-{MAX_ATTEMPT_TIMEOUT_MS})",
                    self.probe.attempt_timeout_ms
                ),
            });
        }

        self.window.validate()
    }
}
