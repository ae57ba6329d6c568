//! Where the host keeps its config and logs.
//!
//! # Resolution order
//! 1. `BRIDGE_CONFIG_DIR` (also read from a `.env` file, see [`load_dotenv`])
//! 2. Platform config dir + `php-bridge`
//!    - **Linux**: `$XDG_CONFIG_HOME/php-bridge` or `~/.config/php-bridge`
//!    - **macOS**: `~/Library/Application Support/php-bridge`
//!    - **Windows**: `%APPDATA%/php-bridge`

use crate::error::HostError;

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::path::PathBuf;

use log::{debug, info, warn};

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "BRIDGE_CONFIG_DIR";

const APP_DIR_NAME: &str = "php-bridge";
const LOG_DIR_NAME: &str = "logs";

/// How the config directory was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    EnvVar,
    PlatformDefault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
    pub source: PathSource,
}

impl HostPaths {
    fn under(config_dir: PathBuf, source: PathSource) -> Self {
        Self {
            log_dir: config_dir.join(LOG_DIR_NAME),
            config_dir,
            source,
        }
    }
}

/// Load `.env` from the current directory, then from next to the executable.
///
/// Returns the file that was loaded, if any. A missing file is not an error.
pub fn load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        return Some(path);
    }

    let exe_dir = env::current_exe().ok()?.parent()?.to_path_buf();
    let env_path = exe_dir.join(".env");
    if !env_path.exists() {
        return None;
    }

    match dotenvy::from_path(&env_path) {
        Ok(()) => Some(env_path),
        Err(e) => {
            warn!("Failed to parse .env at {:?}: {}", env_path, e);
            None
        }
    }
}

/// Resolve the config and log directories.
///
/// # Errors
///
/// Returns [`HostError::Host`] if neither the override nor a platform config
/// directory is available.
pub fn resolve() -> Result<HostPaths, HostError> {
    resolve_from(env::var_os(CONFIG_DIR_ENV).map(PathBuf::from))
}

/// Resolution with the override passed in rather than read from the
/// environment.
pub fn resolve_from(override_dir: Option<PathBuf>) -> Result<HostPaths, HostError> {
    if let Some(config_dir) = override_dir.filter(|dir| !dir.as_os_str().is_empty()) {
        info!("Using {CONFIG_DIR_ENV} override: {:?}", config_dir);
        return Ok(HostPaths::under(config_dir, PathSource::EnvVar));
    }

    match dirs::config_dir() {
        Some(base) => {
            let config_dir = base.join(APP_DIR_NAME);
            debug!("Platform config dir: {:?}", config_dir);
            Ok(HostPaths::under(config_dir, PathSource::PlatformDefault))
        }
        None => Err(HostError::Host {
            message: format!("No config directory found; set {CONFIG_DIR_ENV}"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}
