//! Daemon configuration.
//!
//! Loaded from `~/.config/notifyd/config.toml`; a commented default file is
//! written on first run. Timeout defaults are policy, not code: change them
//! here, not in the scheduler.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::expiry::TimeoutPolicy;

/// Default config written on first run.
pub const DEFAULT_CONFIG_TOML: &str = "\
# notifyd configuration

[timeouts]
# Default expiration per urgency, in milliseconds. 0 means never expire.
# Callers can override per notification with an explicit expire_timeout.
low_ms = 5000
normal_ms = 10000
critical_ms = 0

[state]
# Where the active-notification snapshot is written for the renderer.
# Defaults to $XDG_RUNTIME_DIR/notifyd/notifications.json when unset.
#path = \"/run/user/1000/notifyd/notifications.json\"
";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timeouts: Timeouts,
    pub state: StateConfig,
}

/// Urgency timeout defaults, in milliseconds. 0 = never expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub low_ms: u64,
    pub normal_ms: u64,
    pub critical_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            low_ms: 5_000,
            normal_ms: 10_000,
            critical_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Snapshot file path override.
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load from a TOML file.
    pub fn load(path: &std::path::Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Parse from TOML string.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("parse TOML: {e}"))
    }

    /// Load the config from the config directory, creating the default file
    /// if it doesn't exist.
    pub fn load_default() -> Result<Self, String> {
        let path = default_config_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| format!("create config dir: {e}"))?;
            }
            std::fs::write(&path, DEFAULT_CONFIG_TOML)
                .map_err(|e| format!("write default config: {e}"))?;
            eprintln!("Created default config: {}", path.display());
        }
        Self::load(&path)
    }

    pub fn timeout_policy(&self) -> TimeoutPolicy {
        fn millis(ms: u64) -> Option<Duration> {
            (ms > 0).then(|| Duration::from_millis(ms))
        }
        TimeoutPolicy {
            low: millis(self.timeouts.low_ms),
            normal: millis(self.timeouts.normal_ms),
            critical: millis(self.timeouts.critical_ms),
        }
    }

    /// Effective snapshot path: config override or the runtime-dir default.
    pub fn state_path(&self) -> PathBuf {
        self.state.path.clone().unwrap_or_else(default_state_path)
    }
}

/// Path to the config TOML file.
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

fn config_dir() -> PathBuf {
    if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(config).join("notifyd")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".config/notifyd")
    } else {
        PathBuf::from("/tmp/notifyd")
    }
}

/// Default location of the published snapshot.
pub fn default_state_path() -> PathBuf {
    let dir = if let Some(runtime) = std::env::var_os("XDG_RUNTIME_DIR") {
        PathBuf::from(runtime).join("notifyd")
    } else {
        PathBuf::from("/tmp/notifyd")
    };
    dir.join("notifications.json")
}
