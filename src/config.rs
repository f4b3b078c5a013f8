//! JSON configuration file.
//!
//! Stored at `<config dir>/multi-overlay/config.json` (e.g.
//! `~/Library/Application Support/multi-overlay/config.json` on macOS).
//! Every field has a default; a missing or unreadable file yields defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::controller::ShowPolicy;
use crate::listener::BackoffConfig;
use crate::model::constants::*;

/// Serializable config structure for JSON persistence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Whether showing one overlay hides the others.
    pub show_policy: ShowPolicy,
    /// Fallback log level when `RUST_LOG` is not set.
    pub log_level: String,
    pub tick_interval_ms: u64,
    pub liveness_interval_ms: u64,
    pub backoff: BackoffConfig,
    pub load_stall_warn_ms: u64,
    /// Overrides `<config dir>/overlays` as the custom descriptor directory.
    pub custom_overlay_dir: Option<PathBuf>,
    /// Overrides the bundled resources directory (logos, status bar icon).
    pub resource_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            show_policy: ShowPolicy::default(),
            log_level: "info".to_string(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            liveness_interval_ms: DEFAULT_LIVENESS_INTERVAL_MS,
            backoff: BackoffConfig::default(),
            load_stall_warn_ms: DEFAULT_LOAD_STALL_WARN_MS,
            custom_overlay_dir: None,
            resource_dir: None,
        }
    }
}

impl AppConfig {
    /// Load config from JSON file, returning defaults if not found or invalid.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring invalid config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms)
    }

    pub fn load_stall_warn(&self) -> Duration {
        Duration::from_millis(self.load_stall_warn_ms)
    }
}

/// Where the app keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub state_dir: PathBuf,
    pub overlays_dir: PathBuf,
    /// Read-only resources shipped with the app.
    pub resources_dir: PathBuf,
}

impl AppPaths {
    /// Paths under the platform config directory, falling back to the
    /// working directory when the platform reports none.
    pub fn resolve() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        let mut paths = Self::under(base.join(APP_DIR_NAME));
        if let Some(resources) = std::env::current_exe()
            .ok()
            .and_then(|exe| resources_for_executable(&exe))
        {
            paths.resources_dir = resources;
        }
        paths
    }

    pub fn under(config_dir: PathBuf) -> Self {
        Self {
            config_file: config_dir.join("config.json"),
            state_dir: config_dir.join("state"),
            overlays_dir: config_dir.join("overlays"),
            resources_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources"),
            config_dir,
        }
    }

    /// Use `file` instead of the default config file.
    pub fn with_config_file(mut self, file: PathBuf) -> Self {
        self.config_file = file;
        self
    }

    /// Custom overlay directory, honouring the config override.
    pub fn custom_overlays(&self, config: &AppConfig) -> PathBuf {
        config
            .custom_overlay_dir
            .clone()
            .unwrap_or_else(|| self.overlays_dir.clone())
    }

    /// Directory holding the built-in overlay logos.
    pub fn icons(&self, config: &AppConfig) -> PathBuf {
        config
            .resource_dir
            .as_deref()
            .unwrap_or(&self.resources_dir)
            .join("images")
    }
}

/// `Contents/Resources` when `exe` runs from an app bundle, otherwise a
/// `resources` directory next to it if one exists.
fn resources_for_executable(exe: &Path) -> Option<PathBuf> {
    let dir = exe.parent()?;
    if dir.file_name().is_some_and(|name| name == "MacOS") {
        return dir.parent().map(|contents| contents.join("Resources"));
    }
    let beside = dir.join("resources");
    beside.is_dir().then_some(beside)
}
