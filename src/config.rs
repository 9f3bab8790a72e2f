//! Application paths and persisted settings.
//!
//! Path priority:
//! 1. CLI `--config-dir` argument
//! 2. `TERRAPLAY_CONFIG_DIR` environment variable
//! 3. Local folder IF any config files exist (terraplay.json, terraplay.log)
//! 4. Platform-specific directory from dirs-next (default)
//!
//! Platform paths:
//! - Linux: ~/.config/terraplay/{name}, ~/.local/share/terraplay/{name}
//! - macOS: ~/Library/Application Support/terraplay/{name}
//! - Windows: %APPDATA%\terraplay\{name}

use crate::core::sequencer::DEFAULT_FRAME_DURATION_MS;
use crate::viewer::{Spectrum, SpectrumCatalog};
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "terraplay";
pub const SETTINGS_FILE: &str = "terraplay.json";
pub const LOG_FILE: &str = "terraplay.log";
pub const CONFIG_DIR_ENV: &str = "TERRAPLAY_CONFIG_DIR";

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV var → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        Self { config_dir }
    }
}

/// Get path to a configuration file
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::config_dir()).join(name)
}

/// Get path to a data file (logs)
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::data_dir()).join(name)
}

/// Ensure that configuration and data directories exist
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = resolve_dir(config, dirs_next::config_dir());
    let data_dir = resolve_dir(config, dirs_next::data_dir());

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
    }

    // Only create data_dir if it's different from config_dir
    if data_dir != config_dir && !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }

    Ok(())
}

fn has_local_config_files(dir: &Path) -> bool {
    [SETTINGS_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

fn resolve_dir(config: &PathConfig, platform_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir() {
        if has_local_config_files(&current_dir) {
            return current_dir;
        }
    }

    match platform_dir {
        Some(dir) => dir.join(APP_NAME),
        None => PathBuf::from("."),
    }
}

/// Persisted viewer settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Time each year stays on screen during playback
    pub frame_duration_ms: f64,
    /// Refresh loop rate of the headless runner
    pub refresh_hz: u32,
    /// Directory holding `imgs/` and `outputs/`
    pub assets_dir: PathBuf,
    pub default_spectrum: String,
    pub spectra: Vec<Spectrum>,

    pub api_server_enabled: bool,
    pub api_server_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frame_duration_ms: DEFAULT_FRAME_DURATION_MS,
            refresh_hz: 60,
            assets_dir: PathBuf::from("public"),
            default_spectrum: "modis".to_string(),
            spectra: SpectrumCatalog::default().iter().cloned().collect(),
            api_server_enabled: false,
            api_server_port: 9876,
        }
    }
}

impl Settings {
    /// Load settings; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings: {}", path.display()))?;
        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Validated spectrum catalog built from `spectra`.
    pub fn catalog(&self) -> Result<SpectrumCatalog> {
        SpectrumCatalog::new(self.spectra.clone()).context("Invalid spectrum list in settings")
    }
}
