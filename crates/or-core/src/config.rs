//! Configuration system for the oxidized-retro frontend

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::av::HwContextType;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub general: GeneralConfig,
    pub video: VideoConfig,
    pub paths: PathConfig,
    /// Core option key/value pairs answered through GET_VARIABLE.
    pub variables: BTreeMap<String, String>,
}

/// General frontend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Pace `run` calls to the core's reported frame rate
    pub throttle: bool,
}

/// Video negotiation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct VideoConfig {
    /// Hardware context type offered to cores that ask; `none` keeps the
    /// session software-rendered
    pub preferred_hw_context: HwContextType,
    pub hw_depth: bool,
    pub hw_stencil: bool,
    pub hw_debug: bool,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub system_dir: PathBuf,
    pub save_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { throttle: true }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oxidized-retro");

        Self {
            system_dir: base.join("system"),
            save_dir: base.join("saves"),
        }
    }
}

impl PathConfig {
    /// Create the system and save directories if they are missing, so the
    /// environment dispatcher always hands the core a real path.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.system_dir)?;
        std::fs::create_dir_all(&self.save_dir)
    }
}

impl Config {
    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::config_path();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oxidized-retro")
            .join("config.toml")
    }
}
