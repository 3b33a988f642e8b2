//! Configuration management for autolabel.
//!
//! Configuration is loaded from the platform config directory (or an explicit
//! path) with sensible defaults for every field.

mod types;
mod validate;

pub use types::*;

use crate::caption::Caption;
use crate::error::{CaptionError, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for autolabel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Class prompt settings
    pub prompt: PromptConfig,

    /// Detector settings
    pub detector: DetectorConfig,

    /// Image source settings
    pub dataset: DatasetConfig,

    /// Export settings
    pub export: ExportConfig,

    /// Processing settings
    pub processing: ProcessingConfig,

    /// Retry settings
    pub pipeline: PipelineConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.autolabel.autolabel/config.toml
    /// - Linux: ~/.config/autolabel/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\autolabel\config\config.toml
    ///
    /// Falls back to ~/.autolabel/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "autolabel", "autolabel")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".autolabel").join("config.toml")
            })
    }

    /// Build the detector caption from the class list.
    pub fn caption(&self) -> Result<Caption, CaptionError> {
        Caption::from_classes(&self.prompt.class_list)
    }

    /// Get the resolved image directory (with ~ expansion).
    pub fn image_directory(&self) -> PathBuf {
        expand(&self.dataset.image_directory)
    }

    /// Get the resolved export directory (with ~ expansion).
    pub fn export_dir(&self) -> PathBuf {
        expand(&self.export.dir)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}
