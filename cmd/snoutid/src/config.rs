//! CLI configuration, stored in ~/.snoutid/config.yaml.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snoutid_noseprint::ModelId;

/// Base configuration directory name under the home directory.
pub const DEFAULT_BASE_DIR: &str = ".snoutid";
/// Configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Profile database path, relative to the base directory.
pub const DEFAULT_DATABASE: &str = "data/profiles.redb";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Profile database file. Empty means `~/.snoutid/data/profiles.redb`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub database: String,

    /// Registered noseprint model id.
    #[serde(default = "default_model")]
    pub model: String,

    /// Default tracing filter when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path the config was loaded from (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

fn default_model() -> String {
    ModelId::LUMA_GRID_128.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: String::new(),
            model: default_model(),
            log_level: default_log_level(),
            config_path: PathBuf::new(),
        }
    }
}

impl Config {
    /// Gets the default base directory.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR))
    }

    /// Gets the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_dir().map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Resolves the profile database path.
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        if !self.database.is_empty() {
            return Ok(PathBuf::from(&self.database));
        }
        Self::default_dir()
            .map(|dir| dir.join(DEFAULT_DATABASE))
            .ok_or_else(|| anyhow::anyhow!("cannot determine database path"))
    }
}

/// Loads configuration, creating the file with defaults if it is missing.
pub fn load_config(custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Config::default_config_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    // Ensure config directory exists
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cfg: Config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        serde_yaml::from_str(&content)?
    } else {
        let cfg = Config::default();
        std::fs::write(&config_path, serde_yaml::to_string(&cfg)?)?;
        cfg
    };

    cfg.config_path = config_path;
    Ok(cfg)
}
