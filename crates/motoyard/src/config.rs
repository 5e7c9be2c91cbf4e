//! Configuration management for motoyard.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::HashSet;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "motoyard";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "yard.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `MOTOYARD_`)
/// 2. TOML config file at `~/.config/motoyard/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Storage key layout.
    pub keys: KeyLayout,
    /// Status transition configuration.
    pub status: StatusConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/motoyard/yard.db`
    pub database_path: Option<PathBuf>,
}

/// Names of the keys vehicle records are stored under.
///
/// Historical builds wrote records under different keys and in different
/// shapes, so lookups walk all of them in [`KeyLayout::candidates`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyLayout {
    /// Key holding the last registered vehicle as a single object.
    pub single: String,
    /// Key holding the list of registered vehicles.
    pub list: String,
    /// Older key names still checked on lookup.
    pub legacy: Vec<String>,
}

/// Status-transition configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Case-insensitive fragments marking a status as maintenance.
    pub maintenance_keywords: Vec<String>,
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self {
            single: "dadosMoto".to_string(),
            list: "motos".to_string(),
            legacy: vec!["listaMotos".to_string(), "moto".to_string()],
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            maintenance_keywords: default_maintenance_keywords(),
        }
    }
}

/// Default fragments identifying a maintenance status.
fn default_maintenance_keywords() -> Vec<String> {
    vec![
        "manuten".to_string(),
        "maintenance".to_string(),
        "reparo".to_string(),
        "repair".to_string(),
    ]
}

impl KeyLayout {
    /// All keys in lookup order: single, list, then legacy keys.
    #[must_use]
    pub fn candidates(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(2 + self.legacy.len());
        keys.push(self.single.clone());
        keys.push(self.list.clone());
        keys.extend(self.legacy.iter().cloned());
        keys
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("MOTOYARD_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let candidates = self.keys.candidates();
        if let Some(blank) = candidates.iter().find(|k| k.trim().is_empty()) {
            return Err(Error::ConfigValidation {
                message: format!("storage key names cannot be blank (got {blank:?})"),
            });
        }

        let mut seen = HashSet::new();
        for key in &candidates {
            if !seen.insert(key.as_str()) {
                return Err(Error::ConfigValidation {
                    message: format!("storage key '{key}' is listed more than once"),
                });
            }
        }

        if self
            .status
            .maintenance_keywords
            .iter()
            .all(|k| k.trim().is_empty())
        {
            return Err(Error::ConfigValidation {
                message: "maintenance_keywords must contain at least one keyword".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}
