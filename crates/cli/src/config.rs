//! Configuration management for the CLI
//!
//! Sources, lowest precedence first: built-in defaults,
//! `~/.config/vmc/config.json`, then `VMC_*` environment variables
//! (`VMC_ENGINE__PARALLEL_THRESHOLD` for nested keys). Command-line flags
//! are applied on top by the caller.

use anyhow::{Context, Result};
use costing_lib::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_RESOURCES_PATH: &str = "inventory.json";
pub const DEFAULT_PROFILES_PATH: &str = "profiles.json";
pub const DEFAULT_CURRENCY: &str = "AUD";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resource inventory (JSON array or FOCUS CSV)
    pub resources_path: PathBuf,
    /// Profile store document
    pub profiles_path: PathBuf,
    /// Currency code used when printing amounts
    pub currency: String,
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resources_path: PathBuf::from(DEFAULT_RESOURCES_PATH),
            profiles_path: PathBuf::from(DEFAULT_PROFILES_PATH),
            currency: DEFAULT_CURRENCY.to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Load the layered configuration
    pub fn load() -> Result<Self> {
        // no home directory just means no config file
        Self::load_from(Self::config_path().ok().as_deref())
    }

    /// Load with an explicit config file in place of the default location
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        Self::load_layers(file, None)
    }

    /// `env` replaces the process environment when given
    fn load_layers(file: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .context("Failed to build default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = file {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json)
                    .required(false),
            );
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("VMC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .context("Failed to load configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("vmc").join("config.json"))
    }
}
