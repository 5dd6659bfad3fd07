use crate::dataset::DatasetPaths;
use crate::policies::PolicyType;
use crate::reward::RewardType;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn default_level() -> String {
    "info".to_string()
}

fn default_epochs() -> usize {
    1
}

fn default_shuffle() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateStoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExperimentConfig {
    pub dataset: String,
    pub policy: PolicyType,
    #[serde(default)]
    pub reward: RewardType,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default)]
    pub seeds: Vec<u64>,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub datasets: HashMap<String, DatasetPaths>,
    pub experiment: ExperimentConfig,
    pub state_store: Option<StateStoreConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        builder.try_deserialize()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;

        builder.try_deserialize()
    }
}
