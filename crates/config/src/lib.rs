//! ARMORY: Configuration management
//!
//! Loads and saves the worker budget and the named chain definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir};

/// Errors in configuration handling
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG IO ERROR: {0}")]
    Io(#[from] std::io::Error),

    #[error("CONFIG PARSE ERROR: {0}")]
    Json(#[from] serde_json::Error),

    #[error("INVALID CONFIG: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Chain context key bound to the initial input; steps may not write it
pub const INPUT_KEY: &str = "input";

/// Concurrent executor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum number of tool invocations in flight at once
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

fn default_max_workers() -> usize {
    4
}

/// One step of a configured chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
    pub tool: String,
    #[serde(default = "default_step_input")]
    pub input: String,
    pub output_key: String,
}

fn default_step_input() -> String {
    "{input}".to_string()
}

impl StepConfig {
    pub fn new(
        tool: impl Into<String>,
        input: impl Into<String>,
        output_key: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            input: input.into(),
            output_key: output_key.into(),
        }
    }
}

/// Named chain definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
}

impl Config {
    /// Configuration written by `init`: defaults plus a demonstration chain
    pub fn starter() -> Self {
        Self {
            executor: ExecutorConfig::default(),
            chains: vec![ChainConfig {
                name: "shout".to_string(),
                description: "Reverse the input, then uppercase it".to_string(),
                steps: vec![
                    StepConfig::new("reverse", "{input}", "reversed"),
                    StepConfig::new("upper", "{reversed}", "shouted"),
                ],
            }],
        }
    }

    /// Load from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from a specific location; a missing file yields defaults
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("◆ NO CONFIG FOUND AT {:?}, USING DEFAULTS", path);
            return Ok(Config::default());
        }

        debug!("◆ READING CONFIG FROM {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to a specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("◆ WRITING CONFIG TO {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Reject settings the runtime cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.executor.max_workers == 0 {
            return Err(ConfigError::Invalid(
                "executor.max_workers must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for chain in &self.chains {
            if chain.name.trim().is_empty() {
                return Err(ConfigError::Invalid("chain name is empty".to_string()));
            }
            if !seen.insert(chain.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate chain name '{}'",
                    chain.name
                )));
            }
            for (index, step) in chain.steps.iter().enumerate() {
                if step.tool.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "chain '{}' step {} has no tool",
                        chain.name, index
                    )));
                }
                if step.output_key.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "chain '{}' step {} has no output_key",
                        chain.name, index
                    )));
                }
                if step.output_key == INPUT_KEY {
                    return Err(ConfigError::Invalid(format!(
                        "chain '{}' step {} writes the reserved key '{}'",
                        chain.name, index, INPUT_KEY
                    )));
                }
            }
        }

        Ok(())
    }

    /// Find a chain definition by name
    pub fn chain(&self, name: &str) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.name == name)
    }

    /// Worker budget for the concurrent executor
    pub fn max_workers(&self) -> usize {
        self.executor.max_workers
    }
}

/// Write the starter configuration at `path` unless one already exists
pub async fn init_at(path: &Path) -> Result<Config> {
    if path.exists() {
        warn!("◆ CONFIG ALREADY PRESENT AT {:?}", path);
    } else {
        Config::starter().save_to(path).await?;
        info!("◆ CONFIG ESTABLISHED AT {:?}", path);
    }

    Config::load_from(path).await
}

/// Initialize the default configuration location
pub async fn init() -> Result<Config> {
    init_at(&config_path()).await
}
