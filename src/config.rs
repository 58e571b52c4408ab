//! Configuration management for relabeler
//!
//! Handles loading and validating relabel rules from YAML files.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::error::RuleError;
use crate::relabel::{RelabelConfig, Relabeler, RuleSet};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A relabel rule failed validation
    #[error("Invalid relabel rule: {0}")]
    Rule(#[from] RuleError),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Relabel rules, applied in order
    #[serde(default)]
    pub relabel_configs: Vec<RelabelConfig>,
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, cannot be parsed, or
    /// contains a rule that fails to compile
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&contents)?;

        tracing::debug!(
            path = %path.display(),
            rules = config.relabel_configs.len(),
            "Loaded relabel configuration"
        );

        Ok(config)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Compile the configured rules
    pub fn compile_rules(&self) -> Result<RuleSet, ConfigError> {
        Ok(RuleSet::compile_all(&self.relabel_configs)?)
    }

    /// Build a relabel engine from the configured rules
    pub fn relabeler(&self) -> Result<Relabeler, ConfigError> {
        Ok(Relabeler::new(self.compile_rules()?))
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        self.compile_rules().map(|_| ())
    }
}
