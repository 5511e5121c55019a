use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::search::policy::{Objective, TreePolicyConfig};

const DEFAULT_SEARCH_CONFIG_YAML: &str = include_str!("../../config/search.default.yaml");

/// Largest allowed number of nodes attached between two stop checks.
pub const MAX_INTERRUPT_CHECK_INTERVAL: usize = 10;

/// Search configuration for the playout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub objective: Objective,
    /// Stop normally after this many playouts.
    pub max_playouts: Option<usize>,
    /// Wall-clock budget; exceeding it ends the search as timed out.
    pub timeout_ms: Option<u64>,
    /// Nodes attached between two cooperative stop checks.
    pub interrupt_check_interval: usize,
    /// Never offer fully explored children to the tree policy.
    pub forbid_double_paths: bool,
    /// Seed of the uniform default policy built by `PolicySet::from_config`.
    pub seed: u64,
    pub tree_policy: TreePolicyConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            objective: Objective::Maximize,
            max_playouts: None,
            timeout_ms: None,
            interrupt_check_interval: MAX_INTERRUPT_CHECK_INTERVAL,
            forbid_double_paths: true,
            seed: 0,
            tree_policy: TreePolicyConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Parse a search config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SearchConfigError> {
        let config: SearchConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a search config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SearchConfigError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_SEARCH_CONFIG_YAML
    }

    /// Parse the default YAML config included with this crate.
    pub fn from_default_yaml() -> Result<Self, SearchConfigError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    /// Serialize this config back to YAML.
    pub fn to_yaml(&self) -> Result<String, SearchConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), SearchConfigError> {
        if self.max_playouts == Some(0) {
            return Err(SearchConfigError::Invalid(
                "max_playouts must be greater than 0".to_string(),
            ));
        }
        if !(1..=MAX_INTERRUPT_CHECK_INTERVAL).contains(&self.interrupt_check_interval) {
            return Err(SearchConfigError::Invalid(format!(
                "interrupt_check_interval must be within 1..={MAX_INTERRUPT_CHECK_INTERVAL}"
            )));
        }
        if let Some(reason) = self.tree_policy.invalid_reason() {
            return Err(SearchConfigError::Invalid(reason.to_string()));
        }
        Ok(())
    }
}

/// Error type for loading and validating `SearchConfig`.
#[derive(Debug, Error)]
pub enum SearchConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid search config: {0}")]
    Invalid(String),
}
