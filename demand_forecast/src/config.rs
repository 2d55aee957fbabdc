//! Pipeline configuration
//!
//! Every field has a documented default, so an empty JSON object is a valid
//! configuration. Call [`ForecastConfig::validate`] (done by the loaders) before use.

use crate::error::{ForecastError, Result};
use crate::inventory::ZScorePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    /// Seed from which every tree's bootstrap sample is derived
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Maximum tree depth; unlimited when `None`
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// Minimum number of samples required to split a node
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    /// Minimum number of samples in each child of a split
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Draw a bootstrap sample per tree instead of using every row
    #[serde(default = "default_bootstrap")]
    pub bootstrap: bool,
}

fn default_n_trees() -> usize {
    100
}

fn default_seed() -> u64 {
    42
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

fn default_bootstrap() -> bool {
    true
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            seed: default_seed(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            bootstrap: default_bootstrap(),
        }
    }
}

/// Configuration for the whole forecasting and inventory pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Number of lag features and length of the rolling window
    #[serde(default = "default_window")]
    pub window: usize,
    /// Fraction of the feature table held out (chronologically last) for testing
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    /// Regression estimator hyperparameters
    #[serde(default)]
    pub forest: ForestConfig,
    /// Days forecast by default
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    /// Replenishment lead time in days
    #[serde(default = "default_lead_time")]
    pub lead_time_days: usize,
    /// Target probability of not stocking out during the lead time
    #[serde(default = "default_service_level")]
    pub service_level: f64,
    /// How the service level is turned into a z-score
    #[serde(default)]
    pub z_score_policy: ZScorePolicy,
    /// Seed for the synthetic fallback series; entropy-seeded when `None`
    #[serde(default)]
    pub fallback_seed: Option<u64>,
}

fn default_window() -> usize {
    7
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_horizon() -> usize {
    30
}

fn default_lead_time() -> usize {
    7
}

fn default_service_level() -> f64 {
    0.95
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            test_fraction: default_test_fraction(),
            forest: ForestConfig::default(),
            horizon: default_horizon(),
            lead_time_days: default_lead_time(),
            service_level: default_service_level(),
            z_score_policy: ZScorePolicy::default(),
            fallback_seed: None,
        }
    }
}

impl ForecastConfig {
    /// Parse and validate a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ForecastConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Fail fast on values the pipeline cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.window < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "window must be at least 2 for a defined rolling standard deviation, got {}",
                self.window
            )));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.forest.n_trees == 0 {
            return Err(ForecastError::InvalidParameter(
                "forest.n_trees must be positive".to_string(),
            ));
        }
        if self.forest.min_samples_split < 2 {
            return Err(ForecastError::InvalidParameter(
                "forest.min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.forest.min_samples_leaf == 0 {
            return Err(ForecastError::InvalidParameter(
                "forest.min_samples_leaf must be positive".to_string(),
            ));
        }
        if self.forest.max_depth == Some(0) {
            return Err(ForecastError::InvalidParameter(
                "forest.max_depth must be positive when set".to_string(),
            ));
        }
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be at least one day".to_string(),
            ));
        }
        if self.lead_time_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "lead_time_days must be at least one day".to_string(),
            ));
        }

        // Unsupported service levels fail here
        self.z_score_policy.z_score(self.service_level)?;

        Ok(())
    }
}
