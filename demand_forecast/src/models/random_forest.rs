//! Random forest regressor
//!
//! An ensemble of [`RegressionTree`]s, each grown on its own bootstrap sample of the
//! training rows. Tree seeds are drawn from a generator seeded with the forest seed,
//! so a fixed seed and fixed data always yield the same forest.

use crate::config::ForestConfig;
use crate::error::{ForecastError, Result};
use crate::models::tree::{RegressionTree, TreeParams};
use crate::models::{FittedRegressor, Regressor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Random forest model
#[derive(Debug, Clone)]
pub struct RandomForest {
    /// Name of the model
    name: String,
    config: ForestConfig,
}

/// Trained random forest
#[derive(Debug, Clone)]
pub struct TrainedForest {
    /// Name of the model
    name: String,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Create a new random forest with the given hyperparameters
    pub fn new(config: ForestConfig) -> Result<Self> {
        if config.n_trees == 0 {
            return Err(ForecastError::InvalidParameter(
                "Random forest needs at least one tree".to_string(),
            ));
        }
        if config.min_samples_split < 2 || config.min_samples_leaf == 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Invalid node limits: min_samples_split={}, min_samples_leaf={}",
                config.min_samples_split, config.min_samples_leaf
            )));
        }

        Ok(Self {
            name: format!(
                "Random Forest (trees={}, seed={})",
                config.n_trees, config.seed
            ),
            config,
        })
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
        }
    }
}

impl Regressor for RandomForest {
    type Fitted = TrainedForest;

    fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<Self::Fitted> {
        if features.is_empty() {
            return Err(ForecastError::DataError(
                "Cannot train a random forest on zero rows".to_string(),
            ));
        }

        let n = features.len();
        let params = self.tree_params();
        let mut seeds = StdRng::seed_from_u64(self.config.seed);
        let all_rows: Vec<usize> = (0..n).collect();

        let trees = (0..self.config.n_trees)
            .map(|_| {
                let mut rng = StdRng::seed_from_u64(seeds.gen::<u64>());
                let sample: Vec<usize> = if self.config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    all_rows.clone()
                };
                RegressionTree::fit(features, targets, &sample, params)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            trees = trees.len(),
            rows = n,
            nodes = trees.iter().map(RegressionTree::node_count).sum::<usize>(),
            "Fitted random forest"
        );

        Ok(TrainedForest {
            name: self.name.clone(),
            n_features: features[0].len(),
            trees,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForest {
    /// Number of trees in the ensemble
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean impurity-decrease importance per feature, normalized to sum to 1
    /// (all zeros when no tree ever split)
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (total, imp) in totals.iter_mut().zip(tree.importances()) {
                *total += imp;
            }
        }

        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|t| *t /= sum);
        }
        totals
    }
}

impl FittedRegressor for TrainedForest {
    fn predict_one(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.n_features {
            return Err(ForecastError::InvalidParameter(format!(
                "Expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }

        let total: f64 = self.trees.iter().map(|tree| tree.predict(features)).sum();
        Ok(total / self.trees.len() as f64)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn name(&self) -> &str {
        &self.name
    }
}
