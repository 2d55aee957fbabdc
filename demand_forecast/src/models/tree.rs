//! CART regression tree
//!
//! Nodes split on the feature/threshold pair that most reduces the summed squared
//! error of the targets. Thresholds sit halfway between adjacent distinct values and
//! samples with `value <= threshold` go left. Leaves predict the mean target.

use crate::error::{ForecastError, Result};

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
    /// Total squared-error reduction credited to each feature
    importances: Vec<f64>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    error: f64,
}

impl RegressionTree {
    /// Fit a tree on the rows of `features` selected by `sample` (repeats allowed)
    pub fn fit(
        features: &[Vec<f64>],
        targets: &[f64],
        sample: &[usize],
        params: TreeParams,
    ) -> Result<Self> {
        if features.len() != targets.len() {
            return Err(ForecastError::DataError(format!(
                "Feature rows ({}) and targets ({}) differ in length",
                features.len(),
                targets.len()
            )));
        }
        if sample.is_empty() {
            return Err(ForecastError::DataError(
                "Cannot fit a tree on an empty sample".to_string(),
            ));
        }
        let n_features = features[0].len();
        if features.iter().any(|row| row.len() != n_features) {
            return Err(ForecastError::DataError(
                "Feature rows have inconsistent widths".to_string(),
            ));
        }
        if let Some(&bad) = sample.iter().find(|&&i| i >= targets.len()) {
            return Err(ForecastError::DataError(format!(
                "Sample index {} out of range for {} rows",
                bad,
                targets.len()
            )));
        }

        let mut tree = Self {
            nodes: Vec::new(),
            n_features,
            importances: vec![0.0; n_features],
        };
        tree.grow(features, targets, sample.to_vec(), 0, &params);
        Ok(tree)
    }

    /// Number of features the tree was fitted on
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of nodes, leaves included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Unnormalized squared-error reduction per feature
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    /// Predict one row; the caller guarantees `row.len() == n_features()`
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Grow the subtree for `sample`, returning its root index
    fn grow(
        &mut self,
        features: &[Vec<f64>],
        targets: &[f64],
        sample: Vec<usize>,
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let n = sample.len() as f64;
        let sum: f64 = sample.iter().map(|&i| targets[i]).sum();
        let sq_sum: f64 = sample.iter().map(|&i| targets[i] * targets[i]).sum();
        let mean = sum / n;
        let node_error = (sq_sum - sum * sum / n).max(0.0);

        let depth_reached = params.max_depth.map_or(false, |d| depth >= d);
        let split = if depth_reached
            || sample.len() < params.min_samples_split
            || sample.len() < 2 * params.min_samples_leaf
            || node_error <= f64::EPSILON * sq_sum.max(1.0)
        {
            None
        } else {
            best_split(features, targets, &sample, params.min_samples_leaf)
                .filter(|s| s.error < node_error)
        };

        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        if let Some(split) = split {
            self.importances[split.feature] += node_error - split.error;

            let (left_sample, right_sample): (Vec<usize>, Vec<usize>) = sample
                .iter()
                .partition(|&&i| features[i][split.feature] <= split.threshold);

            let left = self.grow(features, targets, left_sample, depth + 1, params);
            let right = self.grow(features, targets, right_sample, depth + 1, params);
            self.nodes[idx] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
        }

        idx
    }
}

fn best_split(
    features: &[Vec<f64>],
    targets: &[f64],
    sample: &[usize],
    min_samples_leaf: usize,
) -> Option<BestSplit> {
    let n = sample.len();
    let total_sum: f64 = sample.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = sample.iter().map(|&i| targets[i] * targets[i]).sum();
    let mut best: Option<BestSplit> = None;
    let mut order = sample.to_vec();

    for feature in 0..features[sample[0]].len() {
        order.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 1..n {
            let y = targets[order[k - 1]];
            left_sum += y;
            left_sq += y * y;

            let lo = features[order[k - 1]][feature];
            let hi = features[order[k]][feature];
            if lo == hi || k < min_samples_leaf || n - k < min_samples_leaf {
                continue;
            }

            let left_n = k as f64;
            let right_n = (n - k) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let error = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);

            if best.as_ref().map_or(true, |b| error < b.error) {
                let mut threshold = lo + (hi - lo) / 2.0;
                // Adjacent floats can round the midpoint up onto `hi`
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    error,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y = vec![100.0; 10];
        let tree = RegressionTree::fit(&x, &y, &all(10), TreeParams::default()).unwrap();

        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict(&[3.0]), 100.0);
        assert_eq!(tree.predict(&[-50.0]), 100.0);
    }

    #[test]
    fn test_step_function() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 0.0]).collect();
        let y: Vec<f64> = (0..10).map(|i| if i < 5 { 1.0 } else { 9.0 }).collect();
        let tree = RegressionTree::fit(&x, &y, &all(10), TreeParams::default()).unwrap();

        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.predict(&[2.0, 0.0]), 1.0);
        assert_eq!(tree.predict(&[4.4, 0.0]), 1.0);
        assert_eq!(tree.predict(&[4.6, 0.0]), 9.0);
        assert_eq!(tree.predict(&[8.0, 0.0]), 9.0);
        // Only the first feature carries signal
        assert!(tree.importances()[0] > 0.0);
        assert_eq!(tree.importances()[1], 0.0);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let params = TreeParams {
            max_depth: Some(1),
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&x, &y, &all(16), params).unwrap();

        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.predict(&[0.0]), 3.5);
        assert_eq!(tree.predict(&[15.0]), 11.5);
    }

    #[test]
    fn test_bootstrap_sample_with_repeats() {
        let x = vec![vec![0.0], vec![1.0], vec![2.0]];
        let y = vec![0.0, 10.0, 20.0];
        let tree = RegressionTree::fit(&x, &y, &[2, 2, 2], TreeParams::default()).unwrap();
        assert_eq!(tree.predict(&[0.0]), 20.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let x = vec![vec![0.0], vec![1.0]];
        assert!(RegressionTree::fit(&x, &[1.0], &[0], TreeParams::default()).is_err());
        assert!(RegressionTree::fit(&x, &[1.0, 2.0], &[], TreeParams::default()).is_err());
        assert!(RegressionTree::fit(&x, &[1.0, 2.0], &[5], TreeParams::default()).is_err());
    }
}
