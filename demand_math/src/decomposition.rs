//! Classical additive seasonal decomposition
//!
//! Splits a series into `observed = trend + seasonal + residual`:
//! - Trend: centered moving average over one period (a 2 x period average for even periods)
//! - Seasonal: mean detrended value per position in the cycle, centered to sum to zero
//! - Residual: whatever remains
//!
//! Trend and residual are undefined for the first and last `period / 2` points, where the
//! centered average would run past the series; those entries are `None`.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Decomposed series components, aligned index-for-index with the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveDecomposition {
    /// Cycle length used for the decomposition
    pub period: usize,
    /// The input series
    pub observed: Vec<f64>,
    /// Centered moving average trend
    pub trend: Vec<Option<f64>>,
    /// Repeating seasonal pattern
    pub seasonal: Vec<f64>,
    /// Observed minus trend minus seasonal
    pub residual: Vec<Option<f64>>,
}

impl AdditiveDecomposition {
    /// The one-cycle seasonal profile, indexed by position in the cycle
    pub fn seasonal_profile(&self) -> &[f64] {
        &self.seasonal[..self.period.min(self.seasonal.len())]
    }
}

/// Perform a classical additive decomposition with the given period
pub fn decompose_additive(values: &[f64], period: usize) -> Result<AdditiveDecomposition> {
    if period < 2 {
        return Err(MathError::InvalidInput(
            "Seasonal period must be at least 2".to_string(),
        ));
    }
    if values.len() < 2 * period {
        return Err(MathError::InsufficientData(format!(
            "Decomposition with period {} needs at least {} observations, have {}",
            period,
            2 * period,
            values.len()
        )));
    }

    let trend = centered_moving_average(values, period);

    // Average the detrended values at each position of the cycle
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, (value, t)) in values.iter().zip(trend.iter()).enumerate() {
        if let Some(t) = t {
            sums[i % period] += value - t;
            counts[i % period] += 1;
        }
    }

    let mut profile: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();
    let profile_mean = profile.iter().sum::<f64>() / period as f64;
    for p in profile.iter_mut() {
        *p -= profile_mean;
    }

    let seasonal: Vec<f64> = (0..values.len()).map(|i| profile[i % period]).collect();

    let residual = values
        .iter()
        .zip(trend.iter())
        .zip(seasonal.iter())
        .map(|((v, t), s)| t.map(|t| v - t - s))
        .collect();

    Ok(AdditiveDecomposition {
        period,
        observed: values.to_vec(),
        trend,
        seasonal,
        residual,
    })
}

/// Centered moving average; even periods use half weights on the two outer points
fn centered_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let half = period / 2;
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0; period + 1];
        w[0] = 0.5;
        w[period] = 0.5;
        w
    } else {
        vec![1.0; period]
    };

    (0..n)
        .map(|i| {
            if i < half || i + half >= n {
                return None;
            }
            let start = i - half;
            let total: f64 = weights
                .iter()
                .enumerate()
                .map(|(k, w)| w * values[start + k])
                .sum();
            Some(total / period as f64)
        })
        .collect()
}
