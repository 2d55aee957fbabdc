//! Descriptive statistics over demand windows
//!
//! Contains the small set of statistics the forecasting pipeline relies on:
//! - Arithmetic mean
//! - Sample standard deviation (n - 1 denominator)
//! - Trailing window selection that never includes the current observation

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Mean and sample standard deviation of a window of observations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Arithmetic mean of the window
    pub mean: f64,
    /// Sample standard deviation, `None` when the window holds fewer than two points
    pub std_dev: Option<f64>,
    /// Number of observations in the window
    pub len: usize,
}

impl WindowStats {
    /// Compute the statistics of a non-empty window
    pub fn from_window(values: &[f64]) -> Result<Self> {
        Ok(Self {
            mean: mean(values)?,
            std_dev: sample_std_dev(values),
            len: values.len(),
        })
    }

    /// Standard deviation with the single-point convention applied (0.0)
    pub fn std_dev_or_zero(&self) -> f64 {
        self.std_dev.unwrap_or(0.0)
    }
}

/// Arithmetic mean of the values
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty window".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation of the values.
///
/// Returns `None` for fewer than two values, where the sample variance is undefined.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);

    Some(variance.sqrt())
}

/// The `window` observations immediately preceding index `end` (exclusive).
///
/// Near the start of the series the slice is shorter than `window`.
pub fn trailing_window(values: &[f64], end: usize, window: usize) -> &[f64] {
    let end = end.min(values.len());
    &values[end.saturating_sub(window)..end]
}

/// Ensure every value is finite, naming the first offending position
pub fn ensure_finite(values: &[f64], what: &str) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(MathError::CalculationError(format!(
            "{} contains a non-finite value at position {}",
            what, idx
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[2.0, 4.0, 6.0]).unwrap(), 4.0);
        assert!(mean(&[]).is_err());
    }

    #[test]
    fn test_sample_std_dev() {
        // Sample variance of 2, 4, 4, 4, 5, 5, 7, 9 is 32 / 7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = sample_std_dev(&values).unwrap();
        assert_relative_eq!(std, (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);

        assert_eq!(sample_std_dev(&[3.0]), None);
        assert_eq!(sample_std_dev(&[]), None);
        assert_eq!(sample_std_dev(&[5.0, 5.0, 5.0]), Some(0.0));
    }

    #[test]
    fn test_trailing_window_excludes_end() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];

        assert_eq!(trailing_window(&values, 4, 2), &[3.0, 4.0]);
        assert_eq!(trailing_window(&values, 2, 7), &[1.0, 2.0]);
        assert!(trailing_window(&values, 0, 3).is_empty());
        assert_eq!(trailing_window(&values, 5, 5), &values[..]);
    }

    #[test]
    fn test_window_stats() {
        let stats = WindowStats::from_window(&[10.0, 20.0]).unwrap();
        assert_eq!(stats.mean, 15.0);
        assert_eq!(stats.len, 2);
        assert_relative_eq!(stats.std_dev.unwrap(), 50.0_f64.sqrt());

        let single = WindowStats::from_window(&[42.0]).unwrap();
        assert_eq!(single.std_dev, None);
        assert_eq!(single.std_dev_or_zero(), 0.0);
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite(&[1.0, 2.0], "window").is_ok());
        let err = ensure_finite(&[1.0, f64::NAN], "window").unwrap_err();
        assert!(err.to_string().contains("position 1"));
    }
}
