//! Regression accuracy measures for held-out forecasts

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Forecast accuracy metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, over observations with non-zero actual demand
    pub mape: f64,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

/// Mean squared error between predictions and actual values
pub fn mean_squared_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_lengths(predicted, actual)?;

    let sum: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (a - p).powi(2))
        .sum();

    Ok(sum / predicted.len() as f64)
}

/// Calculate accuracy metrics for a forecast vs actual values
pub fn forecast_accuracy(predicted: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    check_lengths(predicted, actual)?;

    let n = predicted.len() as f64;
    let errors: Vec<f64> = predicted
        .iter()
        .zip(actual.iter())
        .map(|(&p, &a)| a - p)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;
    let rmse = mse.sqrt();

    // Zero-demand days carry no percentage error
    let nonzero: Vec<f64> = actual
        .iter()
        .zip(errors.iter())
        .filter(|(&a, _)| a != 0.0)
        .map(|(&a, &e)| (e.abs() / a.abs()) * 100.0)
        .collect();
    let mape = if nonzero.is_empty() {
        0.0
    } else {
        nonzero.iter().sum::<f64>() / nonzero.len() as f64
    };

    let smape = actual
        .iter()
        .zip(predicted.iter())
        .map(|(&a, &p)| {
            let denom = a.abs() + p.abs();
            if denom == 0.0 {
                0.0
            } else {
                200.0 * (a - p).abs() / denom
            }
        })
        .sum::<f64>()
        / n;

    Ok(ForecastAccuracy {
        mae,
        mse,
        rmse,
        mape,
        smape,
    })
}

fn check_lengths(predicted: &[f64], actual: &[f64]) -> Result<()> {
    if predicted.len() != actual.len() || predicted.is_empty() {
        return Err(MathError::InvalidInput(format!(
            "Predicted ({}) and actual ({}) values must have the same non-zero length",
            predicted.len(),
            actual.len()
        )));
    }
    Ok(())
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:  {:.4}%", self.mape)?;
        writeln!(f, "  SMAPE: {:.4}%", self.smape)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_regression_metrics() {
        let actual = [10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = [12.0, 18.0, 33.0, 37.0, 52.0];

        let acc = forecast_accuracy(&predicted, &actual).unwrap();
        assert_relative_eq!(acc.mae, 2.4, epsilon = 1e-12);
        assert_relative_eq!(acc.mse, 6.0, epsilon = 1e-12);
        assert_relative_eq!(acc.rmse, 6.0_f64.sqrt(), epsilon = 1e-12);
        assert!(acc.mape > 0.0 && acc.mape < 15.0);
        assert!(acc.smape > 0.0 && acc.smape < 15.0);

        assert_relative_eq!(mean_squared_error(&predicted, &actual).unwrap(), 6.0);
    }

    #[test]
    fn test_zero_actuals_do_not_poison_mape() {
        let acc = forecast_accuracy(&[1.0, 0.0], &[0.0, 0.0]).unwrap();
        assert_eq!(acc.mape, 0.0);
        assert!(acc.smape.is_finite());
    }

    #[test]
    fn test_length_mismatch() {
        assert!(mean_squared_error(&[1.0, 2.0], &[1.0]).is_err());
        assert!(forecast_accuracy(&[], &[]).is_err());
    }
}
