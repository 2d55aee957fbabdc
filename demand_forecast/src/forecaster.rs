//! Recursive multi-step forecasting
//!
//! Day `d + 1` is predicted from features that include the prediction for day `d`:
//! each forecast is appended to a private working copy of the history before the
//! next day's lags and rolling statistics are computed. The loop is inherently
//! sequential, and the caller's series is never modified.

use crate::data::DemandSeries;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureBuilder, FeatureContract};
use crate::models::{FittedRegressor, TrainedModel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One forecast day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Consecutive daily point forecasts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTrajectory {
    points: Vec<ForecastPoint>,
}

impl ForecastTrajectory {
    /// Build a trajectory from consecutive daily points
    pub fn new(points: Vec<ForecastPoint>) -> Result<Self> {
        for pair in points.windows(2) {
            if pair[1].date != pair[0].date + chrono::Duration::days(1) {
                return Err(ForecastError::DataError(format!(
                    "Forecast dates must be consecutive days: {} follows {}",
                    pair[1].date, pair[0].date
                )));
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// The first `days` points
    pub fn truncated(&self, days: usize) -> Self {
        Self {
            points: self.points.iter().take(days).copied().collect(),
        }
    }

    /// Write `date,forecast` rows
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["date", "forecast"])?;
        for point in &self.points {
            writer.write_record([point.date.to_string(), point.value.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Forecasts day by day, feeding each prediction back into the next day's features
#[derive(Debug, Clone)]
pub struct RecursiveForecaster {
    builder: FeatureBuilder,
}

impl RecursiveForecaster {
    /// Create a forecaster that assembles rows under `contract`
    pub fn new(contract: &FeatureContract) -> Result<Self> {
        let builder = FeatureBuilder::new(contract.window())?;
        if builder.contract() != contract {
            return Err(ForecastError::InvalidParameter(format!(
                "Feature contract version {} is not produced by this builder (version {})",
                contract.version(),
                builder.contract().version()
            )));
        }
        Ok(Self { builder })
    }

    /// Forecaster matching a trained model's contract
    pub fn for_model<F: FittedRegressor>(model: &TrainedModel<F>) -> Result<Self> {
        Self::new(model.contract())
    }

    /// Forecast `horizon` days starting the day after the last historical date
    pub fn forecast_future<F: FittedRegressor>(
        &self,
        model: &TrainedModel<F>,
        history: &DemandSeries,
        horizon: usize,
    ) -> Result<ForecastTrajectory> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be at least one day".to_string(),
            ));
        }
        model
            .contract()
            .validate_names(self.builder.contract().names())?;

        // Working copy owned by this call; grows by one predicted day per step
        let mut current = history.clone();
        let mut points = Vec::with_capacity(horizon);

        for step in 1..=horizon {
            let date = current.next_date().ok_or_else(|| {
                ForecastError::DataError("Cannot forecast from an empty series".to_string())
            })?;

            let row = self.builder.row_after(current.values(), date)?;
            let value = model.predict(&row)?;
            if value < 0.0 {
                return Err(ForecastError::InvariantViolation(format!(
                    "Negative demand forecast {} for {}",
                    value, date
                )));
            }

            debug!(step, %date, value, "Forecast step");
            current.append_next(value)?;
            points.push(ForecastPoint { date, value });
        }

        ForecastTrajectory::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForestConfig;
    use crate::models::ForecastModel;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn trained(values: Vec<f64>) -> (TrainedModel, DemandSeries) {
        let series = DemandSeries::from_values(start(), values).unwrap();
        let table = FeatureBuilder::new(7).unwrap().build(&series).unwrap();
        let model = ForecastModel::random_forest(
            ForestConfig {
                n_trees: 5,
                ..ForestConfig::default()
            },
            0.2,
        )
        .unwrap();
        (model.train(&table).unwrap().0, series)
    }

    #[test]
    fn test_history_is_not_mutated() {
        let (model, series) = trained(vec![20.0; 30]);
        let before = series.clone();

        let forecaster = RecursiveForecaster::for_model(&model).unwrap();
        let trajectory = forecaster.forecast_future(&model, &series, 10).unwrap();

        assert_eq!(trajectory.len(), 10);
        assert_eq!(series, before);
    }

    #[test]
    fn test_short_history_still_forecasts() {
        let (model, _) = trained(vec![20.0; 30]);
        let short = DemandSeries::from_values(start(), vec![20.0, 20.0]).unwrap();

        let forecaster = RecursiveForecaster::for_model(&model).unwrap();
        let trajectory = forecaster.forecast_future(&model, &short, 3).unwrap();

        assert_eq!(trajectory.len(), 3);
        assert_eq!(trajectory.points()[0].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert!(trajectory.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let (model, series) = trained(vec![20.0; 30]);
        let forecaster = RecursiveForecaster::for_model(&model).unwrap();
        assert!(forecaster.forecast_future(&model, &series, 0).is_err());
    }

    #[test]
    fn test_mismatched_forecaster_rejected() {
        let (model, series) = trained(vec![20.0; 30]);
        let other = RecursiveForecaster::new(&FeatureContract::for_window(3).unwrap()).unwrap();
        assert!(matches!(
            other.forecast_future(&model, &series, 2),
            Err(ForecastError::ContractMismatch { .. })
        ));
    }

    #[test]
    fn test_trajectory_requires_consecutive_days() {
        let points = vec![
            ForecastPoint { date: start(), value: 1.0 },
            ForecastPoint { date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), value: 1.0 },
        ];
        assert!(ForecastTrajectory::new(points).is_err());
    }
}
