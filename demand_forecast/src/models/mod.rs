//! Regression models that map a feature vector to next-day demand

use crate::config::ForestConfig;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureContract, FeatureRow, FeatureTable};
use chrono::NaiveDate;
use demand_math::accuracy::{forecast_accuracy, ForecastAccuracy};
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;
use tracing::info;

pub mod random_forest;
pub mod tree;

pub use random_forest::{RandomForest, TrainedForest};

/// Fitted regression estimator
pub trait FittedRegressor: Debug {
    /// Predict the target for one feature vector
    fn predict_one(&self, features: &[f64]) -> Result<f64>;

    /// Width of the feature vectors the estimator was fitted on
    fn n_features(&self) -> usize;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Regression estimator that can be fitted on a feature matrix
pub trait Regressor: Debug + Clone {
    /// The type of fitted estimator produced
    type Fitted: FittedRegressor;

    /// Fit on rows of features and their targets
    fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// A fitted estimator bound to the feature contract it was trained with
#[derive(Debug, Clone)]
pub struct TrainedModel<F: FittedRegressor = TrainedForest> {
    estimator: F,
    contract: FeatureContract,
}

impl<F: FittedRegressor> TrainedModel<F> {
    /// Bind an estimator to a contract; their widths must agree
    pub fn new(estimator: F, contract: FeatureContract) -> Result<Self> {
        if estimator.n_features() != contract.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Estimator expects {} features but the contract defines {}",
                estimator.n_features(),
                contract.len()
            )));
        }
        Ok(Self {
            estimator,
            contract,
        })
    }

    /// The frozen training-time feature contract
    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    pub fn estimator(&self) -> &F {
        &self.estimator
    }

    /// Point forecast for one row, assembled in contract order
    pub fn predict(&self, row: &FeatureRow) -> Result<f64> {
        let features = row.to_vector(&self.contract)?;
        let prediction = self.estimator.predict_one(&features)?;
        if !prediction.is_finite() {
            return Err(ForecastError::InvariantViolation(format!(
                "Prediction for {} is not finite ({})",
                row.date, prediction
            )));
        }
        Ok(prediction)
    }

    /// Predictions for every row of a table built under the same contract
    pub fn predict_table(&self, table: &FeatureTable) -> Result<Vec<f64>> {
        self.contract.validate_names(table.contract().names())?;
        table.rows().iter().map(|row| self.predict(row)).collect()
    }
}

/// Held-out evaluation of a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    /// Dates of the held-out rows
    pub test_dates: Vec<NaiveDate>,
    /// Model predictions for the held-out rows
    pub test_predictions: Vec<f64>,
    /// Observed sales for the held-out rows
    pub test_actuals: Vec<f64>,
    /// Mean squared error on the held-out rows
    pub mse: f64,
    /// Full accuracy block on the held-out rows
    pub accuracy: ForecastAccuracy,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl TrainingReport {
    /// Write `date,actual,predicted` rows for the held-out slice
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["date", "actual", "predicted"])?;
        for ((date, actual), predicted) in self
            .test_dates
            .iter()
            .zip(self.test_actuals.iter())
            .zip(self.test_predictions.iter())
        {
            writer.write_record([
                date.to_string(),
                actual.to_string(),
                predicted.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Training Report:")?;
        writeln!(f, "  Train rows: {}", self.train_rows)?;
        writeln!(f, "  Test rows:  {}", self.test_rows)?;
        writeln!(f, "  Model MSE:  {:.2}", self.mse)?;
        write!(f, "{}", self.accuracy)
    }
}

/// Trains a regressor on a chronological split of a feature table
#[derive(Debug, Clone)]
pub struct ForecastModel<R: Regressor = RandomForest> {
    regressor: R,
    test_fraction: f64,
}

impl ForecastModel<RandomForest> {
    /// Random forest model with the given hyperparameters
    pub fn random_forest(config: ForestConfig, test_fraction: f64) -> Result<Self> {
        Self::new(RandomForest::new(config)?, test_fraction)
    }
}

impl<R: Regressor> ForecastModel<R> {
    /// Create a model holding out the last `test_fraction` of rows
    pub fn new(regressor: R, test_fraction: f64) -> Result<Self> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "test_fraction must be in (0, 1), got {}",
                test_fraction
            )));
        }
        Ok(Self {
            regressor,
            test_fraction,
        })
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    /// Fit on the earliest rows and evaluate on the latest ones
    pub fn train(&self, table: &FeatureTable) -> Result<(TrainedModel<R::Fitted>, TrainingReport)> {
        let (train, test) = table.split_chronological(self.test_fraction)?;

        let estimator = self
            .regressor
            .fit(&train.feature_matrix()?, &train.targets()?)?;
        let model = TrainedModel::new(estimator, table.contract().clone())?;

        let test_predictions = model.predict_table(&test)?;
        let test_actuals = test.targets()?;
        let accuracy = forecast_accuracy(&test_predictions, &test_actuals)?;

        info!(
            model = self.regressor.name(),
            train_rows = train.len(),
            test_rows = test.len(),
            mse = accuracy.mse,
            "Trained forecast model"
        );

        let report = TrainingReport {
            test_dates: test.dates(),
            test_predictions,
            test_actuals,
            mse: accuracy.mse,
            accuracy,
            train_rows: train.len(),
            test_rows: test.len(),
        };
        Ok((model, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DemandSeries;
    use crate::features::FeatureBuilder;

    fn weekly_table() -> FeatureTable {
        let values: Vec<f64> = (0..70).map(|i| 50.0 + 10.0 * ((i % 7) as f64)).collect();
        let series =
            DemandSeries::from_values(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), values)
                .unwrap();
        FeatureBuilder::new(7).unwrap().build(&series).unwrap()
    }

    fn small_forest() -> ForecastModel {
        ForecastModel::random_forest(
            ForestConfig {
                n_trees: 10,
                ..ForestConfig::default()
            },
            0.2,
        )
        .unwrap()
    }

    #[test]
    fn test_train_reports_held_out_slice() {
        let table = weekly_table();
        let (model, report) = small_forest().train(&table).unwrap();

        // 63 rows -> 50 train, 13 test
        assert_eq!(report.train_rows, 50);
        assert_eq!(report.test_rows, 13);
        assert_eq!(report.test_dates.len(), 13);
        assert_eq!(report.test_dates[0], table.rows()[50].date);
        assert!(report.mse >= 0.0);
        assert_eq!(model.contract(), table.contract());
    }

    #[test]
    fn test_predict_rejects_other_contract() {
        let table = weekly_table();
        let (model, _) = small_forest().train(&table).unwrap();

        let other = FeatureBuilder::new(3).unwrap();
        let row = other
            .row_after(&[1.0, 2.0, 3.0], NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .unwrap();

        assert!(matches!(
            model.predict(&row),
            Err(ForecastError::ContractMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_test_fraction() {
        let forest = RandomForest::new(ForestConfig::default()).unwrap();
        assert!(ForecastModel::new(forest.clone(), 0.0).is_err());
        assert!(ForecastModel::new(forest, 1.5).is_err());
    }
}
