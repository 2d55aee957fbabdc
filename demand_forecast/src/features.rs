//! Supervised feature construction for demand series
//!
//! Every row describes one date `t` using only information available before `t`:
//! - `lag_1..lag_W`: sales 1..W days earlier, most recent first
//! - `rolling_mean`, `rolling_std`: mean and sample standard deviation of the W days before `t`
//! - `day_of_week` (Monday = 0), `month` (1-12), `is_weekend` (Saturday or Sunday)
//!
//! The ordered list of names is a [`FeatureContract`]. It is frozen when a model is
//! trained, and every later row is assembled against it by name.

use crate::data::DemandSeries;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use demand_math::stats::{trailing_window, WindowStats};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Version of the feature layout produced by [`FeatureBuilder`]
pub const FEATURE_CONTRACT_VERSION: u32 = 1;

pub const ROLLING_MEAN: &str = "rolling_mean";
pub const ROLLING_STD: &str = "rolling_std";
pub const DAY_OF_WEEK: &str = "day_of_week";
pub const MONTH: &str = "month";
pub const IS_WEEKEND: &str = "is_weekend";

/// Name of the `i`-th lag feature (1-based)
pub fn lag_name(i: usize) -> String {
    format!("lag_{}", i)
}

/// Ordered feature names for a window
fn feature_names(window: usize) -> Vec<String> {
    let mut names: Vec<String> = (1..=window).map(lag_name).collect();
    names.extend(
        [ROLLING_MEAN, ROLLING_STD, DAY_OF_WEEK, MONTH, IS_WEEKEND]
            .iter()
            .map(|s| s.to_string()),
    );
    names
}

/// The frozen, versioned schema of a feature vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureContract {
    version: u32,
    window: usize,
    names: Vec<String>,
}

impl FeatureContract {
    /// The contract the current builder produces for a window
    pub fn for_window(window: usize) -> Result<Self> {
        if window < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Feature window must be at least 2, got {}",
                window
            )));
        }

        Ok(Self {
            version: FEATURE_CONTRACT_VERSION,
            window,
            names: feature_names(window),
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Feature names in estimator column order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Check that `names` is exactly this contract: same set, same order
    pub fn validate_names<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        let expected: HashSet<&str> = self.names.iter().map(String::as_str).collect();
        let actual: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();

        let missing: Vec<String> = self
            .names
            .iter()
            .filter(|n| !actual.contains(n.as_str()))
            .cloned()
            .collect();
        let extra: Vec<String> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|n| !expected.contains(n))
            .map(str::to_string)
            .collect();
        let reordered = missing.is_empty()
            && extra.is_empty()
            && (names.len() != self.names.len()
                || !self.names.iter().zip(names.iter()).all(|(a, b)| a == b.as_ref()));

        if missing.is_empty() && extra.is_empty() && !reordered {
            Ok(())
        } else {
            Err(ForecastError::ContractMismatch {
                missing,
                extra,
                reordered,
            })
        }
    }
}

/// Features for one date, plus its target when known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    /// `lags[0]` is lag_1 (yesterday)
    pub lags: Vec<f64>,
    pub rolling_mean: f64,
    pub rolling_std: f64,
    pub day_of_week: u32,
    pub month: u32,
    pub is_weekend: bool,
    /// Observed sales, `None` for a day awaiting prediction
    pub sales: Option<f64>,
}

impl FeatureRow {
    /// Feature values keyed by name, in the order this row was built
    pub fn named_values(&self) -> Vec<(String, f64)> {
        let mut values: Vec<(String, f64)> = self
            .lags
            .iter()
            .enumerate()
            .map(|(i, v)| (lag_name(i + 1), *v))
            .collect();
        values.push((ROLLING_MEAN.to_string(), self.rolling_mean));
        values.push((ROLLING_STD.to_string(), self.rolling_std));
        values.push((DAY_OF_WEEK.to_string(), self.day_of_week as f64));
        values.push((MONTH.to_string(), self.month as f64));
        values.push((
            IS_WEEKEND.to_string(),
            if self.is_weekend { 1.0 } else { 0.0 },
        ));
        values
    }

    /// Feature vector in contract order.
    ///
    /// Fails if the row's feature names differ from the contract, or if any value
    /// is not finite.
    pub fn to_vector(&self, contract: &FeatureContract) -> Result<Vec<f64>> {
        let named = self.named_values();
        let names: Vec<&str> = named.iter().map(|(n, _)| n.as_str()).collect();
        let by_name: HashMap<&str, f64> = named.iter().map(|(n, v)| (n.as_str(), *v)).collect();

        // Set equality is enough here; values are placed by name below
        if let Err(err) = contract.validate_names(&names) {
            if !matches!(err, ForecastError::ContractMismatch { reordered: true, .. }) {
                return Err(err);
            }
        }

        let mut vector = Vec::with_capacity(contract.len());
        for name in contract.names() {
            let value = by_name[name.as_str()];
            if !value.is_finite() {
                return Err(ForecastError::InvariantViolation(format!(
                    "Feature '{}' for {} is not finite ({})",
                    name, self.date, value
                )));
            }
            vector.push(value);
        }
        Ok(vector)
    }
}

/// Feature rows sharing one contract, in date order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    contract: FeatureContract,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Feature vectors in contract order
    pub fn feature_matrix(&self) -> Result<Vec<Vec<f64>>> {
        self.rows
            .iter()
            .map(|row| row.to_vector(&self.contract))
            .collect()
    }

    /// Target values; every row must carry its observed sales
    pub fn targets(&self) -> Result<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| {
                row.sales.ok_or_else(|| {
                    ForecastError::DataError(format!("Row for {} has no target sales", row.date))
                })
            })
            .collect()
    }

    /// Split into the earliest `1 - test_fraction` rows and the rest, without shuffling
    pub fn split_chronological(&self, test_fraction: f64) -> Result<(FeatureTable, FeatureTable)> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "test_fraction must be in (0, 1), got {}",
                test_fraction
            )));
        }

        let train_size = (self.rows.len() as f64 * (1.0 - test_fraction)) as usize;
        if train_size == 0 || train_size == self.rows.len() {
            return Err(ForecastError::DataError(format!(
                "Cannot split {} feature rows into non-empty train and test sets",
                self.rows.len()
            )));
        }

        let (train, test) = self.rows.split_at(train_size);
        Ok((
            FeatureTable {
                contract: self.contract.clone(),
                rows: train.to_vec(),
            },
            FeatureTable {
                contract: self.contract.clone(),
                rows: test.to_vec(),
            },
        ))
    }

    /// The table as a DataFrame: `date`, the features in contract order, then `sales`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.contract.len() + 2);
        columns.push(Series::new(
            "date",
            self.rows
                .iter()
                .map(|r| r.date.to_string())
                .collect::<Vec<String>>(),
        ));

        let matrix = self.feature_matrix()?;
        for (j, name) in self.contract.names().iter().enumerate() {
            let column: Vec<f64> = matrix.iter().map(|row| row[j]).collect();
            columns.push(Series::new(name.as_str(), column));
        }

        columns.push(Series::new(
            "sales",
            self.rows.iter().map(|r| r.sales).collect::<Vec<Option<f64>>>(),
        ));

        Ok(DataFrame::new(columns)?)
    }
}

/// Turns a demand series into a supervised feature table
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    contract: FeatureContract,
}

impl FeatureBuilder {
    /// Create a builder with `window` lags and a `window`-day rolling window
    pub fn new(window: usize) -> Result<Self> {
        Ok(Self {
            contract: FeatureContract::for_window(window)?,
        })
    }

    pub fn window(&self) -> usize {
        self.contract.window()
    }

    /// The contract every row from this builder satisfies
    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    /// Build the training table, dropping the first `window` dates (incomplete history)
    pub fn build(&self, series: &DemandSeries) -> Result<FeatureTable> {
        let values = series.values();
        let window = self.window();

        let rows = series
            .dates()
            .iter()
            .enumerate()
            .skip(window)
            .map(|(t, &date)| {
                let mut row = self.row_after(&values[..t], date)?;
                row.sales = Some(values[t]);
                Ok(row)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FeatureTable {
            contract: self.contract.clone(),
            rows,
        })
    }

    /// Features for `date`, the day right after the last value of `history`.
    ///
    /// With fewer than `window` days of history, lags that would reach before the
    /// start repeat the oldest value, and the rolling statistics use the days available
    /// (a single day has a standard deviation of 0).
    pub fn row_after(&self, history: &[f64], date: NaiveDate) -> Result<FeatureRow> {
        let oldest = *history.first().ok_or_else(|| {
            ForecastError::DataError(format!("No history to build features for {}", date))
        })?;
        let window = self.window();
        let n = history.len();

        let lags = (1..=window)
            .map(|i| if i <= n { history[n - i] } else { oldest })
            .collect();

        let stats = WindowStats::from_window(trailing_window(history, n, window))?;
        let weekday = date.weekday().num_days_from_monday();

        Ok(FeatureRow {
            date,
            lags,
            rolling_mean: stats.mean,
            rolling_std: stats.std_dev_or_zero(),
            day_of_week: weekday,
            month: date.month(),
            is_weekend: weekday >= 5,
            sales: None,
        })
    }
}
