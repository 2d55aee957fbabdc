//! Seasonal diagnostics for a demand series
//!
//! Read-only: decomposing a series never affects the forecast or the inventory plan.

use crate::data::DemandSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use demand_math::decomposition::{decompose_additive, AdditiveDecomposition};
use serde::Serialize;
use tracing::debug;

/// Additive decomposition with the dates it covers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDecomposition {
    pub dates: Vec<NaiveDate>,
    pub components: AdditiveDecomposition,
}

impl SeriesDecomposition {
    /// Average seasonal effect per weekday when the period is 7, indexed by
    /// position relative to the first date
    pub fn seasonal_profile(&self) -> &[f64] {
        self.components.seasonal_profile()
    }

    /// Variance share of the seasonal component relative to seasonal + residual,
    /// over the points where the residual is defined
    pub fn seasonal_strength(&self) -> f64 {
        let (seasonal, residual): (Vec<f64>, Vec<f64>) = self
            .components
            .seasonal
            .iter()
            .zip(self.components.residual.iter())
            .filter_map(|(s, r)| r.map(|r| (*s, r)))
            .unzip();

        let var = |v: &[f64]| demand_math::stats::sample_std_dev(v).map_or(0.0, |s| s * s);
        let combined: Vec<f64> = seasonal.iter().zip(residual.iter()).map(|(s, r)| s + r).collect();
        let total = var(&combined);
        if total == 0.0 {
            return 0.0;
        }
        (1.0 - var(&residual) / total).max(0.0)
    }
}

/// Classical additive decomposition of a demand series
#[derive(Debug, Clone)]
pub struct DecompositionAnalyzer {
    period: usize,
}

impl Default for DecompositionAnalyzer {
    fn default() -> Self {
        Self { period: 7 }
    }
}

impl DecompositionAnalyzer {
    /// Analyzer for a seasonal cycle of `period` days
    pub fn new(period: usize) -> Result<Self> {
        if period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be at least 2 days, got {}",
                period
            )));
        }
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Decompose the series into trend, seasonal and residual parts
    pub fn analyze(&self, series: &DemandSeries) -> Result<SeriesDecomposition> {
        let components = decompose_additive(series.values(), self.period)?;
        debug!(period = self.period, days = series.len(), "Decomposed demand series");

        Ok(SeriesDecomposition {
            dates: series.dates().to_vec(),
            components,
        })
    }
}
