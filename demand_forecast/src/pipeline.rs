//! End-to-end demand planning: load, train, forecast, plan inventory

use crate::config::ForecastConfig;
use crate::data::{DemandSeries, SeriesSource, SeriesStore};
use crate::decomposition::{DecompositionAnalyzer, SeriesDecomposition};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureBuilder, FeatureTable};
use crate::forecaster::{ForecastTrajectory, RecursiveForecaster};
use crate::inventory::{InventoryOptimizer, InventoryPlan};
use crate::models::{ForecastModel, TrainedModel, TrainingReport};
use tracing::info;

/// Demand forecaster for a single series.
///
/// Forecasting and inventory planning require a prior call to
/// [`train_forecast_model`](Self::train_forecast_model). Forecast calls only read
/// shared state, so several horizons can be forecast concurrently.
#[derive(Debug, Clone)]
pub struct DemandForecaster {
    config: ForecastConfig,
    series: DemandSeries,
    builder: FeatureBuilder,
    model: Option<TrainedModel>,
}

impl DemandForecaster {
    /// Validate the configuration and load the series from `source`
    pub fn new(config: ForecastConfig, source: SeriesSource) -> Result<Self> {
        config.validate()?;
        let series = SeriesStore::with_fallback_seed(config.fallback_seed).load(source)?;
        Self::from_series(config, series)
    }

    /// Forecaster over an already loaded series
    pub fn from_series(config: ForecastConfig, series: DemandSeries) -> Result<Self> {
        config.validate()?;
        let builder = FeatureBuilder::new(config.window)?;
        Ok(Self {
            config,
            series,
            builder,
            model: None,
        })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// The historical series; never modified by forecasting
    pub fn series(&self) -> &DemandSeries {
        &self.series
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// The trained model, if training has happened
    pub fn model(&self) -> Option<&TrainedModel> {
        self.model.as_ref()
    }

    /// The supervised feature table for the historical series
    pub fn prepare_features(&self) -> Result<FeatureTable> {
        self.builder.build(&self.series)
    }

    /// Train the random forest on a chronological split and report held-out accuracy
    pub fn train_forecast_model(&mut self) -> Result<TrainingReport> {
        let table = self.prepare_features()?;
        let model =
            ForecastModel::random_forest(self.config.forest.clone(), self.config.test_fraction)?;
        let (trained, report) = model.train(&table)?;

        info!(
            rows = table.len(),
            features = table.contract().len(),
            mse = report.mse,
            "Model MSE: {:.2}",
            report.mse
        );
        self.model = Some(trained);
        Ok(report)
    }

    /// Forecast `days` days past the end of the historical series
    pub fn forecast_future(&self, days: usize) -> Result<ForecastTrajectory> {
        let model = self.model.as_ref().ok_or(ForecastError::NotTrained)?;
        RecursiveForecaster::for_model(model)?.forecast_future(model, &self.series, days)
    }

    /// Forecast the configured default horizon
    pub fn forecast_default_horizon(&self) -> Result<ForecastTrajectory> {
        self.forecast_future(self.config.horizon)
    }

    /// Reorder point and safety stock from a forecast covering the lead time
    pub fn optimize_inventory(&self) -> Result<InventoryPlan> {
        if !self.is_trained() {
            return Err(ForecastError::NotTrained);
        }
        let optimizer = InventoryOptimizer::from_config(&self.config)?;
        let trajectory = self.forecast_future(self.config.lead_time_days)?;
        optimizer.optimize(&trajectory)
    }

    /// Seasonal decomposition of the historical series, for diagnostics only
    pub fn analyze_historical_data(&self, period: usize) -> Result<SeriesDecomposition> {
        DecompositionAnalyzer::new(period)?.analyze(&self.series)
    }
}
