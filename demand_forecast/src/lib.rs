//! # Demand Forecast
//!
//! Daily demand forecasting and inventory planning for a single product.
//!
//! ## Features
//!
//! - Daily sales series from JSON, CSV or in-memory records, with a seeded synthetic fallback
//! - Leak-free supervised features: lags, trailing rolling statistics and calendar fields
//! - Random forest regression with a chronological train/test split
//! - Recursive multi-day forecasting that feeds each prediction back into the next day's features
//! - Reorder point and safety stock from the forecast over the replenishment lead time
//! - Additive seasonal decomposition for diagnostics
//!
//! ## Quick Start
//!
//! ```no_run
//! use demand_forecast::{DemandForecaster, ForecastConfig, SeriesSource};
//!
//! let config = ForecastConfig::default();
//! let mut forecaster = DemandForecaster::new(config, SeriesSource::JsonFile("sales.json".into()))?;
//!
//! let report = forecaster.train_forecast_model()?;
//! println!("{}", report);
//!
//! let forecast = forecaster.forecast_future(30)?;
//! let plan = forecaster.optimize_inventory()?;
//! println!("{} days forecast\n{}", forecast.len(), plan.rounded());
//! # Ok::<(), demand_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod decomposition;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod inventory;
pub mod models;
pub mod pipeline;

// Re-export commonly used types
pub use crate::config::{ForecastConfig, ForestConfig};
pub use crate::data::{DemandSeries, SalesRecord, SeriesOrigin, SeriesSource, SeriesStore};
pub use crate::decomposition::{DecompositionAnalyzer, SeriesDecomposition};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{FeatureBuilder, FeatureContract, FeatureRow, FeatureTable};
pub use crate::forecaster::{ForecastPoint, ForecastTrajectory, RecursiveForecaster};
pub use crate::inventory::{InventoryOptimizer, InventoryPlan, ZScorePolicy};
pub use crate::models::{ForecastModel, TrainedModel, TrainingReport};
pub use crate::pipeline::DemandForecaster;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
