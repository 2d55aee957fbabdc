//! # Demand Planner
//!
//! `demand_planner` bundles the demand planning crates of this workspace:
//!
//! - [`math`]: window statistics, forecast accuracy and seasonal decomposition
//! - [`forecast`]: series loading, features, the forecast model and inventory planning
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use demand_planner::forecast::{DemandForecaster, DemandSeries, ForecastConfig, ForestConfig};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let series = DemandSeries::from_values(start, vec![100.0; 60]).unwrap();
//! let config = ForecastConfig {
//!     forest: ForestConfig { n_trees: 10, ..ForestConfig::default() },
//!     ..ForecastConfig::default()
//! };
//!
//! let mut forecaster = DemandForecaster::from_series(config, series).unwrap();
//! forecaster.train_forecast_model().unwrap();
//!
//! let plan = forecaster.optimize_inventory().unwrap().rounded();
//! assert_eq!(plan.reorder_point, 700.0);
//! assert_eq!(plan.safety_stock, 0.0);
//! ```

pub use demand_forecast as forecast;
pub use demand_math as math;

pub use demand_forecast::{
    DemandForecaster, DemandSeries, ForecastConfig, ForecastError, ForecastTrajectory,
    InventoryPlan, SeriesSource,
};
