//! Reorder point and safety stock from a demand forecast
//!
//! ```text
//! safety_stock  = z * std(forecast) * sqrt(lead_time)
//! reorder_point = mean(forecast) * lead_time + safety_stock
//! ```
//!
//! `std` is the sample standard deviation of the forecast values. A one-day forecast
//! has no sample variance; its standard deviation is taken as 0.

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::forecaster::ForecastTrajectory;
use demand_math::stats::{mean, sample_std_dev};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::info;

/// Conventional two-sided z-scores by service level
const Z_TABLE: [(f64, f64); 6] = [
    (0.80, 1.282),
    (0.85, 1.440),
    (0.90, 1.645),
    (0.95, 1.96),
    (0.98, 2.326),
    (0.99, 2.576),
];

/// How a service level is converted to a z-score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZScorePolicy {
    /// Look the level up in the conventional table (0.95 maps to exactly 1.96);
    /// levels outside the table are rejected
    #[default]
    Tabulated,
    /// Two-sided standard normal quantile, `inverse_cdf((1 + level) / 2)`, for any level in (0, 1)
    NormalQuantile,
}

impl ZScorePolicy {
    /// z-score for a service level
    pub fn z_score(&self, service_level: f64) -> Result<f64> {
        if !(service_level > 0.0 && service_level < 1.0) {
            return Err(ForecastError::UnsupportedServiceLevel {
                level: service_level,
                reason: "service level must lie strictly between 0 and 1".to_string(),
            });
        }

        match self {
            ZScorePolicy::Tabulated => Z_TABLE
                .iter()
                .find(|(level, _)| (level - service_level).abs() < 1e-9)
                .map(|(_, z)| *z)
                .ok_or_else(|| ForecastError::UnsupportedServiceLevel {
                    level: service_level,
                    reason: format!(
                        "tabulated levels are {:?}; use the normal_quantile policy for others",
                        Z_TABLE.iter().map(|(l, _)| *l).collect::<Vec<_>>()
                    ),
                }),
            ZScorePolicy::NormalQuantile => {
                let normal = Normal::new(0.0, 1.0)
                    .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
                Ok(normal.inverse_cdf((1.0 + service_level) / 2.0))
            }
        }
    }
}

/// Inventory control parameters at full precision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryPlan {
    pub reorder_point: f64,
    pub safety_stock: f64,
    pub avg_daily_demand: f64,
    /// Sample standard deviation of the forecast values
    pub forecast_std: f64,
    pub z_score: f64,
    pub lead_time_days: usize,
    pub service_level: f64,
}

impl InventoryPlan {
    /// Copy with the monetary-style quantities rounded to 2 decimals, for reporting
    pub fn rounded(&self) -> Self {
        Self {
            reorder_point: round2(self.reorder_point),
            safety_stock: round2(self.safety_stock),
            avg_daily_demand: round2(self.avg_daily_demand),
            forecast_std: round2(self.forecast_std),
            ..*self
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl std::fmt::Display for InventoryPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Inventory Optimization Results:")?;
        writeln!(f, "  Reorder Point:        {:.2}", self.reorder_point)?;
        writeln!(f, "  Safety Stock:         {:.2}", self.safety_stock)?;
        writeln!(f, "  Average Daily Demand: {:.2}", self.avg_daily_demand)?;
        writeln!(
            f,
            "  Lead Time: {} days, Service Level: {:.1}% (z = {:.3})",
            self.lead_time_days,
            self.service_level * 100.0,
            self.z_score
        )?;
        Ok(())
    }
}

/// Turns a forecast trajectory into a reorder policy
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryOptimizer {
    lead_time_days: usize,
    service_level: f64,
    z_score: f64,
}

impl InventoryOptimizer {
    /// Create an optimizer, resolving the z-score up front
    pub fn new(lead_time_days: usize, service_level: f64, policy: ZScorePolicy) -> Result<Self> {
        if lead_time_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "Lead time must be at least one day".to_string(),
            ));
        }

        Ok(Self {
            lead_time_days,
            service_level,
            z_score: policy.z_score(service_level)?,
        })
    }

    /// Optimizer for the configured lead time, service level and policy
    pub fn from_config(config: &ForecastConfig) -> Result<Self> {
        Self::new(
            config.lead_time_days,
            config.service_level,
            config.z_score_policy,
        )
    }

    pub fn lead_time_days(&self) -> usize {
        self.lead_time_days
    }

    pub fn z_score(&self) -> f64 {
        self.z_score
    }

    /// Reorder point and safety stock for the forecast demand
    pub fn optimize(&self, trajectory: &ForecastTrajectory) -> Result<InventoryPlan> {
        let values = trajectory.values();
        if values.is_empty() {
            return Err(ForecastError::DataError(
                "Cannot plan inventory from an empty forecast".to_string(),
            ));
        }

        let avg_daily_demand = mean(&values)?;
        let forecast_std = sample_std_dev(&values).unwrap_or(0.0);
        let lead_time = self.lead_time_days as f64;

        let safety_stock = self.z_score * forecast_std * lead_time.sqrt();
        let reorder_point = avg_daily_demand * lead_time + safety_stock;

        if !(reorder_point.is_finite() && safety_stock.is_finite()) {
            return Err(ForecastError::InvariantViolation(format!(
                "Inventory plan is not finite (reorder point {}, safety stock {})",
                reorder_point, safety_stock
            )));
        }

        let plan = InventoryPlan {
            reorder_point,
            safety_stock,
            avg_daily_demand,
            forecast_std,
            z_score: self.z_score,
            lead_time_days: self.lead_time_days,
            service_level: self.service_level,
        };
        info!(
            reorder_point = plan.reorder_point,
            safety_stock = plan.safety_stock,
            avg_daily_demand = plan.avg_daily_demand,
            "Optimized inventory"
        );
        Ok(plan)
    }
}
