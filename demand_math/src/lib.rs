//! # Demand Math
//!
//! Numeric building blocks for demand forecasting and inventory planning.
//! This crate provides descriptive statistics over demand windows, regression
//! accuracy measures and a classical additive seasonal decomposition.

use thiserror::Error;

pub mod accuracy;
pub mod decomposition;
pub mod stats;

/// Errors that can occur in demand-related calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for demand math operations
pub type Result<T> = std::result::Result<T, MathError>;
