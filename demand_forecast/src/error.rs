//! Error types for the demand_forecast crate

use demand_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Malformed or structurally invalid demand data
    #[error("Data error: {0}")]
    DataError(String),

    /// A date or quantity that could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A feature row that does not match the frozen training contract
    #[error(
        "Feature contract mismatch: missing {missing:?}, extra {extra:?}, out of order: {reordered}"
    )]
    ContractMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
        reordered: bool,
    },

    /// Forecasting or inventory planning requested before a model was trained
    #[error("Model has not been trained; call train before forecasting or optimizing")]
    NotTrained,

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Service level outside the supported set of the configured z-score policy
    #[error("Unsupported service level {level}: {reason}")]
    UnsupportedServiceLevel { level: f64, reason: String },

    /// A non-finite number reached a feature row or a prediction
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from CSV writing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

impl ForecastError {
    /// True for errors caused by the input data rather than by configuration or call order
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            ForecastError::DataError(_) | ForecastError::ParseError(_)
        )
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<chrono::ParseError> for ForecastError {
    fn from(err: chrono::ParseError) -> Self {
        ForecastError::ParseError(err.to_string())
    }
}
