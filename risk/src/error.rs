//! Error types for risk metric computation

use thiserror::Error;

/// Errors surfaced at the engine boundary
///
/// Numeric edge cases with a conventional answer (zero volatility, an empty
/// CVaR tail) are resolved inside the engine and never reach this type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskMetricsError {
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Portfolio weights sum to {sum:.6}, expected 1.0 within ±{tolerance}")]
    WeightSum { sum: f64, tolerance: f64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid confidence level: {0} (must be between 0 and 1)")]
    InvalidConfidenceLevel(f64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

impl From<serde_yaml::Error> for RiskMetricsError {
    fn from(err: serde_yaml::Error) -> Self {
        RiskMetricsError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RiskMetricsError {
    fn from(err: serde_json::Error) -> Self {
        RiskMetricsError::Config(err.to_string())
    }
}

/// Result type for risk metric operations
pub type Result<T> = std::result::Result<T, RiskMetricsError>;
