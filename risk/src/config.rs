//! Engine configuration
//!
//! Configuration is plain data, typically loaded from a YAML or JSON
//! document. Every field has a default, so an empty document is valid.

use crate::error::{Result, RiskMetricsError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trading days per year used for annualization
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Default annual risk-free rate
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Default tolerance for the sum of portfolio weights
pub const DEFAULT_WEIGHT_TOLERANCE: f64 = 0.01;

/// Configuration for [`RiskMetricsEngine`](crate::RiskMetricsEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Annual risk-free rate subtracted in Sharpe and Sortino
    pub risk_free_rate: f64,

    /// Periods per year used to annualize mean and volatility
    pub trading_days_per_year: f64,

    /// Allowed deviation of the weight sum from 1.0
    pub weight_tolerance: f64,

    /// Percentile levels (0-100) reported in the distribution summary
    pub distribution_percentiles: Vec<f64>,

    /// Bands used by the qualitative risk assessment
    pub assessment: AssessmentBands,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
            weight_tolerance: DEFAULT_WEIGHT_TOLERANCE,
            distribution_percentiles: vec![1.0, 5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0],
            assessment: AssessmentBands::default(),
        }
    }
}

/// Thresholds for mapping metrics onto risk levels and recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentBands {
    /// Annualized volatility below this is low risk
    pub low_volatility: f64,

    /// Annualized volatility below this (and above `low_volatility`) is medium risk
    pub high_volatility: f64,

    /// Sharpe above this is excellent
    pub excellent_sharpe: f64,

    /// Sharpe above this is good
    pub good_sharpe: f64,

    /// Composite risk scores below this are low risk
    pub low_score: f64,

    /// Composite risk scores below this (and above `low_score`) are medium risk
    pub high_score: f64,
}

impl Default for AssessmentBands {
    fn default() -> Self {
        Self {
            low_volatility: 0.15,
            high_volatility: 0.25,
            excellent_sharpe: 1.0,
            good_sharpe: 0.5,
            low_score: 3.0,
            high_score: 6.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from YAML
    ///
    /// # Example
    ///
    /// ```
    /// use ag_riskmetrics::EngineConfig;
    ///
    /// let yaml = r#"
    /// risk_free_rate: 0.03
    /// weight_tolerance: 0.001
    /// "#;
    ///
    /// let config = EngineConfig::from_yaml(yaml).unwrap();
    /// assert_eq!(config.risk_free_rate, 0.03);
    /// assert_eq!(config.trading_days_per_year, 252.0);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, choosing the format by extension
    ///
    /// `.json` files are parsed as JSON, anything else as YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RiskMetricsError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Return a copy with a different risk-free rate
    pub fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }

    /// Check that every field is usable
    pub fn validate(&self) -> Result<()> {
        if !self.risk_free_rate.is_finite() {
            return Err(RiskMetricsError::Config(format!(
                "risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }

        if !(self.trading_days_per_year.is_finite() && self.trading_days_per_year > 0.0) {
            return Err(RiskMetricsError::Config(format!(
                "trading_days_per_year must be positive, got {}",
                self.trading_days_per_year
            )));
        }

        if !(self.weight_tolerance.is_finite() && self.weight_tolerance >= 0.0) {
            return Err(RiskMetricsError::Config(format!(
                "weight_tolerance must be non-negative, got {}",
                self.weight_tolerance
            )));
        }

        if let Some(level) = self
            .distribution_percentiles
            .iter()
            .find(|p| !(0.0..=100.0).contains(*p))
        {
            return Err(RiskMetricsError::Config(format!(
                "distribution percentile {} outside [0, 100]",
                level
            )));
        }

        let bands = &self.assessment;
        if bands.low_volatility > bands.high_volatility {
            return Err(RiskMetricsError::Config(format!(
                "low_volatility {} exceeds high_volatility {}",
                bands.low_volatility, bands.high_volatility
            )));
        }
        if bands.good_sharpe > bands.excellent_sharpe {
            return Err(RiskMetricsError::Config(format!(
                "good_sharpe {} exceeds excellent_sharpe {}",
                bands.good_sharpe, bands.excellent_sharpe
            )));
        }
        if bands.low_score > bands.high_score {
            return Err(RiskMetricsError::Config(format!(
                "low_score {} exceeds high_score {}",
                bands.low_score, bands.high_score
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.risk_free_rate, 0.02);
        assert_eq!(config.trading_days_per_year, 252.0);
        assert_eq!(config.weight_tolerance, 0.01);
        assert_eq!(config.distribution_percentiles.len(), 9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = EngineConfig::from_yaml("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
risk_free_rate: 0.045
assessment:
  low_volatility: 0.10
"#;
        let config = EngineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.risk_free_rate, 0.045);
        assert_eq!(config.assessment.low_volatility, 0.10);
        assert_eq!(config.assessment.high_volatility, 0.25);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{ "weight_tolerance": 0.001, "distribution_percentiles": [5.0, 95.0] }"#;
        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.weight_tolerance, 0.001);
        assert_eq!(config.distribution_percentiles, vec![5.0, 95.0]);
    }

    #[test]
    fn test_invalid_yaml() {
        let result = EngineConfig::from_yaml("risk_free_rate: [unclosed");
        assert!(matches!(result, Err(RiskMetricsError::Config(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = EngineConfig {
            trading_days_per_year: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            distribution_percentiles: vec![50.0, 120.0],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let yaml = r#"
assessment:
  low_volatility: 0.30
  high_volatility: 0.20
"#;
        assert!(EngineConfig::from_yaml(yaml).is_err());

        let yaml = "assessment: {low_score: 7.0, high_score: 4.0}";
        assert!(EngineConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_with_risk_free_rate() {
        let config = EngineConfig::default().with_risk_free_rate(0.0);
        assert_eq!(config.risk_free_rate, 0.0);
    }
}
