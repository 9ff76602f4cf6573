//! Risk metrics engine
//!
//! Computes the full metric bundle for a single return series:
//! - Annualized volatility and mean return
//! - Sharpe and Sortino ratios (0 when the risk denominator is 0)
//! - Historical VaR and CVaR at 95% and 99%, as positive loss magnitudes
//! - Maximum drawdown with peak/trough location
//! - Skewness, excess kurtosis and a normality test
//! - Up/down day counts and the return distribution grid

use crate::config::EngineConfig;
use crate::drawdown::{self, DrawdownStats};
use crate::error::{Result, RiskMetricsError};
use crate::series::ReturnSeries;
use crate::stats::{self, NormalityTest};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Minimum number of observations for any computation
pub const MIN_OBSERVATIONS: usize = 2;

/// Value at a percentile level of the return distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentilePoint {
    /// Level in [0, 100]
    pub level: f64,

    /// Raw (signed) return at that level
    pub value: f64,
}

/// Shape of the return distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub min: f64,
    pub max: f64,
    pub percentiles: Vec<PercentilePoint>,
}

/// Metrics computed from one return series
///
/// VaR, CVaR and max drawdown are loss magnitudes: larger is worse, and a
/// value of 0 means no loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetricsResult {
    /// Label of the input series, if any
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub symbol: Option<String>,

    /// Sample standard deviation × √(trading days)
    pub annualized_volatility: f64,

    /// Arithmetic mean × trading days
    pub annualized_return: f64,

    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,

    /// Annualized standard deviation of the strictly negative returns
    pub downside_deviation: f64,

    pub var_95: f64,
    pub var_99: f64,
    pub cvar_95: f64,
    pub cvar_99: f64,

    pub max_drawdown: f64,
    pub drawdown: DrawdownStats,

    pub skewness: f64,

    /// Fourth standardized moment minus 3 (normal = 0)
    pub excess_kurtosis: f64,

    /// Unannualized mean return
    pub daily_mean: f64,

    /// Unannualized sample standard deviation
    pub daily_std: f64,

    pub positive_days: usize,
    pub negative_days: usize,
    pub total_days: usize,

    /// positive_days / total_days
    pub win_rate: f64,

    pub distribution: DistributionSummary,

    /// `None` when the series is too short or has no variance
    pub normality: Option<NormalityTest>,
}

/// Stateless risk metrics calculator
///
/// The engine only holds configuration, so it is `Send + Sync` and may be
/// shared across threads without locking.
#[derive(Debug, Clone, Default)]
pub struct RiskMetricsEngine {
    config: EngineConfig,
}

impl RiskMetricsEngine {
    /// Create an engine from a configuration
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Create an engine from a YAML configuration document
    ///
    /// # Example
    ///
    /// ```
    /// use ag_riskmetrics::RiskMetricsEngine;
    ///
    /// let engine = RiskMetricsEngine::from_yaml("risk_free_rate: 0.0").unwrap();
    /// assert_eq!(engine.config().risk_free_rate, 0.0);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(Self::new(EngineConfig::from_yaml(yaml)?))
    }

    /// Create an engine from a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(EngineConfig::from_json(json)?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute the metric bundle for a return series
    ///
    /// # Example
    ///
    /// ```
    /// use ag_riskmetrics::{ReturnSeries, RiskMetricsEngine};
    ///
    /// let engine = RiskMetricsEngine::default();
    /// let series = ReturnSeries::new(vec![0.05, -0.03, 0.02, -0.04, 0.01]).unwrap();
    ///
    /// let result = engine.compute_metrics(&series).unwrap();
    /// assert!((result.var_95 - 0.038).abs() < 1e-9);
    /// assert_eq!(result.total_days, 5);
    /// ```
    pub fn compute_metrics(&self, series: &ReturnSeries) -> Result<RiskMetricsResult> {
        if let Err(err) = self.config.validate() {
            warn!(symbol = ?series.symbol(), error = %err, "Rejected engine configuration");
            return Err(err);
        }

        let returns = series.values();
        if returns.len() < MIN_OBSERVATIONS {
            warn!(
                symbol = ?series.symbol(),
                observations = returns.len(),
                "Rejected series with insufficient observations"
            );
            return Err(RiskMetricsError::InsufficientData {
                required: MIN_OBSERVATIONS,
                actual: returns.len(),
            });
        }

        let periods = self.config.trading_days_per_year;
        let annualizer = periods.sqrt();

        let daily_mean = stats::mean(returns);
        let daily_std = stats::sample_std(returns);
        let annualized_return = daily_mean * periods;
        let annualized_volatility = daily_std * annualizer;
        let excess_return = annualized_return - self.config.risk_free_rate;

        let sharpe_ratio = if annualized_volatility > 0.0 {
            excess_return / annualized_volatility
        } else {
            0.0
        };

        let negatives: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let downside_deviation = stats::sample_std(&negatives) * annualizer;
        let sortino_ratio = if downside_deviation > 0.0 {
            excess_return / downside_deviation
        } else {
            0.0
        };

        let sorted = stats::sorted(returns);
        let (var_95, cvar_95) = tail_risk(returns, &sorted, 0.95);
        let (var_99, cvar_99) = tail_risk(returns, &sorted, 0.99);

        let drawdown = drawdown::analyze(returns);

        let positive_days = returns.iter().filter(|r| **r > 0.0).count();
        let negative_days = negatives.len();
        let total_days = returns.len();

        let distribution = DistributionSummary {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            percentiles: self
                .config
                .distribution_percentiles
                .iter()
                .map(|&level| PercentilePoint {
                    level,
                    value: stats::percentile_sorted(&sorted, level),
                })
                .collect(),
        };

        let result = RiskMetricsResult {
            symbol: series.symbol().map(str::to_string),
            annualized_volatility,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            downside_deviation,
            var_95,
            var_99,
            cvar_95,
            cvar_99,
            max_drawdown: drawdown.max_drawdown,
            drawdown,
            skewness: stats::skewness(returns),
            excess_kurtosis: stats::excess_kurtosis(returns),
            daily_mean,
            daily_std,
            positive_days,
            negative_days,
            total_days,
            win_rate: positive_days as f64 / total_days as f64,
            distribution,
            normality: stats::normality_test(returns),
        };

        ensure_finite(&result)?;

        debug!(
            symbol = ?result.symbol,
            observations = total_days,
            volatility = result.annualized_volatility,
            sharpe = result.sharpe_ratio,
            var_95 = result.var_95,
            max_drawdown = result.max_drawdown,
            "Computed risk metrics"
        );

        Ok(result)
    }

    /// Compute metrics for several independent series
    ///
    /// Each result is computed in isolation; one failing series does not
    /// affect the others. Output order matches input order.
    pub fn compute_batch(&self, series: &[ReturnSeries]) -> Vec<Result<RiskMetricsResult>> {
        series.iter().map(|s| self.compute_metrics(s)).collect()
    }

    /// Compute metrics for several series on the blocking thread pool
    ///
    /// Output order matches input order.
    #[cfg(feature = "async")]
    pub async fn compute_batch_async(
        &self,
        series: Vec<ReturnSeries>,
    ) -> Vec<Result<RiskMetricsResult>> {
        let handles: Vec<_> = series
            .into_iter()
            .map(|s| {
                let engine = self.clone();
                tokio::task::spawn_blocking(move || engine.compute_metrics(&s))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = handle
                .await
                .unwrap_or_else(|e| Err(RiskMetricsError::CalculationError(e.to_string())));
            results.push(result);
        }
        results
    }
}

/// Compute metrics with default configuration and the given risk-free rate
///
/// A non-finite `risk_free_rate` is rejected with [`RiskMetricsError::Config`].
pub fn compute_metrics(series: &ReturnSeries, risk_free_rate: f64) -> Result<RiskMetricsResult> {
    let config = EngineConfig::default().with_risk_free_rate(risk_free_rate);
    RiskMetricsEngine::new(config).compute_metrics(series)
}

/// Historical VaR at `confidence` as a positive loss magnitude
///
/// The threshold is the `(1 - confidence)` percentile of the returns with
/// linear interpolation.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> Result<f64> {
    validate_tail_inputs(returns, confidence)?;
    let sorted = stats::sorted(returns);
    Ok(tail_risk(returns, &sorted, confidence).0)
}

/// Historical CVaR (expected shortfall) at `confidence` as a positive loss magnitude
///
/// Mean of all returns at or below the VaR threshold, falling back to VaR
/// itself when that set is empty.
pub fn conditional_value_at_risk(returns: &[f64], confidence: f64) -> Result<f64> {
    validate_tail_inputs(returns, confidence)?;
    let sorted = stats::sorted(returns);
    Ok(tail_risk(returns, &sorted, confidence).1)
}

fn validate_tail_inputs(returns: &[f64], confidence: f64) -> Result<()> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(RiskMetricsError::InvalidConfidenceLevel(confidence));
    }
    if returns.len() < MIN_OBSERVATIONS {
        return Err(RiskMetricsError::InsufficientData {
            required: MIN_OBSERVATIONS,
            actual: returns.len(),
        });
    }
    Ok(())
}

/// Reject a bundle whose headline figures overflowed
fn ensure_finite(result: &RiskMetricsResult) -> Result<()> {
    let fields = [
        ("annualized_volatility", result.annualized_volatility),
        ("annualized_return", result.annualized_return),
        ("sharpe_ratio", result.sharpe_ratio),
        ("sortino_ratio", result.sortino_ratio),
        ("downside_deviation", result.downside_deviation),
        ("var_95", result.var_95),
        ("var_99", result.var_99),
        ("cvar_95", result.cvar_95),
        ("cvar_99", result.cvar_99),
        ("max_drawdown", result.max_drawdown),
        ("skewness", result.skewness),
        ("excess_kurtosis", result.excess_kurtosis),
    ];

    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, value)) => {
            warn!(symbol = ?result.symbol, field = *name, "Non-finite metric");
            Err(RiskMetricsError::CalculationError(format!(
                "{} is not finite ({}); returns are out of range",
                name, value
            )))
        }
        None => Ok(()),
    }
}

/// (VaR, CVaR) pair at a confidence level, both as loss magnitudes
fn tail_risk(returns: &[f64], sorted: &[f64], confidence: f64) -> (f64, f64) {
    let threshold = stats::percentile_sorted(sorted, (1.0 - confidence) * 100.0);
    let var = -threshold;

    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= threshold).collect();
    let cvar = if tail.is_empty() {
        var
    } else {
        -stats::mean(&tail)
    };

    (var, cvar)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_returns() -> Vec<f64> {
        vec![
            0.01, 0.02, -0.01, 0.015, -0.005,
            0.03, -0.02, 0.01, 0.005, -0.01,
            0.02, 0.01, -0.015, 0.025, 0.01,
            -0.005, 0.015, 0.02, -0.01, 0.005,
        ]
    }

    fn series(values: Vec<f64>) -> ReturnSeries {
        ReturnSeries::new(values).unwrap()
    }

    #[test]
    fn test_reference_values() {
        let engine = RiskMetricsEngine::default();
        let result = engine
            .compute_metrics(&series(vec![0.05, -0.03, 0.02, -0.04, 0.01]))
            .unwrap();

        let daily_std = 0.00137_f64.sqrt();
        assert!((result.daily_mean - 0.002).abs() < 1e-12);
        assert!((result.annualized_return - 0.504).abs() < 1e-12);
        assert!((result.annualized_volatility - daily_std * 252.0_f64.sqrt()).abs() < 1e-12);
        assert!(
            (result.sharpe_ratio - (0.504 - 0.02) / (daily_std * 252.0_f64.sqrt())).abs() < 1e-9
        );

        assert!((result.var_95 - 0.038).abs() < 1e-9);
        assert!((result.var_99 - 0.0396).abs() < 1e-9);
        assert!((result.cvar_95 - 0.04).abs() < 1e-12);
        assert!((result.cvar_99 - 0.04).abs() < 1e-12);

        assert_eq!(result.positive_days, 3);
        assert_eq!(result.negative_days, 2);
        assert_eq!(result.total_days, 5);
        assert!((result.win_rate - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_sortino_uses_negative_returns() {
        let engine = RiskMetricsEngine::default();
        let result = engine
            .compute_metrics(&series(vec![0.05, -0.03, 0.02, -0.04, 0.01]))
            .unwrap();

        // Negative returns -0.03, -0.04: sample std = 0.005 * √2
        let downside = 0.005 * 2.0_f64.sqrt() * 252.0_f64.sqrt();
        assert!((result.downside_deviation - downside).abs() < 1e-12);
        assert!((result.sortino_ratio - (0.504 - 0.02) / downside).abs() < 1e-9);
    }

    #[test]
    fn test_zero_volatility() {
        let engine = RiskMetricsEngine::default();
        let result = engine.compute_metrics(&series(vec![0.01; 5])).unwrap();

        assert_eq!(result.annualized_volatility, 0.0);
        assert_eq!(result.sharpe_ratio, 0.0);
        assert_eq!(result.sortino_ratio, 0.0);
        assert_eq!(result.skewness, 0.0);
        assert_eq!(result.excess_kurtosis, 0.0);
        assert!(result.normality.is_none());
    }

    #[test]
    fn test_no_negative_returns_sortino_zero() {
        let engine = RiskMetricsEngine::default();
        let result = engine
            .compute_metrics(&series(vec![0.01, 0.02, 0.005, 0.03]))
            .unwrap();

        assert!(result.sharpe_ratio > 0.0);
        assert_eq!(result.sortino_ratio, 0.0);
        assert_eq!(result.max_drawdown, 0.0);
    }

    #[test]
    fn test_single_negative_return_sortino_zero() {
        let engine = RiskMetricsEngine::default();
        let result = engine
            .compute_metrics(&series(vec![0.01, -0.02, 0.03]))
            .unwrap();
        assert_eq!(result.downside_deviation, 0.0);
        assert_eq!(result.sortino_ratio, 0.0);
    }

    #[test]
    fn test_insufficient_data() {
        let engine = RiskMetricsEngine::default();

        let err = engine.compute_metrics(&series(vec![0.01])).unwrap_err();
        assert_eq!(err, RiskMetricsError::InsufficientData { required: 2, actual: 1 });

        assert!(engine.compute_metrics(&series(vec![])).is_err());
    }

    #[test]
    fn test_tail_ordering() {
        let engine = RiskMetricsEngine::default();
        let result = engine.compute_metrics(&series(create_test_returns())).unwrap();

        assert!(result.var_95 > 0.0);
        assert!(result.var_99 >= result.var_95);
        assert!(result.cvar_95 >= result.var_95);
        assert!(result.cvar_99 >= result.var_99);
    }

    #[test]
    fn test_risk_free_rate_shifts_sharpe() {
        let returns = series(create_test_returns());
        let low = compute_metrics(&returns, 0.0).unwrap();
        let high = compute_metrics(&returns, 0.05).unwrap();

        assert!(low.sharpe_ratio > high.sharpe_ratio);
        assert_eq!(low.annualized_volatility, high.annualized_volatility);
        assert_eq!(low.var_95, high.var_95);
    }

    #[test]
    fn test_deterministic() {
        let engine = RiskMetricsEngine::default();
        let returns = series(create_test_returns());
        let a = engine.compute_metrics(&returns).unwrap();
        let b = engine.compute_metrics(&returns).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_symbol_carried_through() {
        let engine = RiskMetricsEngine::default();
        let returns = ReturnSeries::with_symbol("JPM", create_test_returns()).unwrap();
        let result = engine.compute_metrics(&returns).unwrap();
        assert_eq!(result.symbol.as_deref(), Some("JPM"));
    }

    #[test]
    fn test_distribution_summary() {
        let engine = RiskMetricsEngine::default();
        let result = engine
            .compute_metrics(&series(vec![0.05, -0.03, 0.02, -0.04, 0.01]))
            .unwrap();

        let dist = &result.distribution;
        assert_eq!(dist.min, -0.04);
        assert_eq!(dist.max, 0.05);
        assert_eq!(dist.percentiles.len(), 9);
        assert_eq!(dist.percentiles[4].level, 50.0);
        assert!((dist.percentiles[4].value - 0.01).abs() < 1e-12);
        assert!((dist.percentiles[1].value - (-0.038)).abs() < 1e-12);
    }

    #[test]
    fn test_custom_annualization() {
        let config = EngineConfig {
            trading_days_per_year: 365.0,
            ..Default::default()
        };
        let engine = RiskMetricsEngine::new(config);
        let result = engine
            .compute_metrics(&series(vec![0.05, -0.03, 0.02, -0.04, 0.01]))
            .unwrap();
        assert!((result.annualized_return - 0.002 * 365.0).abs() < 1e-12);
    }

    #[test]
    fn test_batch_isolates_failures() {
        let engine = RiskMetricsEngine::default();
        let batch = vec![
            series(create_test_returns()),
            series(vec![0.01]),
            series(vec![0.01, 0.02]),
        ];

        let results = engine.compute_batch(&batch);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_value_at_risk_functions() {
        let returns = [0.05, -0.03, 0.02, -0.04, 0.01];
        assert!((value_at_risk(&returns, 0.95).unwrap() - 0.038).abs() < 1e-9);
        assert!((conditional_value_at_risk(&returns, 0.95).unwrap() - 0.04).abs() < 1e-12);

        assert!(matches!(
            value_at_risk(&returns, 1.5),
            Err(RiskMetricsError::InvalidConfidenceLevel(_))
        ));
        assert!(value_at_risk(&returns, 0.0).is_err());
        assert!(value_at_risk(&[0.01], 0.95).is_err());
    }

    #[test]
    fn test_all_positive_returns_report_negative_var() {
        // The 5th percentile is a gain, so the "loss" magnitude is negative
        let returns = [0.01, 0.02, 0.03, 0.04, 0.05];
        let var = value_at_risk(&returns, 0.95).unwrap();
        assert!((var - (-0.012)).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_risk_free_rate_rejected() {
        let returns = series(create_test_returns());
        assert!(matches!(
            compute_metrics(&returns, f64::NAN),
            Err(RiskMetricsError::Config(_))
        ));
        assert!(compute_metrics(&returns, f64::INFINITY).is_err());
    }

    #[test]
    fn test_invalid_engine_config_rejected() {
        let config = EngineConfig {
            trading_days_per_year: -252.0,
            ..Default::default()
        };
        let engine = RiskMetricsEngine::new(config);
        assert!(matches!(
            engine.compute_metrics(&series(create_test_returns())),
            Err(RiskMetricsError::Config(_))
        ));
    }

    #[test]
    fn test_overflowing_returns_rejected() {
        let engine = RiskMetricsEngine::default();
        let result = engine.compute_metrics(&series(vec![1e200, -1e200, 1e200]));
        assert!(matches!(result, Err(RiskMetricsError::CalculationError(_))));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_batch_async_preserves_order() {
        let engine = RiskMetricsEngine::default();
        let batch = vec![
            ReturnSeries::with_symbol("A", create_test_returns()).unwrap(),
            ReturnSeries::with_symbol("B", vec![0.01]).unwrap(),
            ReturnSeries::with_symbol("C", vec![0.05, -0.03, 0.02]).unwrap(),
        ];

        let results = engine.compute_batch_async(batch).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().symbol.as_deref(), Some("A"));
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().symbol.as_deref(), Some("C"));
    }
}
