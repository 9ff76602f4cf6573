//! Portfolio return combination and cross-asset analytics
//!
//! Provides:
//! - Weighted combination of aligned return series
//! - Pearson correlation and sample covariance matrices
//! - Covariance-based portfolio volatility σ_p = √(wᵀ Σ w)
//! - Per-asset risk contributions and diversification benefit

use crate::config::EngineConfig;
use crate::error::{Result, RiskMetricsError};
use crate::metrics::{RiskMetricsEngine, RiskMetricsResult, MIN_OBSERVATIONS};
use crate::series::{PortfolioWeights, ReturnSeries};
use crate::stats;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Combine aligned return series into one weighted series
///
/// `combined[t] = Σ_i weights[i] * series[i][t]`. All series must share the
/// same length and the weight count must match the series count. The weight
/// sum is checked against the default tolerance.
///
/// # Example
///
/// ```
/// use ag_riskmetrics::{compute_portfolio_returns, PortfolioWeights, ReturnSeries};
///
/// let a = ReturnSeries::new(vec![0.02, -0.01]).unwrap();
/// let b = ReturnSeries::new(vec![0.00, 0.03]).unwrap();
/// let weights = PortfolioWeights::from_values(&[0.5, 0.5]).unwrap();
///
/// let combined = compute_portfolio_returns(&[a, b], &weights).unwrap();
/// assert!((combined.values()[0] - 0.01).abs() < 1e-12);
/// assert!((combined.values()[1] - 0.01).abs() < 1e-12);
/// ```
pub fn compute_portfolio_returns(
    series: &[ReturnSeries],
    weights: &PortfolioWeights,
) -> Result<ReturnSeries> {
    combine_returns(series, weights, crate::config::DEFAULT_WEIGHT_TOLERANCE)
}

/// Pearson correlation matrix of aligned return series
///
/// Symmetric with a unit diagonal and entries in [-1, 1]. Pairs involving a
/// zero-variance series have no defined correlation and report 0.0.
pub fn compute_correlation_matrix(series: &[ReturnSeries]) -> Result<DMatrix<f64>> {
    validate_aligned(series)?;

    let n = series.len();
    let mut matrix = DMatrix::identity(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let corr = stats::pearson_correlation(series[i].values(), series[j].values());
            matrix[(i, j)] = corr;
            matrix[(j, i)] = corr;
        }
    }

    Ok(matrix)
}

/// Sample covariance matrix (ddof = 1) of aligned return series
pub fn compute_covariance_matrix(series: &[ReturnSeries]) -> Result<DMatrix<f64>> {
    validate_aligned(series)?;

    let n = series.len();
    let mut matrix = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let cov = stats::sample_covariance(series[i].values(), series[j].values());
            matrix[(i, j)] = cov;
            matrix[(j, i)] = cov;
        }
    }

    Ok(matrix)
}

/// Portfolio performance relative to a benchmark return series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    /// Cov(portfolio, benchmark) / Var(benchmark), 1.0 for a flat benchmark
    pub beta: f64,

    /// Annualized mean of portfolio minus benchmark returns
    pub active_return: f64,

    /// Annualized sample standard deviation of the active returns
    pub tracking_error: f64,

    /// active_return / tracking_error, 0 when the tracking error is 0
    pub information_ratio: f64,
}

/// Compare a portfolio return series with a benchmark series
///
/// # Example
///
/// ```
/// use ag_riskmetrics::compute_benchmark_metrics;
///
/// let market = [0.01, -0.02, 0.015, 0.005, -0.01];
/// let levered: Vec<f64> = market.iter().map(|r| 2.0 * r).collect();
///
/// let relative = compute_benchmark_metrics(&levered, &market, 252.0).unwrap();
/// assert!((relative.beta - 2.0).abs() < 1e-12);
/// ```
pub fn compute_benchmark_metrics(
    portfolio: &[f64],
    benchmark: &[f64],
    periods_per_year: f64,
) -> Result<BenchmarkMetrics> {
    if portfolio.len() != benchmark.len() {
        return Err(RiskMetricsError::DimensionMismatch(format!(
            "Portfolio has {} observations, benchmark has {}",
            portfolio.len(),
            benchmark.len()
        )));
    }
    if portfolio.len() < MIN_OBSERVATIONS {
        return Err(RiskMetricsError::InsufficientData {
            required: MIN_OBSERVATIONS,
            actual: portfolio.len(),
        });
    }
    if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
        return Err(RiskMetricsError::InvalidParameter(format!(
            "periods_per_year must be positive, got {}",
            periods_per_year
        )));
    }

    let benchmark_std = stats::sample_std(benchmark);
    let beta = if benchmark_std > 0.0 {
        stats::sample_covariance(portfolio, benchmark) / (benchmark_std * benchmark_std)
    } else {
        1.0
    };

    let active: Vec<f64> = portfolio.iter().zip(benchmark).map(|(p, b)| p - b).collect();
    let active_return = stats::mean(&active) * periods_per_year;
    let tracking_error = stats::sample_std(&active) * periods_per_year.sqrt();
    let information_ratio = if tracking_error > 0.0 {
        active_return / tracking_error
    } else {
        0.0
    };

    Ok(BenchmarkMetrics {
        beta,
        active_return,
        tracking_error,
        information_ratio,
    })
}

/// Equal-weight average of aligned series, the default portfolio benchmark
fn equal_weight_benchmark(series: &[ReturnSeries]) -> Vec<f64> {
    let n = series.len() as f64;
    let mut benchmark = vec![0.0; series.first().map_or(0, ReturnSeries::len)];
    for s in series {
        for (total, r) in benchmark.iter_mut().zip(s.values()) {
            *total += r / n;
        }
    }
    benchmark
}

/// Risk figures for one asset in a portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetContribution {
    /// Asset identifier from the weights
    pub asset_id: String,

    pub weight: f64,
    pub annualized_volatility: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,

    /// weight × annualized volatility
    pub risk_contribution: f64,
}

/// Full portfolio analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    /// Metrics of the combined return series
    pub metrics: RiskMetricsResult,

    /// Asset identifiers in matrix order
    pub assets: Vec<String>,

    /// Pearson correlation matrix, row-major
    pub correlation_matrix: Vec<Vec<f64>>,

    /// √(wᵀ Σ w) × √(trading days)
    pub covariance_volatility: f64,

    pub components: Vec<AssetContribution>,

    /// 1 - portfolio volatility / Σ wᵢσᵢ
    pub diversification_benefit: f64,

    /// Beta, tracking error and information ratio against the equal-weight
    /// average of the input series
    pub benchmark: BenchmarkMetrics,
}

/// Portfolio risk analyzer
#[derive(Debug, Clone, Default)]
pub struct PortfolioAnalyzer {
    engine: RiskMetricsEngine,
}

impl PortfolioAnalyzer {
    /// Create an analyzer with the given engine configuration
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: RiskMetricsEngine::new(config),
        }
    }

    /// Create an analyzer sharing an existing engine's configuration
    pub fn with_engine(engine: RiskMetricsEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &RiskMetricsEngine {
        &self.engine
    }

    /// Combine series using the configured weight tolerance
    pub fn combine(
        &self,
        series: &[ReturnSeries],
        weights: &PortfolioWeights,
    ) -> Result<ReturnSeries> {
        combine_returns(series, weights, self.engine.config().weight_tolerance)
    }

    /// Analyze a weighted portfolio of aligned return series
    pub fn analyze(
        &self,
        series: &[ReturnSeries],
        weights: &PortfolioWeights,
    ) -> Result<PortfolioReport> {
        let combined = self.combine(series, weights)?;
        let metrics = self.engine.compute_metrics(&combined)?;

        let correlation = compute_correlation_matrix(series)?;
        let covariance = compute_covariance_matrix(series)?;

        let w = DVector::from_vec(weights.values());
        let variance = (&w.transpose() * &covariance * &w)[(0, 0)];
        if variance < -f64::EPSILON {
            return Err(RiskMetricsError::CalculationError(format!(
                "Negative portfolio variance: {}",
                variance
            )));
        }
        let covariance_volatility =
            variance.max(0.0).sqrt() * self.engine.config().trading_days_per_year.sqrt();

        let mut components = Vec::with_capacity(series.len());
        for (s, entry) in series.iter().zip(weights.entries()) {
            let asset = self.engine.compute_metrics(s)?;
            components.push(AssetContribution {
                asset_id: entry.asset_id.clone(),
                weight: entry.weight,
                annualized_volatility: asset.annualized_volatility,
                annualized_return: asset.annualized_return,
                sharpe_ratio: asset.sharpe_ratio,
                risk_contribution: entry.weight * asset.annualized_volatility,
            });
        }

        let weighted_volatility: f64 = components.iter().map(|c| c.risk_contribution).sum();
        let diversification_benefit = if weighted_volatility > 0.0 {
            1.0 - metrics.annualized_volatility / weighted_volatility
        } else {
            0.0
        };

        let benchmark = compute_benchmark_metrics(
            combined.values(),
            &equal_weight_benchmark(series),
            self.engine.config().trading_days_per_year,
        )?;

        let report = PortfolioReport {
            metrics,
            assets: weights.entries().iter().map(|e| e.asset_id.clone()).collect(),
            correlation_matrix: matrix_rows(&correlation),
            covariance_volatility,
            components,
            diversification_benefit,
            benchmark,
        };

        debug!(
            assets = report.assets.len(),
            observations = report.metrics.total_days,
            volatility = report.metrics.annualized_volatility,
            diversification = report.diversification_benefit,
            beta = report.benchmark.beta,
            "Analyzed portfolio"
        );

        Ok(report)
    }
}

fn combine_returns(
    series: &[ReturnSeries],
    weights: &PortfolioWeights,
    tolerance: f64,
) -> Result<ReturnSeries> {
    if series.is_empty() {
        return Err(RiskMetricsError::InvalidParameter(
            "No return series provided".to_string(),
        ));
    }

    if weights.len() != series.len() {
        warn!(
            weights = weights.len(),
            series = series.len(),
            "Rejected portfolio with mismatched weights"
        );
        return Err(RiskMetricsError::DimensionMismatch(format!(
            "{} weights for {} return series",
            weights.len(),
            series.len()
        )));
    }

    if let Err(err) = weights.validate_sum(tolerance) {
        warn!(sum = weights.sum(), tolerance, "Rejected portfolio weights");
        return Err(err);
    }

    let len = series[0].len();
    if let Some((index, s)) = series.iter().enumerate().find(|(_, s)| s.len() != len) {
        return Err(RiskMetricsError::DimensionMismatch(format!(
            "Series {} has {} observations, expected {}",
            index,
            s.len(),
            len
        )));
    }

    let mut combined = vec![0.0; len];
    for (s, w) in series.iter().zip(weights.values()) {
        for (total, r) in combined.iter_mut().zip(s.values()) {
            *total += w * r;
        }
    }

    ReturnSeries::new(combined)
}

fn validate_aligned(series: &[ReturnSeries]) -> Result<()> {
    let first = series.first().ok_or_else(|| {
        RiskMetricsError::InvalidParameter("No return series provided".to_string())
    })?;

    let len = first.len();
    if len < MIN_OBSERVATIONS {
        return Err(RiskMetricsError::InsufficientData {
            required: MIN_OBSERVATIONS,
            actual: len,
        });
    }

    if let Some((index, s)) = series.iter().enumerate().find(|(_, s)| s.len() != len) {
        return Err(RiskMetricsError::DimensionMismatch(format!(
            "Series {} has {} observations, expected {}",
            index,
            s.len(),
            len
        )));
    }

    Ok(())
}

fn matrix_rows(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}
