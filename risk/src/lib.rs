//! # ag-riskmetrics: Return-Series Risk Metrics
//!
//! This library computes a fixed bundle of descriptive and tail-risk
//! statistics from periodic return series, for single assets and for
//! weighted portfolios of aligned series.
//!
//! ## Core Components
//!
//! - **RiskMetricsEngine**: volatility, Sharpe/Sortino, VaR/CVaR, drawdown, moments
//! - **PortfolioAnalyzer**: weighted combination, correlation, risk contributions
//! - **RiskAssessment**: qualitative risk level and recommendation
//! - **RiskScore**: weighted 0-10 score over volatility, drawdown, VaR and moments
//! - **MonteCarloSimulator**: seeded projection of portfolio value
//! - **MarketSimulator**: seeded synthetic data for demos and tests
//!
//! All computations are deterministic and side-effect free. Invalid input
//! (too few observations, mismatched dimensions, weights not summing to 1)
//! is rejected with a [`RiskMetricsError`] rather than patched with defaults.
//!
//! ## Example Usage
//!
//! ```rust
//! use ag_riskmetrics::{PortfolioAnalyzer, PortfolioWeights, ReturnSeries, RiskMetricsEngine};
//!
//! let engine = RiskMetricsEngine::default();
//! let series = ReturnSeries::with_symbol("AAPL", vec![0.05, -0.03, 0.02, -0.04, 0.01]).unwrap();
//!
//! let result = engine.compute_metrics(&series).unwrap();
//! assert!(result.var_99 >= result.var_95);
//! assert!(result.cvar_95 >= result.var_95);
//!
//! let other = ReturnSeries::with_symbol("MSFT", vec![0.01, 0.00, 0.02, -0.01, 0.01]).unwrap();
//! let weights = PortfolioWeights::new(vec![("AAPL", 0.6), ("MSFT", 0.4)]).unwrap();
//!
//! let report = PortfolioAnalyzer::default().analyze(&[series, other], &weights).unwrap();
//! assert_eq!(report.correlation_matrix.len(), 2);
//! ```

pub mod assessment;
pub mod config;
pub mod drawdown;
pub mod error;
pub mod metrics;
pub mod montecarlo;
pub mod portfolio;
pub mod series;
pub mod simulation;
pub mod stats;

pub use assessment::{Recommendation, RiskAssessment, RiskLevel, RiskScore, ScoreComponents};
pub use config::{AssessmentBands, EngineConfig, TRADING_DAYS_PER_YEAR};
pub use drawdown::DrawdownStats;
pub use error::{Result, RiskMetricsError};
pub use metrics::{
    compute_metrics, conditional_value_at_risk, value_at_risk, DistributionSummary,
    PercentilePoint, RiskMetricsEngine, RiskMetricsResult,
};
pub use montecarlo::{MonteCarloConfig, MonteCarloResult, MonteCarloSimulator};
pub use portfolio::{
    compute_benchmark_metrics, compute_correlation_matrix, compute_covariance_matrix,
    compute_portfolio_returns, AssetContribution, BenchmarkMetrics, PortfolioAnalyzer,
    PortfolioReport,
};
pub use series::{PortfolioWeights, ReturnSeries, WeightEntry};
pub use simulation::{AssetProfile, MarketSimulator, PricePoint};
pub use stats::NormalityTest;
