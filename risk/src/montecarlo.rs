//! Monte Carlo projection of portfolio value
//!
//! Daily asset returns are drawn from a multivariate normal fitted to the
//! sample mean and covariance of historical series, combined with the
//! portfolio weights and compounded over the horizon. The covariance is
//! factored once with a Cholesky decomposition; a small diagonal ridge is
//! added when the sample matrix is only positive semi-definite.

use crate::config::DEFAULT_WEIGHT_TOLERANCE;
use crate::error::{Result, RiskMetricsError};
use crate::portfolio::compute_covariance_matrix;
use crate::series::{PortfolioWeights, ReturnSeries};
use crate::stats;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Monte Carlo simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Starting portfolio value
    pub initial_investment: f64,

    /// Number of simulated paths
    pub simulations: usize,

    /// Trading days per path
    pub horizon_days: usize,

    /// Minimum historical observations per series
    pub min_observations: usize,

    /// Seed for reproducible paths
    pub seed: u64,

    /// Diagonal ridge added to a covariance matrix that fails to factor
    pub regularization: f64,

    /// Allowed deviation of the weight sum from 1.0
    pub weight_tolerance: f64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            initial_investment: 10_000.0,
            simulations: 10_000,
            horizon_days: 30,
            min_observations: 50,
            seed: 42,
            regularization: 1e-6,
            weight_tolerance: DEFAULT_WEIGHT_TOLERANCE,
        }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_investment.is_finite() && self.initial_investment > 0.0) {
            return Err(RiskMetricsError::InvalidParameter(format!(
                "initial_investment must be positive, got {}",
                self.initial_investment
            )));
        }
        if self.simulations < 2 {
            return Err(RiskMetricsError::InvalidParameter(format!(
                "At least 2 simulations required, got {}",
                self.simulations
            )));
        }
        if self.horizon_days == 0 {
            return Err(RiskMetricsError::InvalidParameter(
                "horizon_days must be positive".to_string(),
            ));
        }
        if !(self.regularization.is_finite() && self.regularization > 0.0) {
            return Err(RiskMetricsError::InvalidParameter(format!(
                "regularization must be positive, got {}",
                self.regularization
            )));
        }
        if !(self.weight_tolerance.is_finite() && self.weight_tolerance >= 0.0) {
            return Err(RiskMetricsError::InvalidParameter(format!(
                "weight_tolerance must be non-negative, got {}",
                self.weight_tolerance
            )));
        }
        Ok(())
    }
}

/// Distribution of simulated final portfolio values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub initial_investment: f64,
    pub simulations: usize,
    pub horizon_days: usize,

    pub mean_final_value: f64,

    /// Population standard deviation of the final values
    pub std_final_value: f64,

    /// (mean_final_value - initial_investment) / initial_investment
    pub expected_return: f64,

    /// 5th percentile of the final values
    pub percentile_5: f64,

    /// initial_investment - percentile_5, as a loss amount
    pub var_95: f64,

    /// initial_investment minus the mean of final values at or below the 5th percentile
    pub cvar_95: f64,

    /// 2.5th and 97.5th percentiles of the final values
    pub confidence_interval_95: (f64, f64),

    /// Fraction of paths ending below the initial investment
    pub probability_loss: f64,

    /// Fraction of paths ending more than 10% above the initial investment
    pub probability_gain_10: f64,

    /// Fraction of paths ending more than 20% above the initial investment
    pub probability_gain_20: f64,

    pub best_case: f64,
    pub worst_case: f64,
}

/// Seeded Monte Carlo simulator
#[derive(Debug, Clone, Default)]
pub struct MonteCarloSimulator {
    config: MonteCarloConfig,
}

impl MonteCarloSimulator {
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Simulate with a generator seeded from the configuration
    ///
    /// # Example
    ///
    /// ```
    /// use ag_riskmetrics::{AssetProfile, MarketSimulator, MonteCarloConfig, MonteCarloSimulator, PortfolioWeights};
    ///
    /// let profiles = [AssetProfile::lookup("AAPL"), AssetProfile::lookup("JNJ")];
    /// let history = MarketSimulator::new(1).generate_portfolio(&profiles, 250).unwrap();
    /// let weights = PortfolioWeights::new(vec![("AAPL", 0.5), ("JNJ", 0.5)]).unwrap();
    ///
    /// let config = MonteCarloConfig { simulations: 500, ..Default::default() };
    /// let result = MonteCarloSimulator::new(config).simulate(&history, &weights).unwrap();
    /// assert!(result.worst_case <= result.percentile_5);
    /// assert!(result.percentile_5 <= result.best_case);
    /// ```
    pub fn simulate(
        &self,
        series: &[ReturnSeries],
        weights: &PortfolioWeights,
    ) -> Result<MonteCarloResult> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.simulate_with_rng(series, weights, &mut rng)
    }

    /// Simulate with a caller-supplied generator
    pub fn simulate_with_rng<R: Rng>(
        &self,
        series: &[ReturnSeries],
        weights: &PortfolioWeights,
        rng: &mut R,
    ) -> Result<MonteCarloResult> {
        self.config.validate()?;

        if weights.len() != series.len() {
            return Err(RiskMetricsError::DimensionMismatch(format!(
                "{} weights for {} return series",
                weights.len(),
                series.len()
            )));
        }
        weights.validate_sum(self.config.weight_tolerance)?;
        if let Some(short) = series
            .iter()
            .find(|s| s.len() < self.config.min_observations)
        {
            return Err(RiskMetricsError::InsufficientData {
                required: self.config.min_observations,
                actual: short.len(),
            });
        }

        let covariance = compute_covariance_matrix(series)?;
        let factor = self.cholesky_factor(covariance)?;
        let n = series.len();
        let means = DVector::from_iterator(n, series.iter().map(|s| stats::mean(s.values())));
        let w = DVector::from_vec(weights.values());

        let initial = self.config.initial_investment;
        let mut final_values = Vec::with_capacity(self.config.simulations);
        for _ in 0..self.config.simulations {
            let mut value = initial;
            for _ in 0..self.config.horizon_days {
                let z: DVector<f64> =
                    DVector::from_iterator(n, (0..n).map(|_| rng.sample(StandardNormal)));
                let returns = &means + &factor * z;
                value *= 1.0 + w.dot(&returns);
            }
            final_values.push(value);
        }

        let result = summarize(&self.config, &final_values);
        debug!(
            simulations = result.simulations,
            horizon_days = result.horizon_days,
            expected_return = result.expected_return,
            var_95 = result.var_95,
            "Completed Monte Carlo simulation"
        );
        Ok(result)
    }

    fn cholesky_factor(&self, covariance: DMatrix<f64>) -> Result<DMatrix<f64>> {
        if let Some(cholesky) = covariance.clone().cholesky() {
            return Ok(cholesky.l());
        }

        let n = covariance.nrows();
        let ridged = covariance + DMatrix::identity(n, n) * self.config.regularization;
        ridged.cholesky().map(|c| c.l()).ok_or_else(|| {
            RiskMetricsError::CalculationError(
                "Covariance matrix is not positive semi-definite".to_string(),
            )
        })
    }
}

fn summarize(config: &MonteCarloConfig, final_values: &[f64]) -> MonteCarloResult {
    let initial = config.initial_investment;
    let count = final_values.len() as f64;
    let sorted = stats::sorted(final_values);

    let mean_final_value = stats::mean(final_values);
    let variance = final_values
        .iter()
        .map(|v| (v - mean_final_value).powi(2))
        .sum::<f64>()
        / count;

    let percentile_5 = stats::percentile_sorted(&sorted, 5.0);
    let tail: Vec<f64> = sorted.iter().copied().take_while(|v| *v <= percentile_5).collect();
    let tail_mean = if tail.is_empty() {
        percentile_5
    } else {
        stats::mean(&tail)
    };

    let fraction = |predicate: &dyn Fn(f64) -> bool| {
        final_values.iter().filter(|v| predicate(**v)).count() as f64 / count
    };

    MonteCarloResult {
        initial_investment: initial,
        simulations: final_values.len(),
        horizon_days: config.horizon_days,
        mean_final_value,
        std_final_value: variance.sqrt(),
        expected_return: (mean_final_value - initial) / initial,
        percentile_5,
        var_95: initial - percentile_5,
        cvar_95: initial - tail_mean,
        confidence_interval_95: (
            stats::percentile_sorted(&sorted, 2.5),
            stats::percentile_sorted(&sorted, 97.5),
        ),
        probability_loss: fraction(&|v| v < initial),
        probability_gain_10: fraction(&|v| v > initial * 1.1),
        probability_gain_20: fraction(&|v| v > initial * 1.2),
        best_case: sorted[sorted.len() - 1],
        worst_case: sorted[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{AssetProfile, MarketSimulator};

    fn history() -> (Vec<ReturnSeries>, PortfolioWeights) {
        let profiles: Vec<_> = ["AAPL", "MSFT", "JNJ"]
            .iter()
            .map(|s| AssetProfile::lookup(s))
            .collect();
        let series = MarketSimulator::new(3).generate_portfolio(&profiles, 300).unwrap();
        let weights =
            PortfolioWeights::new(vec![("AAPL", 0.4), ("MSFT", 0.4), ("JNJ", 0.2)]).unwrap();
        (series, weights)
    }

    fn small_config() -> MonteCarloConfig {
        MonteCarloConfig {
            simulations: 2_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let (series, weights) = history();
        let sim = MonteCarloSimulator::new(small_config());
        let a = sim.simulate(&series, &weights).unwrap();
        let b = sim.simulate(&series, &weights).unwrap();
        assert_eq!(a, b);

        let other = MonteCarloSimulator::new(MonteCarloConfig {
            seed: 7,
            ..small_config()
        });
        assert_ne!(a, other.simulate(&series, &weights).unwrap());
    }

    #[test]
    fn test_result_ordering() {
        let (series, weights) = history();
        let result = MonteCarloSimulator::new(small_config())
            .simulate(&series, &weights)
            .unwrap();

        assert_eq!(result.simulations, 2_000);
        assert!(result.worst_case <= result.confidence_interval_95.0);
        assert!(result.confidence_interval_95.0 <= result.percentile_5);
        assert!(result.percentile_5 <= result.mean_final_value);
        assert!(result.mean_final_value <= result.confidence_interval_95.1);
        assert!(result.confidence_interval_95.1 <= result.best_case);
        assert!(result.cvar_95 >= result.var_95);
        assert!(result.std_final_value > 0.0);
        assert!((0.0..=1.0).contains(&result.probability_loss));
        assert!(result.probability_gain_20 <= result.probability_gain_10);
    }

    #[test]
    fn test_deterministic_history_compounds_mean() {
        // Zero-variance assets: every path compounds the same daily return
        let series = vec![
            ReturnSeries::new(vec![0.001; 60]).unwrap(),
            ReturnSeries::new(vec![0.003; 60]).unwrap(),
        ];
        let weights = PortfolioWeights::from_values(&[0.5, 0.5]).unwrap();
        let config = MonteCarloConfig {
            simulations: 10,
            horizon_days: 10,
            regularization: 1e-20,
            ..Default::default()
        };
        let result = MonteCarloSimulator::new(config).simulate(&series, &weights).unwrap();

        let expected = 10_000.0 * 1.002_f64.powi(10);
        assert!((result.mean_final_value - expected).abs() < 1e-3);
        assert!((result.worst_case - result.best_case).abs() < 1e-3);
        assert_eq!(result.probability_loss, 0.0);
    }

    #[test]
    fn test_caller_supplied_rng() {
        let (series, weights) = history();
        let sim = MonteCarloSimulator::new(small_config());
        let mut rng = StdRng::seed_from_u64(small_config().seed);
        let injected = sim.simulate_with_rng(&series, &weights, &mut rng).unwrap();
        assert_eq!(injected, sim.simulate(&series, &weights).unwrap());
    }

    #[test]
    fn test_validation() {
        let (series, weights) = history();

        let short: Vec<_> = series
            .iter()
            .map(|s| ReturnSeries::new(s.values()[..20].to_vec()).unwrap())
            .collect();
        assert!(matches!(
            MonteCarloSimulator::default().simulate(&short, &weights),
            Err(RiskMetricsError::InsufficientData { required: 50, actual: 20 })
        ));

        let two = PortfolioWeights::from_values(&[0.5, 0.5]).unwrap();
        assert!(matches!(
            MonteCarloSimulator::default().simulate(&series, &two),
            Err(RiskMetricsError::DimensionMismatch(_))
        ));

        let config = MonteCarloConfig {
            initial_investment: 0.0,
            ..Default::default()
        };
        assert!(MonteCarloSimulator::new(config).simulate(&series, &weights).is_err());

        let config = MonteCarloConfig {
            simulations: 1,
            ..Default::default()
        };
        assert!(MonteCarloSimulator::new(config).simulate(&series, &weights).is_err());

        let heavy = PortfolioWeights::from_values(&[0.6, 0.6, 0.2]).unwrap();
        assert!(matches!(
            MonteCarloSimulator::default().simulate(&series, &heavy),
            Err(RiskMetricsError::WeightSum { .. })
        ));
    }
}
