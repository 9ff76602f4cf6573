//! Return series and portfolio weights

use crate::error::{Result, RiskMetricsError};
use serde::{Deserialize, Serialize};

/// Ordered sequence of periodic fractional returns
///
/// Values are guaranteed finite. Length is not checked here; the engine
/// rejects series too short for the statistics it computes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    /// Display label (e.g. ticker symbol)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    symbol: Option<String>,

    values: Vec<f64>,
}

impl ReturnSeries {
    /// Create a series from raw returns
    ///
    /// # Example
    ///
    /// ```
    /// use ag_riskmetrics::ReturnSeries;
    ///
    /// let series = ReturnSeries::new(vec![0.01, -0.02, 0.015]).unwrap();
    /// assert_eq!(series.len(), 3);
    ///
    /// assert!(ReturnSeries::new(vec![0.01, f64::NAN]).is_err());
    /// ```
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(RiskMetricsError::InvalidParameter(format!(
                "Return at index {} is not finite: {}",
                index, values[index]
            )));
        }

        Ok(Self {
            symbol: None,
            values,
        })
    }

    /// Create a labelled series
    pub fn with_symbol(symbol: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let mut series = Self::new(values)?;
        series.symbol = Some(symbol.into());
        Ok(series)
    }

    /// Difference a price series into simple returns
    ///
    /// `r[t] = p[t+1] / p[t] - 1`, so `n` prices yield `n - 1` returns.
    pub fn from_prices(prices: &[f64]) -> Result<Self> {
        if prices.len() < 2 {
            return Err(RiskMetricsError::InsufficientData {
                required: 2,
                actual: prices.len(),
            });
        }

        if let Some(index) = prices.iter().position(|p| !(p.is_finite() && *p > 0.0)) {
            return Err(RiskMetricsError::InvalidParameter(format!(
                "Price at index {} must be positive and finite, got {}",
                index, prices[index]
            )));
        }

        let returns = prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
        Self::new(returns)
    }

    /// Attach or replace the display label
    pub fn labelled(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Single weight entry in a portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    /// Asset identifier
    pub asset_id: String,

    /// Non-negative weight
    pub weight: f64,
}

/// Ordered asset weights of a portfolio
///
/// Entry order matches the order of the return series the weights are
/// applied to. Weights are non-negative; the sum-to-one invariant is
/// checked against a tolerance with [`PortfolioWeights::validate_sum`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioWeights {
    entries: Vec<WeightEntry>,
}

impl PortfolioWeights {
    /// Create weights from `(asset_id, weight)` pairs
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = (S, f64)>) -> Result<Self> {
        let entries: Vec<WeightEntry> = entries
            .into_iter()
            .map(|(asset_id, weight)| WeightEntry {
                asset_id: asset_id.into(),
                weight,
            })
            .collect();

        if let Some(entry) = entries
            .iter()
            .find(|e| !(e.weight.is_finite() && e.weight >= 0.0))
        {
            return Err(RiskMetricsError::InvalidParameter(format!(
                "Weight for {} must be non-negative and finite, got {}",
                entry.asset_id, entry.weight
            )));
        }

        Ok(Self { entries })
    }

    /// Create weights for unnamed assets, labelled `asset_0`, `asset_1`, ...
    pub fn from_values(weights: &[f64]) -> Result<Self> {
        Self::new(
            weights
                .iter()
                .enumerate()
                .map(|(i, w)| (format!("asset_{}", i), *w)),
        )
    }

    /// Check that the weights sum to 1.0 within `tolerance`
    pub fn validate_sum(&self, tolerance: f64) -> Result<()> {
        let sum = self.sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(RiskMetricsError::WeightSum { sum, tolerance });
        }
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.weight).collect()
    }

    pub fn entries(&self) -> &[WeightEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_rejects_non_finite() {
        assert!(ReturnSeries::new(vec![0.01, f64::INFINITY]).is_err());
        assert!(ReturnSeries::new(vec![f64::NAN]).is_err());
        assert!(ReturnSeries::new(vec![]).is_ok());
    }

    #[test]
    fn test_series_symbol() {
        let series = ReturnSeries::with_symbol("AAPL", vec![0.01, 0.02]).unwrap();
        assert_eq!(series.symbol(), Some("AAPL"));

        let series = ReturnSeries::new(vec![0.01]).unwrap().labelled("MSFT");
        assert_eq!(series.symbol(), Some("MSFT"));
    }

    #[test]
    fn test_from_prices() {
        let series = ReturnSeries::from_prices(&[100.0, 110.0, 99.0]).unwrap();
        assert_eq!(series.len(), 2);
        assert!((series.values()[0] - 0.10).abs() < 1e-12);
        assert!((series.values()[1] - (-0.10)).abs() < 1e-12);
    }

    #[test]
    fn test_from_prices_rejects_bad_input() {
        assert!(matches!(
            ReturnSeries::from_prices(&[100.0]),
            Err(RiskMetricsError::InsufficientData { required: 2, actual: 1 })
        ));
        assert!(ReturnSeries::from_prices(&[100.0, 0.0, 50.0]).is_err());
        assert!(ReturnSeries::from_prices(&[100.0, -5.0]).is_err());
    }

    #[test]
    fn test_weights_sum_validation() {
        let weights = PortfolioWeights::new(vec![("A", 0.5), ("B", 0.5)]).unwrap();
        assert!(weights.validate_sum(0.01).is_ok());

        let weights = PortfolioWeights::from_values(&[0.4, 0.4]).unwrap();
        assert!(matches!(
            weights.validate_sum(0.01),
            Err(RiskMetricsError::WeightSum { .. })
        ));

        let weights = PortfolioWeights::from_values(&[0.3333, 0.3333, 0.3333]).unwrap();
        assert!(weights.validate_sum(0.01).is_ok());
        assert!(weights.validate_sum(0.00005).is_err());

        let weights = PortfolioWeights::from_values(&[0.6, 0.5]).unwrap();
        assert!(weights.validate_sum(0.05).is_err());
    }

    #[test]
    fn test_weights_reject_negative() {
        assert!(PortfolioWeights::new(vec![("A", 1.2), ("B", -0.2)]).is_err());
        assert!(PortfolioWeights::from_values(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_weights_preserve_order() {
        let weights = PortfolioWeights::new(vec![("B", 0.7), ("A", 0.3)]).unwrap();
        assert_eq!(weights.values(), vec![0.7, 0.3]);
        assert_eq!(weights.entries()[0].asset_id, "B");

        let unnamed = PortfolioWeights::from_values(&[1.0]).unwrap();
        assert_eq!(unnamed.entries()[0].asset_id, "asset_0");
    }
}
