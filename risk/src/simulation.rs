//! Synthetic return and price generation
//!
//! Produces reproducible random-walk data for demos and tests. The
//! generator is seeded explicitly per instance; nothing here touches
//! process-wide random state. The metrics engine never calls this module.

use crate::config::TRADING_DAYS_PER_YEAR;
use crate::error::{Result, RiskMetricsError};
use crate::series::ReturnSeries;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Weight of the previous return in the smoothed series
const AUTOCORRELATION: f64 = 0.1;

/// Built-in profiles: (symbol, annual volatility, annual drift, base price)
const CATALOGUE: &[(&str, f64, f64, f64)] = &[
    ("AAPL", 0.25, 0.08, 180.0),
    ("MSFT", 0.20, 0.07, 350.0),
    ("GOOGL", 0.22, 0.06, 140.0),
    ("AMZN", 0.30, 0.10, 150.0),
    ("TSLA", 0.50, 0.15, 240.0),
    ("JPM", 0.18, 0.05, 100.0),
    ("JNJ", 0.15, 0.04, 100.0),
    ("WMT", 0.16, 0.04, 100.0),
    ("NVDA", 0.35, 0.12, 100.0),
    ("XOM", 0.20, 0.06, 100.0),
    ("V", 0.19, 0.06, 100.0),
];

/// Statistical profile of a simulated asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetProfile {
    pub symbol: String,

    /// Annualized volatility of returns
    pub annual_volatility: f64,

    /// Annualized expected return
    pub annual_drift: f64,

    /// Price on the first simulated day
    #[serde(default = "default_base_price")]
    pub base_price: f64,
}

fn default_base_price() -> f64 {
    100.0
}

impl AssetProfile {
    /// Profile from the built-in catalogue, or a generic 25% vol / 5% drift profile
    pub fn lookup(symbol: &str) -> Self {
        CATALOGUE
            .iter()
            .find(|(s, ..)| *s == symbol)
            .map(|&(s, vol, drift, price)| Self {
                symbol: s.to_string(),
                annual_volatility: vol,
                annual_drift: drift,
                base_price: price,
            })
            .unwrap_or_else(|| Self {
                symbol: symbol.to_string(),
                annual_volatility: 0.25,
                annual_drift: 0.05,
                base_price: default_base_price(),
            })
    }

    /// Symbols with a built-in profile
    pub fn known_symbols() -> impl Iterator<Item = &'static str> {
        CATALOGUE.iter().map(|(s, ..)| *s)
    }
}

/// One dated price observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Seeded random-walk generator
pub struct MarketSimulator {
    rng: StdRng,
}

impl MarketSimulator {
    /// Create a simulator; the same seed always reproduces the same data
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw `days` daily returns for a profile
    ///
    /// Returns are `N(drift / 252, vol / √252)` with first-order smoothing
    /// `r[i] = 0.1 * r[i-1] + 0.9 * r[i]`.
    pub fn generate_returns(&mut self, profile: &AssetProfile, days: usize) -> Result<ReturnSeries> {
        if !(profile.annual_volatility.is_finite() && profile.annual_volatility >= 0.0) {
            return Err(RiskMetricsError::InvalidParameter(format!(
                "Volatility for {} must be non-negative, got {}",
                profile.symbol, profile.annual_volatility
            )));
        }
        if !profile.annual_drift.is_finite() {
            return Err(RiskMetricsError::InvalidParameter(format!(
                "Drift for {} must be finite, got {}",
                profile.symbol, profile.annual_drift
            )));
        }

        let daily_mean = profile.annual_drift / TRADING_DAYS_PER_YEAR;
        let daily_vol = profile.annual_volatility / TRADING_DAYS_PER_YEAR.sqrt();

        let normal = Normal::new(daily_mean, daily_vol).map_err(|e| {
            RiskMetricsError::InvalidParameter(format!(
                "Invalid profile for {}: {}",
                profile.symbol, e
            ))
        })?;

        let mut returns: Vec<f64> = (0..days).map(|_| normal.sample(&mut self.rng)).collect();
        for i in 1..returns.len() {
            returns[i] = AUTOCORRELATION * returns[i - 1] + (1.0 - AUTOCORRELATION) * returns[i];
        }

        ReturnSeries::with_symbol(profile.symbol.clone(), returns)
    }

    /// Draw aligned return series for several profiles
    pub fn generate_portfolio(
        &mut self,
        profiles: &[AssetProfile],
        days: usize,
    ) -> Result<Vec<ReturnSeries>> {
        profiles
            .iter()
            .map(|p| self.generate_returns(p, days))
            .collect()
    }

    /// Simulate a dated price path on business days starting at `start`
    ///
    /// Yields `days + 1` points: the base price followed by one compounded
    /// price per simulated return. Weekends are skipped.
    pub fn generate_prices(
        &mut self,
        profile: &AssetProfile,
        days: usize,
        start: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        if !(profile.base_price.is_finite() && profile.base_price > 0.0) {
            return Err(RiskMetricsError::InvalidParameter(format!(
                "Base price for {} must be positive, got {}",
                profile.symbol, profile.base_price
            )));
        }

        let returns = self.generate_returns(profile, days)?;

        let mut date = next_business_day(start);
        let mut price = profile.base_price;
        let mut points = Vec::with_capacity(days + 1);
        points.push(PricePoint { date, price });

        for r in returns.values() {
            date = next_business_day(date + Duration::days(1));
            price *= 1.0 + r;
            points.push(PricePoint { date, price });
        }

        Ok(points)
    }
}

fn next_business_day(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}
