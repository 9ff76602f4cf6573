//! Qualitative risk assessment
//!
//! Maps a metric bundle onto a risk level (by annualized volatility) and a
//! recommendation (by Sharpe ratio) using configurable bands. [`RiskScore`]
//! condenses volatility, drawdown, VaR and the higher moments into a single
//! 0-10 figure.

use crate::config::AssessmentBands;
use crate::metrics::RiskMetricsResult;
use serde::{Deserialize, Serialize};

/// Volatility-based risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classify an annualized volatility
    pub fn from_volatility(volatility: f64, bands: &AssessmentBands) -> Self {
        if volatility < bands.low_volatility {
            RiskLevel::Low
        } else if volatility < bands.high_volatility {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    /// Display color used by dashboards
    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "green",
            RiskLevel::Medium => "yellow",
            RiskLevel::High => "red",
        }
    }
}

/// Sharpe-based recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    /// Risk-adjusted return is strong
    Excellent,

    /// Risk and return are balanced
    Good,

    /// Positive but weak risk-adjusted return
    Fair,

    /// Risk-adjusted return is zero or negative
    Poor,
}

impl Recommendation {
    /// Classify a Sharpe ratio
    pub fn from_sharpe(sharpe: f64, bands: &AssessmentBands) -> Self {
        if sharpe > bands.excellent_sharpe {
            Recommendation::Excellent
        } else if sharpe > bands.good_sharpe {
            Recommendation::Good
        } else if sharpe > 0.0 {
            Recommendation::Fair
        } else {
            Recommendation::Poor
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Recommendation::Excellent => "Excellent - strong risk-adjusted return",
            Recommendation::Good => "Good - risk and return are balanced",
            Recommendation::Fair => "Fair - needs optimization",
            Recommendation::Poor => "Poor - negative risk-adjusted return",
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Recommendation::Excellent => "Consider holding or moderately increasing",
            Recommendation::Good => "Suitable for long-term holding",
            Recommendation::Fair => "Consider rebalancing the portfolio",
            Recommendation::Poor => "Re-evaluate the investment strategy",
        }
    }
}

/// Risk level and recommendation for one metric bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub color: String,
    pub recommendation: Recommendation,
    pub summary: String,
    pub action: String,
}

impl RiskAssessment {
    /// Assess a computed result
    ///
    /// # Example
    ///
    /// ```
    /// use ag_riskmetrics::{AssessmentBands, ReturnSeries, RiskAssessment, RiskLevel, RiskMetricsEngine};
    ///
    /// let series = ReturnSeries::new(vec![0.001, 0.002, 0.0015, 0.001]).unwrap();
    /// let result = RiskMetricsEngine::default().compute_metrics(&series).unwrap();
    ///
    /// let assessment = RiskAssessment::from_metrics(&result, &AssessmentBands::default());
    /// assert_eq!(assessment.level, RiskLevel::Low);
    /// ```
    pub fn from_metrics(result: &RiskMetricsResult, bands: &AssessmentBands) -> Self {
        let level = RiskLevel::from_volatility(result.annualized_volatility, bands);
        let recommendation = Recommendation::from_sharpe(result.sharpe_ratio, bands);

        Self {
            level,
            color: level.color().to_string(),
            recommendation,
            summary: recommendation.summary().to_string(),
            action: recommendation.action().to_string(),
        }
    }
}

const VOLATILITY_WEIGHT: f64 = 0.30;
const DRAWDOWN_WEIGHT: f64 = 0.25;
const VAR_WEIGHT: f64 = 0.25;
const SKEWNESS_WEIGHT: f64 = 0.10;
const KURTOSIS_WEIGHT: f64 = 0.10;

/// Per-metric contributions to the composite risk score
///
/// Volatility, drawdown and VaR are scored on 0-10, skewness and kurtosis
/// on 0-5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub volatility: f64,
    pub drawdown: f64,
    pub var: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl ScoreComponents {
    pub fn from_metrics(result: &RiskMetricsResult) -> Self {
        Self {
            volatility: (result.annualized_volatility * 100.0).min(10.0),
            drawdown: (result.max_drawdown.abs() * 100.0).min(10.0),
            var: (result.var_95.abs() * 400.0).min(10.0),
            skewness: (result.skewness.abs() * 2.0).min(5.0),
            // Only fat tails add risk
            kurtosis: (result.excess_kurtosis.max(0.0) * 0.5).min(5.0),
        }
    }

    /// Weighted sum of the components
    pub fn total(&self) -> f64 {
        self.volatility * VOLATILITY_WEIGHT
            + self.drawdown * DRAWDOWN_WEIGHT
            + self.var * VAR_WEIGHT
            + self.skewness * SKEWNESS_WEIGHT
            + self.kurtosis * KURTOSIS_WEIGHT
    }
}

impl RiskLevel {
    /// Classify a composite risk score
    pub fn from_score(score: f64, bands: &AssessmentBands) -> Self {
        if score < bands.low_score {
            RiskLevel::Low
        } else if score < bands.high_score {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    /// Hex color used by dashboards for score badges
    pub fn hex_color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "#10B981",
            RiskLevel::Medium => "#F59E0B",
            RiskLevel::High => "#EF4444",
        }
    }

    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            RiskLevel::Low => &[
                "Suitable for conservative investors",
                "Consider adding a small allocation to growth assets",
                "Risk is currently well controlled",
            ],
            RiskLevel::Medium => &[
                "Suitable for balanced investors",
                "Rebalance the portfolio regularly",
                "Keep an appropriate cash reserve",
            ],
            RiskLevel::High => &[
                "Suitable only for aggressive investors",
                "Consider setting stop-loss levels",
                "Diversify to reduce concentration risk",
                "Consider adding bonds or defensive assets",
            ],
        }
    }
}

/// Composite 0-10 risk score with its breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    /// Weighted score, rounded to one decimal
    pub score: f64,
    pub level: RiskLevel,
    pub color: String,
    pub components: ScoreComponents,
    pub recommendations: Vec<String>,
}

impl RiskScore {
    /// Score a computed result
    ///
    /// # Example
    ///
    /// ```
    /// use ag_riskmetrics::{AssessmentBands, ReturnSeries, RiskMetricsEngine, RiskScore};
    ///
    /// let series = ReturnSeries::new(vec![0.05, -0.03, 0.02, -0.04, 0.01]).unwrap();
    /// let result = RiskMetricsEngine::default().compute_metrics(&series).unwrap();
    ///
    /// let score = RiskScore::from_metrics(&result, &AssessmentBands::default());
    /// assert!((0.0..=10.0).contains(&score.score));
    /// ```
    pub fn from_metrics(result: &RiskMetricsResult, bands: &AssessmentBands) -> Self {
        Self::from_components(ScoreComponents::from_metrics(result), bands)
    }

    pub fn from_components(components: ScoreComponents, bands: &AssessmentBands) -> Self {
        let score = (components.total() * 10.0).round() / 10.0;
        let level = RiskLevel::from_score(score, bands);

        Self {
            score,
            level,
            color: level.hex_color().to_string(),
            components,
            recommendations: level
                .recommendations()
                .iter()
                .map(|r| r.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_bands() {
        let bands = AssessmentBands::default();
        assert_eq!(RiskLevel::from_volatility(0.10, &bands), RiskLevel::Low);
        assert_eq!(RiskLevel::from_volatility(0.15, &bands), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_volatility(0.20, &bands), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_volatility(0.25, &bands), RiskLevel::High);
        assert_eq!(RiskLevel::from_volatility(0.60, &bands), RiskLevel::High);
    }

    #[test]
    fn test_recommendation_bands() {
        let bands = AssessmentBands::default();
        assert_eq!(Recommendation::from_sharpe(1.5, &bands), Recommendation::Excellent);
        assert_eq!(Recommendation::from_sharpe(1.0, &bands), Recommendation::Good);
        assert_eq!(Recommendation::from_sharpe(0.3, &bands), Recommendation::Fair);
        assert_eq!(Recommendation::from_sharpe(0.0, &bands), Recommendation::Poor);
        assert_eq!(Recommendation::from_sharpe(-0.7, &bands), Recommendation::Poor);
    }

    #[test]
    fn test_custom_bands() {
        let bands = AssessmentBands {
            low_volatility: 0.30,
            high_volatility: 0.50,
            ..Default::default()
        };
        assert_eq!(RiskLevel::from_volatility(0.25, &bands), RiskLevel::Low);
    }

    #[test]
    fn test_colors() {
        assert_eq!(RiskLevel::Low.color(), "green");
        assert_eq!(RiskLevel::High.color(), "red");
    }

    #[test]
    fn test_score_components_are_capped() {
        let series = crate::ReturnSeries::new(vec![0.30, -0.25, 0.20, -0.40, 0.35, -0.30]).unwrap();
        let result = crate::RiskMetricsEngine::default().compute_metrics(&series).unwrap();
        let score = RiskScore::from_metrics(&result, &AssessmentBands::default());

        assert_eq!(score.components.volatility, 10.0);
        assert_eq!(score.components.drawdown, 10.0);
        assert_eq!(score.components.var, 10.0);
        assert!(score.components.skewness <= 5.0);
        assert!(score.components.kurtosis <= 5.0);
        assert!(score.score >= 8.0 && score.score <= 10.0);
        assert_eq!(score.level, RiskLevel::High);
        assert_eq!(score.color, "#EF4444");
        assert_eq!(score.recommendations.len(), 4);
    }

    #[test]
    fn test_score_weighting() {
        let components = ScoreComponents {
            volatility: 2.0,
            drawdown: 4.0,
            var: 3.0,
            skewness: 1.0,
            kurtosis: 0.5,
        };
        // 0.6 + 1.0 + 0.75 + 0.1 + 0.05
        assert!((components.total() - 2.5).abs() < 1e-12);

        let score = RiskScore::from_components(components, &AssessmentBands::default());
        assert_eq!(score.score, 2.5);
        assert_eq!(score.level, RiskLevel::Low);
        assert_eq!(score.color, "#10B981");
        assert_eq!(score.recommendations[0], "Suitable for conservative investors");
    }

    #[test]
    fn test_thin_tails_do_not_add_risk() {
        let series = crate::ReturnSeries::new(vec![0.001, -0.001, 0.001, -0.001, 0.001, -0.001]).unwrap();
        let result = crate::RiskMetricsEngine::default().compute_metrics(&series).unwrap();
        assert!(result.excess_kurtosis < 0.0);

        let components = ScoreComponents::from_metrics(&result);
        assert_eq!(components.kurtosis, 0.0);
        assert!(components.skewness < 1.0);
    }

    #[test]
    fn test_score_bands() {
        let bands = AssessmentBands::default();
        assert_eq!(RiskLevel::from_score(2.9, &bands), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(3.0, &bands), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(5.9, &bands), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(6.0, &bands), RiskLevel::High);
        assert_eq!(RiskLevel::Medium.hex_color(), "#F59E0B");
    }
}
