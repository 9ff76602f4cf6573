//! Drawdown analysis
//!
//! The cumulative curve is `C[t] = Π (1 + r_i)` for `i <= t`, with no
//! implicit starting value of 1.0: a loss on the first period does not count
//! as a drawdown because no earlier peak exists.

use serde::{Deserialize, Serialize};

/// Peak-to-trough statistics of a return series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownStats {
    /// Largest peak-to-trough decline as a non-negative fraction
    pub max_drawdown: f64,

    /// Index of the running peak preceding the trough
    pub peak_index: usize,

    /// Index at which the maximum drawdown is reached
    pub trough_index: usize,

    /// Periods from peak to trough
    pub duration: usize,

    /// First index after the trough whose cumulative value regains the peak
    pub recovery_index: Option<usize>,
}

/// Cumulative growth curve of a return series
pub fn cumulative_curve(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |wealth, r| {
            *wealth *= 1.0 + r;
            Some(*wealth)
        })
        .collect()
}

/// Signed drawdown at each index: `(C[t] - max(C[0..=t])) / max(C[0..=t])`
///
/// Every value is <= 0.
pub fn drawdown_curve(returns: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    cumulative_curve(returns)
        .into_iter()
        .map(|wealth| {
            peak = peak.max(wealth);
            if peak > 0.0 {
                ((wealth - peak) / peak).min(0.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// Maximum drawdown with its location
///
/// Ties resolve to the earliest trough. A series that never declines
/// reports a zero drawdown located at index 0.
pub fn analyze(returns: &[f64]) -> DrawdownStats {
    let curve = cumulative_curve(returns);

    let mut peak_value = f64::NEG_INFINITY;
    let mut peak_index = 0;
    let mut worst = 0.0;
    let mut worst_peak = 0;
    let mut worst_trough = 0;

    for (t, &wealth) in curve.iter().enumerate() {
        if wealth > peak_value {
            peak_value = wealth;
            peak_index = t;
        }

        let drawdown = if peak_value > 0.0 {
            (wealth - peak_value) / peak_value
        } else {
            0.0
        };

        if drawdown < worst {
            worst = drawdown;
            worst_peak = peak_index;
            worst_trough = t;
        }
    }

    let recovery_index = if worst < 0.0 {
        let target = curve[worst_peak];
        curve
            .iter()
            .enumerate()
            .skip(worst_trough + 1)
            .find(|(_, wealth)| **wealth >= target)
            .map(|(t, _)| t)
    } else {
        None
    };

    DrawdownStats {
        max_drawdown: worst.abs(),
        peak_index: worst_peak,
        trough_index: worst_trough,
        duration: worst_trough - worst_peak,
        recovery_index,
    }
}
