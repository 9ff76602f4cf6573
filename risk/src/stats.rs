//! Numeric kernels over return slices
//!
//! These helpers assume their preconditions (non-empty input, finite
//! values) are checked by the caller. They never return NaN for the inputs
//! the engine passes them.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::cmp::Ordering;

/// Minimum sample size for the K² normality test
pub const NORMALITY_MIN_OBSERVATIONS: usize = 8;

/// Arithmetic mean (0.0 for an empty slice)
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation (ddof = 1)
///
/// Returns exactly 0.0 when all values are identical or fewer than two
/// values are supplied, so a degenerate series never produces rounding noise.
pub fn sample_std(data: &[f64]) -> f64 {
    if data.len() < 2 || is_constant(data) {
        return 0.0;
    }
    let m = mean(data);
    let scale = deviation_scale(data, m);
    if scale == 0.0 {
        return 0.0;
    }
    let ss: f64 = data.iter().map(|x| ((x - m) / scale).powi(2)).sum();
    scale * (ss / (data.len() - 1) as f64).sqrt()
}

/// Sample covariance (ddof = 1) of two equal-length slices
pub fn sample_covariance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if a.len() < 2 {
        return 0.0;
    }
    let mean_a = mean(a);
    let mean_b = mean(b);
    let scale_a = deviation_scale(a, mean_a);
    let scale_b = deviation_scale(b, mean_b);
    if scale_a == 0.0 || scale_b == 0.0 {
        return 0.0;
    }
    let scaled: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| ((x - mean_a) / scale_a) * ((y - mean_b) / scale_b))
        .sum::<f64>()
        / (a.len() - 1) as f64;
    scaled * scale_a * scale_b
}

/// Pearson correlation of two equal-length slices
///
/// Pairs where either side has zero variance have no defined correlation;
/// they report 0.0. The result is clamped to [-1, 1].
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if a.len() < 2 || is_constant(a) || is_constant(b) {
        return 0.0;
    }

    let mean_a = mean(a);
    let mean_b = mean(b);
    let scale_a = deviation_scale(a, mean_a);
    let scale_b = deviation_scale(b, mean_b);
    if scale_a == 0.0 || scale_b == 0.0 {
        return 0.0;
    }

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let dx = (x - mean_a) / scale_a;
        let dy = (y - mean_b) / scale_b;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Copy and sort ascending
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Percentile of sorted data with linear interpolation between ranks
///
/// `level` is in [0, 100]. Matches the default ("linear") method of common
/// numeric libraries: rank `h = (n - 1) * level / 100`.
pub fn percentile_sorted(sorted: &[f64], level: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }

    let rank = (level.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }

    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Percentile of unsorted data
pub fn percentile(data: &[f64], level: f64) -> f64 {
    percentile_sorted(&sorted(data), level)
}

/// Largest absolute deviation from `m`, used to keep powers in range
fn deviation_scale(data: &[f64], m: f64) -> f64 {
    data.iter().fold(0.0, |acc: f64, x| acc.max((x - m).abs()))
}

/// Central moments (m2, m3, m4) of the deviations divided by their largest
/// magnitude, with population normalization
///
/// Standardized ratios such as `m3 / m2^1.5` are invariant under that
/// rescaling, and the rescaled powers cannot overflow.
fn central_moments(data: &[f64]) -> (f64, f64, f64) {
    let n = data.len() as f64;
    let m = mean(data);
    let scale = deviation_scale(data, m);
    if scale == 0.0 || !scale.is_finite() {
        return (0.0, 0.0, 0.0);
    }
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for x in data {
        let d = (x - m) / scale;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Skewness from population moments: m3 / m2^1.5
pub fn skewness(data: &[f64]) -> f64 {
    if data.len() < 2 || is_constant(data) {
        return 0.0;
    }
    let (m2, m3, _) = central_moments(data);
    if m2 == 0.0 {
        return 0.0;
    }
    m3 / m2.powf(1.5)
}

/// Excess kurtosis from population moments: m4 / m2^2 - 3
pub fn excess_kurtosis(data: &[f64]) -> f64 {
    if data.len() < 2 || is_constant(data) {
        return 0.0;
    }
    let (m2, _, m4) = central_moments(data);
    if m2 == 0.0 {
        return 0.0;
    }
    m4 / (m2 * m2) - 3.0
}

/// Result of the D'Agostino–Pearson omnibus test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalityTest {
    /// K² statistic (sum of squared skewness and kurtosis z-scores)
    pub statistic: f64,

    /// Upper-tail probability under χ²(2)
    pub p_value: f64,
}

/// D'Agostino–Pearson K² test for departure from normality
///
/// Returns `None` for fewer than 8 observations or zero variance.
pub fn normality_test(data: &[f64]) -> Option<NormalityTest> {
    if data.len() < NORMALITY_MIN_OBSERVATIONS || is_constant(data) {
        return None;
    }

    let z_skew = skew_z_score(data);
    let z_kurt = kurtosis_z_score(data)?;
    let statistic = z_skew * z_skew + z_kurt * z_kurt;
    if !statistic.is_finite() {
        return None;
    }

    let chi2 = ChiSquared::new(2.0).ok()?;
    let p_value = (1.0 - chi2.cdf(statistic)).clamp(0.0, 1.0);

    Some(NormalityTest { statistic, p_value })
}

fn skew_z_score(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    let b2 = skewness(data);

    let mut y = b2 * (((n + 1.0) * (n + 3.0)) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    if y == 0.0 {
        y = 1.0;
    }
    let ratio = y / alpha;
    delta * (ratio + (ratio * ratio + 1.0).sqrt()).ln()
}

fn kurtosis_z_score(data: &[f64]) -> Option<f64> {
    let n = data.len() as f64;
    let b2 = excess_kurtosis(data) + 3.0;

    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let var_b2 = 24.0 * n * (n - 2.0) * (n - 3.0)
        / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / var_b2.sqrt();

    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * ((6.0 * (n + 3.0) * (n + 5.0)) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());

    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return None;
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();

    Some((term1 - term2) / (2.0 / (9.0 * a)).sqrt())
}

fn is_constant(data: &[f64]) -> bool {
    match data.first() {
        Some(first) => data.iter().all(|x| x == first),
        None => true,
    }
}
