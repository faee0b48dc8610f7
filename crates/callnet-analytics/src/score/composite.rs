use serde::{Deserialize, Serialize};

/// Weights for the composite risk formula:
///
/// `R(v) = pagerank*PR + betweenness*BC + out_degree*OD`
///
/// where every input is min-max normalized over the current table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub pagerank: f64,
    pub betweenness: f64,
    pub out_degree: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            pagerank: 0.40,
            betweenness: 0.35,
            out_degree: 0.25,
        }
    }
}

/// Risk scoring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub weights: RiskWeights,
    /// Quantile of the score column at or above which a row is High-Risk.
    /// Default: 0.95.
    pub high_risk_quantile: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            high_risk_quantile: 0.95,
        }
    }
}

/// Normalized metric values for one participant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInputs {
    pub pagerank: f64,
    pub betweenness: f64,
    pub out_degree: f64,
}

/// Weighted sum of normalized inputs, each clamped to `[0, 1]`.
#[must_use]
pub fn risk_score(inputs: &RiskInputs, weights: &RiskWeights) -> f64 {
    let pr = normalize_unit(inputs.pagerank);
    let bc = normalize_unit(inputs.betweenness);
    let od = normalize_unit(inputs.out_degree);

    (weights.pagerank * pr) + (weights.betweenness * bc) + (weights.out_degree * od)
}

/// Column ranges at or below this are summation-order noise, not signal.
const ZERO_RANGE: f64 = 1e-12;

/// Min-max normalization that maps raw metric values to `[0, 1]`.
///
/// If all values are equal (including a single-element slice), all outputs are
/// `0.0`.
#[must_use]
pub fn normalize_metric(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range.abs() <= ZERO_RANGE {
        return vec![0.0; values.len()];
    }

    values
        .iter()
        .map(|&value| normalize_unit((value - min) / range))
        .collect()
}

/// Quantile with linear interpolation between the closest ranks.
///
/// Position `(n - 1) * q` in the sorted values; the result lies between the
/// two neighbouring order statistics. `q` is clamped to `[0, 1]`. Returns
/// `None` for an empty slice.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn normalize_unit(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }

    value.clamp(0.0, 1.0)
}
