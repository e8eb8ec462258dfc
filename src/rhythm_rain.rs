//! # RAIN-style Umbrella Test
//!
//! Samples are folded onto one cycle of the nominal period and ordered by
//! phase. The cycle is read starting at its lowest sample (the trough); for
//! each candidate peak the umbrella statistic counts concordant rising pairs
//! before the peak plus concordant falling pairs after it. Each half is a
//! Kendall-type sum over the `T(m - 1) = m(m - 1) / 2` pairs of a segment of
//! `m` samples, so under the null its variance is `T(m - 1)(2m + 5) / 9`.
//!
//! The reported p-value is the one-sided normal tail of the best peak. This
//! is a simplified re-derivation; it does not compute the exact umbrella null
//! distribution of the published method.

use crate::config::RhythmConfig;
use crate::errors::{ValidationError, ValidationResult};
use crate::math_utils::{float_total_cmp, sign, triangular, variance, ZERO_VARIANCE_THRESHOLD};
use crate::multiple_testing::benjamini_hochberg;
use crate::series::SeriesPanel;
use crate::special_functions::normal_cdf;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rise fractions inside this interval count as a symmetric waveform.
pub const SYMMETRIC_RISE_RANGE: (f64, f64) = (0.35, 0.65);

/// Minimum samples for the umbrella test.
pub const MIN_RAIN_SAMPLES: usize = 4;

/// Waveform shape of the best umbrella.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PeakShape {
    /// Rise and fall take similar shares of the cycle
    Symmetric,
    /// Rise fraction outside [`SYMMETRIC_RISE_RANGE`]
    Asymmetric,
    /// No umbrella could be assessed
    Undetermined,
}

/// Outcome of the umbrella test for one series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RainResult {
    /// One-sided p-value of the best peak
    pub p_value: f64,
    /// BH q-value (equal to `p_value` outside a batch)
    pub q_value: f64,
    /// Umbrella statistic of the best peak
    pub statistic: f64,
    /// Normal score of the best peak
    pub z_score: f64,
    /// Phase of the best peak within the period
    pub peak_phase: f64,
    /// Phase of the trough within the period
    pub trough_phase: f64,
    /// Share of the cycle spent rising
    pub rise_fraction: f64,
    /// Symmetric / asymmetric classification
    pub shape: PeakShape,
    /// `q_value < alpha`
    pub is_rhythmic: bool,
}

impl RainResult {
    /// Result reported when no umbrella can be assessed.
    pub fn null() -> Self {
        Self {
            p_value: 1.0,
            q_value: 1.0,
            statistic: 0.0,
            z_score: 0.0,
            peak_phase: 0.0,
            trough_phase: 0.0,
            rise_fraction: 0.0,
            shape: PeakShape::Undetermined,
            is_rhythmic: false,
        }
    }
}

/// Null variance of a Kendall-type sum over `m` ordered samples.
#[inline]
pub fn segment_variance(m: usize) -> f64 {
    triangular(m.saturating_sub(1)) * (2.0 * m as f64 + 5.0) / 9.0
}

/// Classify a rise fraction.
pub fn classify_shape(rise_fraction: f64) -> PeakShape {
    let (low, high) = SYMMETRIC_RISE_RANGE;
    if rise_fraction < low || rise_fraction > high {
        PeakShape::Asymmetric
    } else {
        PeakShape::Symmetric
    }
}

/// Umbrella statistics for every peak position of `sequence`.
///
/// `out[k]` is the rising score over `0..=k` plus the falling score over `k..n`.
pub fn umbrella_scores(sequence: &[f64]) -> Vec<f64> {
    let n = sequence.len();
    let mut rising = vec![0.0; n];
    for k in 1..n {
        let added: f64 = (0..k).map(|i| sign(sequence[k] - sequence[i])).sum();
        rising[k] = rising[k - 1] + added;
    }
    let mut falling = vec![0.0; n];
    for k in (0..n.saturating_sub(1)).rev() {
        let added: f64 = ((k + 1)..n).map(|j| sign(sequence[k] - sequence[j])).sum();
        falling[k] = falling[k + 1] + added;
    }
    rising.iter().zip(falling.iter()).map(|(r, f)| r + f).collect()
}

/// Run the umbrella test on one series.
pub fn rain_test(
    timepoints: &[f64],
    values: &[f64],
    config: &RhythmConfig,
    alpha: f64,
) -> ValidationResult<RainResult> {
    if timepoints.len() != values.len() {
        return Err(ValidationError::LengthMismatch {
            name: "values".to_string(),
            expected: timepoints.len(),
            actual: values.len(),
        });
    }
    let period = config.nominal_period;
    if !(period > 0.0) {
        return Err(ValidationError::InvalidParameter {
            parameter: "nominal_period".to_string(),
            value: period,
            constraint: "must be > 0".to_string(),
        });
    }

    let n = values.len();
    if n < MIN_RAIN_SAMPLES || variance(values) < ZERO_VARIANCE_THRESHOLD {
        log::debug!("RAIN skipped: {} samples or constant series", n);
        return Ok(RainResult::null());
    }

    // Fold onto one cycle; ties in phase keep time order
    let origin = timepoints[0];
    let phases: Vec<f64> = timepoints
        .iter()
        .map(|&t| (t - origin).rem_euclid(period))
        .collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| float_total_cmp(&phases[a], &phases[b]));

    let trough_pos = (0..n)
        .min_by(|&a, &b| float_total_cmp(&values[order[a]], &values[order[b]]))
        .unwrap_or(0);
    let cycle: Vec<usize> = (0..n).map(|i| order[(trough_pos + i) % n]).collect();
    let sequence: Vec<f64> = cycle.iter().map(|&i| values[i]).collect();

    let scores = umbrella_scores(&sequence);
    let mut best: Option<(usize, f64, f64)> = None;
    for (k, &s) in scores.iter().enumerate().skip(1) {
        let var = segment_variance(k + 1) + segment_variance(n - k);
        if var <= 0.0 {
            continue;
        }
        let z = s / var.sqrt();
        if best.map_or(true, |(_, _, best_z)| z > best_z) {
            best = Some((k, s, z));
        }
    }

    let (peak_pos, statistic, z_score) = match best {
        Some(found) => found,
        None => return Ok(RainResult::null()),
    };

    let trough_phase = phases[cycle[0]];
    let peak_phase = phases[cycle[peak_pos]];
    let rise_fraction = (peak_phase - trough_phase).rem_euclid(period) / period;
    let p_value = (1.0 - normal_cdf(z_score)).clamp(0.0, 1.0);

    Ok(RainResult {
        p_value,
        q_value: p_value,
        statistic,
        z_score,
        peak_phase,
        trough_phase,
        rise_fraction,
        shape: classify_shape(rise_fraction),
        is_rhythmic: p_value < alpha,
    })
}

/// Replace q-values with Benjamini-Hochberg values computed across `results`.
pub fn apply_batch_correction(results: &mut [RainResult], alpha: f64) {
    let p_values: Vec<f64> = results.iter().map(|r| r.p_value).collect();
    let q_values = benjamini_hochberg(&p_values);
    for (result, q) in results.iter_mut().zip(q_values) {
        result.q_value = q;
        result.is_rhythmic = q < alpha;
    }
}

/// Run the umbrella test on every series of a panel with shared BH correction.
///
/// Results are in identifier order.
pub fn rain_batch(
    panel: &SeriesPanel,
    config: &RhythmConfig,
    alpha: f64,
) -> ValidationResult<Vec<(String, RainResult)>> {
    let entries: Vec<(&str, &[f64])> = panel.iter().collect();

    #[cfg(feature = "parallel")]
    let scored: ValidationResult<Vec<RainResult>> = {
        use rayon::prelude::*;
        entries
            .par_iter()
            .map(|(_, values)| rain_test(panel.timepoints(), values, config, alpha))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let scored: ValidationResult<Vec<RainResult>> = entries
        .iter()
        .map(|(_, values)| rain_test(panel.timepoints(), values, config, alpha))
        .collect();

    let mut results = scored?;
    apply_batch_correction(&mut results, alpha);

    Ok(entries
        .into_iter()
        .map(|(name, _)| name.to_string())
        .zip(results)
        .collect())
}
