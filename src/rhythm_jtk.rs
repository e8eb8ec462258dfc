//! # JTK-style Rhythm Detection
//!
//! A simplified re-derivation of the JTK_CYCLE idea: for every candidate
//! period and phase offset a cosine reference waveform is built at the sample
//! times, both the data and the reference are rank-transformed, and Kendall's
//! tau measures their concordance. The best-scoring `(period, phase)` lookup
//! wins.
//!
//! The p-value of the winning lookup comes from the normal approximation to
//! Kendall's S for `n >= 10` and from `exp(-0.717|z| - 0.416 z²)` below that.
//! No adjustment is made for the number of lookups, and the exact null
//! distribution of the published algorithm is not reproduced.
//!
//! Single-series calls report `q_value == p_value`. Benjamini-Hochberg
//! correction happens only in [`jtk_batch`] (or
//! [`apply_batch_correction`]) once every series of a batch has been scored.

use crate::config::RhythmConfig;
use crate::errors::{ValidationError, ValidationResult};
use crate::math_utils::{average_ranks, sign, variance, ZERO_VARIANCE_THRESHOLD};
use crate::multiple_testing::benjamini_hochberg;
use crate::series::SeriesPanel;
use crate::special_functions::normal_cdf;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Below this many samples the exponential small-sample p-value is used.
pub const SMALL_SAMPLE_THRESHOLD: usize = 10;

/// Reference waveform values are rounded to this grid so symmetric samples tie.
const REFERENCE_QUANTUM: f64 = 1e-9;

/// Outcome of the JTK-style test for one series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JtkResult {
    /// Uncorrected p-value of the best lookup
    pub p_value: f64,
    /// BH q-value (equal to `p_value` outside a batch)
    pub q_value: f64,
    /// Kendall tau of the best lookup
    pub tau: f64,
    /// Kendall S of the best lookup
    pub kendall_s: f64,
    /// Normal score of the best lookup
    pub z_score: f64,
    /// Period of the best lookup
    pub best_period: f64,
    /// Peak time of the best reference waveform, in `[0, best_period)`
    pub best_phase: f64,
    /// Number of `(period, phase)` lookups evaluated
    pub lookups: usize,
    /// `q_value < alpha`
    pub is_rhythmic: bool,
}

impl JtkResult {
    /// Result reported when no rhythm can be assessed.
    pub fn null(nominal_period: f64) -> Self {
        Self {
            p_value: 1.0,
            q_value: 1.0,
            tau: 0.0,
            kendall_s: 0.0,
            z_score: 0.0,
            best_period: nominal_period,
            best_phase: 0.0,
            lookups: 0,
            is_rhythmic: false,
        }
    }
}

/// Kendall S between two equally long sequences.
pub fn kendall_s(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len();
    let mut s = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            s += sign(x[j] - x[i]) * sign(y[j] - y[i]);
        }
    }
    s
}

/// Null variance of Kendall tau, `(4n + 10) / (9n(n - 1))`.
pub fn tau_variance(n: usize) -> f64 {
    let n = n as f64;
    (4.0 * n + 10.0) / (9.0 * n * (n - 1.0))
}

/// Two-sided p-value for a Kendall normal score.
pub fn tau_p_value(z: f64, n: usize) -> f64 {
    let p = if n >= SMALL_SAMPLE_THRESHOLD {
        2.0 * (1.0 - normal_cdf(z.abs()))
    } else {
        (-0.717 * z.abs() - 0.416 * z * z).exp()
    };
    p.clamp(0.0, 1.0)
}

fn cosine_reference(timepoints: &[f64], period: f64, phase: f64) -> Vec<f64> {
    timepoints
        .iter()
        .map(|&t| {
            let v = (2.0 * PI * (t - phase) / period).cos();
            (v / REFERENCE_QUANTUM).round() * REFERENCE_QUANTUM
        })
        .collect()
}

/// Score one series against the period/phase grid.
///
/// Returns `Err` when lengths differ or the configuration is unusable;
/// constant or too-short series yield a `p_value` of 1.
pub fn jtk_test(
    timepoints: &[f64],
    values: &[f64],
    config: &RhythmConfig,
    alpha: f64,
) -> ValidationResult<JtkResult> {
    if timepoints.len() != values.len() {
        return Err(ValidationError::LengthMismatch {
            name: "values".to_string(),
            expected: timepoints.len(),
            actual: values.len(),
        });
    }
    if config.period_grid.is_empty() || config.phase_steps == 0 {
        return Err(ValidationError::InvalidParameter {
            parameter: "period_grid".to_string(),
            value: config.period_grid.len() as f64,
            constraint: "needs at least one period and one phase step".to_string(),
        });
    }

    let n = values.len();
    if n < 3 || variance(values) < ZERO_VARIANCE_THRESHOLD {
        log::debug!("JTK skipped: {} samples or constant series", n);
        return Ok(JtkResult::null(config.nominal_period));
    }

    let ranked_values = average_ranks(values);
    let pairs = (n * (n - 1)) as f64 / 2.0;

    let mut best: Option<(f64, f64, f64)> = None;
    let mut lookups = 0;
    for &period in &config.period_grid {
        for step in 0..config.phase_steps {
            let phase = period * step as f64 / config.phase_steps as f64;
            let reference = average_ranks(&cosine_reference(timepoints, period, phase));
            let s = kendall_s(&ranked_values, &reference);
            lookups += 1;
            if best.map_or(true, |(best_s, _, _)| s > best_s) {
                best = Some((s, period, phase));
            }
        }
    }

    let (s, best_period, best_phase) = best.unwrap_or((0.0, config.nominal_period, 0.0));
    let tau = s / pairs;
    let z_score = tau / tau_variance(n).sqrt();
    let p_value = tau_p_value(z_score, n);

    Ok(JtkResult {
        p_value,
        q_value: p_value,
        tau,
        kendall_s: s,
        z_score,
        best_period,
        best_phase,
        lookups,
        is_rhythmic: p_value < alpha,
    })
}

/// Replace q-values with Benjamini-Hochberg values computed across `results`.
pub fn apply_batch_correction(results: &mut [JtkResult], alpha: f64) {
    let p_values: Vec<f64> = results.iter().map(|r| r.p_value).collect();
    let q_values = benjamini_hochberg(&p_values);
    for (result, q) in results.iter_mut().zip(q_values) {
        result.q_value = q;
        result.is_rhythmic = q < alpha;
    }
}

/// Score every series of a panel and apply shared BH correction.
///
/// Results are in identifier order.
pub fn jtk_batch(
    panel: &SeriesPanel,
    config: &RhythmConfig,
    alpha: f64,
) -> ValidationResult<Vec<(String, JtkResult)>> {
    let entries: Vec<(&str, &[f64])> = panel.iter().collect();

    #[cfg(feature = "parallel")]
    let scored: ValidationResult<Vec<JtkResult>> = {
        use rayon::prelude::*;
        entries
            .par_iter()
            .map(|(_, values)| jtk_test(panel.timepoints(), values, config, alpha))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let scored: ValidationResult<Vec<JtkResult>> = entries
        .iter()
        .map(|(_, values)| jtk_test(panel.timepoints(), values, config, alpha))
        .collect();

    let mut results = scored?;
    apply_batch_correction(&mut results, alpha);

    Ok(entries
        .into_iter()
        .map(|(name, _)| name.to_string())
        .zip(results)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::collections::BTreeMap;

    fn two_day_grid() -> Vec<f64> {
        (0..24).map(|i| i as f64 * 2.0).collect()
    }

    fn cosine(timepoints: &[f64], peak: f64) -> Vec<f64> {
        timepoints
            .iter()
            .map(|&t| (2.0 * PI * (t - peak) / 24.0).cos())
            .collect()
    }

    #[test]
    fn test_kendall_s_extremes() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(kendall_s(&x, &x), 6.0);
        assert_eq!(kendall_s(&x, &[4.0, 3.0, 2.0, 1.0]), -6.0);
        assert_eq!(kendall_s(&x, &[1.0, 1.0, 1.0, 1.0]), 0.0);
        assert_approx_eq!(tau_variance(10), 50.0 / 810.0, 1e-12);
    }

    #[test]
    fn test_small_sample_p_value_form() {
        assert_approx_eq!(tau_p_value(1.5, 8), (-0.717 * 1.5 - 0.416 * 2.25_f64).exp(), 1e-12);
        assert_approx_eq!(tau_p_value(0.0, 8), 1.0, 1e-12);
        assert_approx_eq!(tau_p_value(1.959964, 30), 0.05, 1e-4);
    }

    #[test]
    fn test_detects_clean_cosine() {
        let t = two_day_grid();
        let values = cosine(&t, 6.0);
        let result = jtk_test(&t, &values, &RhythmConfig::default(), 0.05).unwrap();
        assert!(result.is_rhythmic);
        assert!(result.p_value < 1e-4, "p = {}", result.p_value);
        assert_eq!(result.best_period, 24.0);
        assert_approx_eq!(result.best_phase, 6.0, 1e-9);
        assert!(result.tau > 0.8);
        assert_eq!(result.lookups, 60);
        assert_eq!(result.q_value, result.p_value);
    }

    #[test]
    fn test_p_value_is_best_lookup_p_value() {
        let t: Vec<f64> = (0..12).map(|i| i as f64 * 2.0).collect();
        let jitter = [0.3, -0.2, 0.1, -0.4, 0.25, 0.0, -0.15, 0.35, -0.3, 0.2, -0.05, 0.1];
        let values: Vec<f64> = cosine(&t, 4.0)
            .iter()
            .zip(jitter.iter())
            .map(|(v, j)| v + j)
            .collect();
        let result = jtk_test(&t, &values, &RhythmConfig::default(), 0.05).unwrap();
        assert_eq!(result.p_value, tau_p_value(result.z_score, 12));
        assert!(result.lookups > 1);
        assert!(result.tau > 0.5, "tau = {}", result.tau);
        assert!(result.is_rhythmic, "p = {}", result.p_value);
    }

    #[test]
    fn test_antiphase_moves_best_phase() {
        let t = two_day_grid();
        let values: Vec<f64> = cosine(&t, 6.0).iter().map(|v| -v).collect();
        let result = jtk_test(&t, &values, &RhythmConfig::default(), 0.05).unwrap();
        assert_approx_eq!(result.best_phase, 18.0, 1e-9);
    }

    #[test]
    fn test_constant_series_is_null() {
        let t = two_day_grid();
        let result = jtk_test(&t, &[5.0; 24], &RhythmConfig::default(), 0.05).unwrap();
        assert_eq!(result.p_value, 1.0);
        assert!(!result.is_rhythmic);
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let t = two_day_grid();
        assert!(jtk_test(&t, &[1.0; 10], &RhythmConfig::default(), 0.05).is_err());
    }

    #[test]
    fn test_batch_matches_single_uncorrected_statistics() {
        let t = two_day_grid();
        let mut series = BTreeMap::new();
        series.insert("Per2".to_string(), cosine(&t, 6.0));
        series.insert("Bmal1".to_string(), cosine(&t, 18.0));
        series.insert(
            "Flat".to_string(),
            (0..24).map(|i| ((i * 7) % 5) as f64).collect(),
        );
        let panel = SeriesPanel::new(t.clone(), series).unwrap();
        let config = RhythmConfig::default();

        let batch = jtk_batch(&panel, &config, 0.05).unwrap();
        assert_eq!(batch.len(), 3);
        for (name, batch_result) in &batch {
            let single = jtk_test(&t, panel.get(name).unwrap(), &config, 0.05).unwrap();
            assert_eq!(single.p_value, batch_result.p_value);
            assert_eq!(single.tau, batch_result.tau);
            assert_eq!(single.best_phase, batch_result.best_phase);
            assert!(batch_result.q_value >= batch_result.p_value);
        }
        assert_eq!(batch[0].0, "Bmal1");
    }
}
