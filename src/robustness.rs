//! # Robustness Test Suite
//!
//! Resampling and perturbation checks on the AR(2) persistence metric:
//!
//! - **Permutation**: is a group-mean difference larger than label shuffling
//!   produces? `p = (extreme + 1) / (permutations + 1)`, never zero.
//! - **Bootstrap**: circular-block interval for the eigenvalue modulus.
//! - **Sparsity**: delete a random fraction of timepoints, interpolate back,
//!   refit, and measure the relative change in modulus.
//! - **Phase shift**: circularly shift driver and response; the modulus should
//!   barely move while driver-to-response Granger causality should break.
//!
//! Every test yields a [`RobustnessResult`] with a pass/fail verdict against a
//! fixed threshold, and [`run_robustness_suite`] runs them together.

use crate::autoregressive::{fit_ar, ArFit};
use crate::bootstrap::{
    bootstrap_ar2_modulus, BootstrapValidation, ConfidenceInterval, ConfidenceIntervalMethod,
};
use crate::causality::{granger_causality, GrangerResult};
use crate::config::EngineConfig;
use crate::errors::{
    validate_all_finite, validate_parameter, DegenerateReason, FitOutcome, ValidationError,
    ValidationResult,
};
use crate::math_utils::{mean, relative_deviation_percent, std_dev};
use crate::reference::GeneSetCatalog;
use crate::rng::{mix_seed, AnalysisRng};
use crate::roots::analyze_ar2_roots;
use crate::series::{
    circular_shift, infer_sampling_interval, interpolate_onto_grid, shift_in_samples,
    validate_timepoints,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Significance level for the permutation test.
pub const PERMUTATION_ALPHA: f64 = 0.05;

/// Points that always survive a sparsity deletion.
const MIN_RETAINED_POINTS: usize = 2;

/// Modulus of the AR(2) fit, 0 for a degenerate fit.
pub fn ar2_modulus_or_zero(values: &[f64], sampling_interval: f64) -> ValidationResult<f64> {
    let fit = fit_ar(values, 2)?.fit_or_else(|_| ArFit::sentinel(2));
    Ok(analyze_ar2_roots(fit.coefficients[0], fit.coefficients[1], sampling_interval).modulus)
}

/// Group-mean difference permutation test.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PermutationTestResult {
    /// `mean(a) - mean(b)`
    pub observed_difference: f64,
    /// Smoothed two-sided p-value in `(0, 1]`
    pub p_value: f64,
    /// Shuffles performed
    pub permutations: usize,
    /// Shuffles at least as extreme as the observation
    pub extreme_count: usize,
    /// Mean of the shuffled differences
    pub null_mean: f64,
    /// Standard deviation of the shuffled differences
    pub null_std: f64,
    /// `p_value < 0.05`
    pub significant: bool,
}

/// Shuffle group labels `permutations` times and compare mean differences.
pub fn permutation_test(
    group_a: &[f64],
    group_b: &[f64],
    permutations: usize,
    seed: Option<u64>,
) -> ValidationResult<PermutationTestResult> {
    if group_a.is_empty() {
        return Err(ValidationError::EmptyGroup {
            group: "group_a".to_string(),
        });
    }
    if group_b.is_empty() {
        return Err(ValidationError::EmptyGroup {
            group: "group_b".to_string(),
        });
    }
    if permutations == 0 {
        return Err(ValidationError::InvalidParameter {
            parameter: "permutations".to_string(),
            value: 0.0,
            constraint: "must be >= 1".to_string(),
        });
    }
    validate_all_finite(group_a, "group_a")?;
    validate_all_finite(group_b, "group_b")?;

    let observed_difference = mean(group_a) - mean(group_b);
    let pooled: Vec<f64> = group_a.iter().chain(group_b.iter()).copied().collect();
    let split = group_a.len();

    let shuffled_difference = |i: usize| {
        let mut rng = AnalysisRng::for_iteration(seed, i);
        let mut labels = pooled.clone();
        rng.shuffle(&mut labels);
        mean(&labels[..split]) - mean(&labels[split..])
    };

    #[cfg(feature = "parallel")]
    let null: Vec<f64> = {
        use rayon::prelude::*;
        (0..permutations).into_par_iter().map(shuffled_difference).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let null: Vec<f64> = (0..permutations).map(shuffled_difference).collect();

    // Tolerance absorbs summation-order noise in exact ties
    let threshold = observed_difference.abs() - 1e-12;
    let extreme_count = null.iter().filter(|d| d.abs() >= threshold).count();
    let p_value = (extreme_count + 1) as f64 / (permutations + 1) as f64;

    Ok(PermutationTestResult {
        observed_difference,
        p_value,
        permutations,
        extreme_count,
        null_mean: mean(&null),
        null_std: std_dev(&null),
        significant: p_value < PERMUTATION_ALPHA,
    })
}

/// Permutation test between two labelled gene sets of a catalogue.
pub fn permutation_test_by_category(
    values: &BTreeMap<String, f64>,
    catalog: &GeneSetCatalog,
    label_a: &str,
    label_b: &str,
    permutations: usize,
    seed: Option<u64>,
) -> ValidationResult<PermutationTestResult> {
    let group_a = catalog.values_for(label_a, values)?;
    let group_b = catalog.values_for(label_b, values)?;
    permutation_test(&group_a, &group_b, permutations, seed)
}

/// Bootstrap interval for the eigenvalue modulus.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModulusBootstrapResult {
    /// Bootstrap summary (a zero-width interval at 0 when degenerate)
    pub validation: BootstrapValidation,
    /// Whole interval strictly inside the unit circle
    pub stable_interval: bool,
    /// Why the baseline AR(2) fit failed, if it did
    pub degenerate: Option<DegenerateReason>,
}

impl ModulusBootstrapResult {
    /// Non-degenerate fit with a stable interval.
    pub fn passed(&self) -> bool {
        self.degenerate.is_none() && self.stable_interval
    }
}

/// Circular-block bootstrap of the AR(2) modulus.
///
/// A degenerate baseline fit skips resampling and reports the sentinel
/// modulus 0 with a failing verdict.
pub fn modulus_bootstrap_test(
    values: &[f64],
    iterations: usize,
    confidence_level: f64,
    seed: Option<u64>,
) -> ValidationResult<ModulusBootstrapResult> {
    if let FitOutcome::Degenerate(reason) = fit_ar(values, 2)? {
        log::debug!("modulus bootstrap skipped: {}", reason);
        return Ok(ModulusBootstrapResult {
            validation: BootstrapValidation {
                original_estimate: 0.0,
                bootstrap_estimates: Vec::new(),
                bias: 0.0,
                standard_error: 0.0,
                confidence_interval: ConfidenceInterval {
                    confidence_level,
                    lower_bound: 0.0,
                    upper_bound: 0.0,
                    method: ConfidenceIntervalMethod::BootstrapPercentile,
                },
                dropped_replicates: 0,
            },
            stable_interval: false,
            degenerate: Some(reason),
        });
    }

    let validation = bootstrap_ar2_modulus(values, iterations, confidence_level, seed)?;
    let stable_interval = validation.confidence_interval.upper_bound < 1.0;
    Ok(ModulusBootstrapResult {
        validation,
        stable_interval,
        degenerate: None,
    })
}

/// Deviation statistics at one deletion fraction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SparsityLevelResult {
    /// Fraction of timepoints removed
    pub fraction: f64,
    /// Points removed per trial
    pub removed_points: usize,
    /// Mean relative modulus deviation (percent)
    pub deviation_percent: f64,
    /// Worst trial deviation (percent)
    pub max_deviation_percent: f64,
    /// Trials run
    pub trials: usize,
    /// `deviation_percent < tolerance`
    pub stable: bool,
}

/// Sparsity stress test across several deletion fractions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SparsityTestResult {
    /// Modulus on the complete series
    pub baseline_modulus: f64,
    /// One entry per fraction
    pub levels: Vec<SparsityLevelResult>,
    /// Stability threshold (percent)
    pub tolerance_percent: f64,
    /// Every level stable
    pub stable: bool,
}

fn sparsity_level(
    timepoints: &[f64],
    values: &[f64],
    baseline_modulus: f64,
    fraction: f64,
    trials: usize,
    tolerance_percent: f64,
    seed: Option<u64>,
) -> ValidationResult<SparsityLevelResult> {
    let n = values.len();
    let removed_points = ((fraction * n as f64 + 1e-9).floor() as usize)
        .min(n.saturating_sub(MIN_RETAINED_POINTS));

    if removed_points == 0 || trials == 0 {
        return Ok(SparsityLevelResult {
            fraction,
            removed_points: 0,
            deviation_percent: 0.0,
            max_deviation_percent: 0.0,
            trials,
            stable: true,
        });
    }

    let interval = infer_sampling_interval(timepoints);
    let mut deviations = Vec::with_capacity(trials);
    for trial in 0..trials {
        let mut rng = AnalysisRng::for_iteration(seed, trial);
        let removed = rng.sample_indices(n, removed_points);
        let mut known_t = Vec::with_capacity(n - removed_points);
        let mut known_v = Vec::with_capacity(n - removed_points);
        let mut next_removed = removed.iter().peekable();
        for i in 0..n {
            if next_removed.peek() == Some(&&i) {
                next_removed.next();
                continue;
            }
            known_t.push(timepoints[i]);
            known_v.push(values[i]);
        }

        let refilled = interpolate_onto_grid(&known_t, &known_v, timepoints);
        let modulus = ar2_modulus_or_zero(&refilled, interval)?;
        deviations.push(relative_deviation_percent(baseline_modulus, modulus));
    }

    let deviation_percent = mean(&deviations);
    let max_deviation_percent = deviations.iter().copied().fold(0.0, f64::max);
    Ok(SparsityLevelResult {
        fraction,
        removed_points,
        deviation_percent,
        max_deviation_percent,
        trials,
        stable: deviation_percent < tolerance_percent,
    })
}

/// Delete random timepoints at each fraction, interpolate back and refit AR(2).
///
/// A fraction of zero performs no deletion or interpolation and reports a
/// deviation of exactly 0.
pub fn sparsity_test(
    timepoints: &[f64],
    values: &[f64],
    fractions: &[f64],
    trials: usize,
    tolerance_percent: f64,
    seed: Option<u64>,
) -> ValidationResult<SparsityTestResult> {
    validate_timepoints(timepoints)?;
    if timepoints.len() != values.len() {
        return Err(ValidationError::LengthMismatch {
            name: "values".to_string(),
            expected: timepoints.len(),
            actual: values.len(),
        });
    }
    for &fraction in fractions {
        validate_parameter(fraction, 0.0, 1.0, "sparsity_fraction")?;
    }

    let baseline_modulus = ar2_modulus_or_zero(values, infer_sampling_interval(timepoints))?;
    let levels = fractions
        .iter()
        .enumerate()
        .map(|(k, &fraction)| {
            sparsity_level(
                timepoints,
                values,
                baseline_modulus,
                fraction,
                trials,
                tolerance_percent,
                seed.map(|s| mix_seed(s, k)),
            )
        })
        .collect::<ValidationResult<Vec<_>>>()?;
    let stable = levels.iter().all(|l| l.stable);

    Ok(SparsityTestResult {
        baseline_modulus,
        levels,
        tolerance_percent,
        stable,
    })
}

/// Outcome of shifting a driver/response pair by one offset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhaseShiftResult {
    /// Requested shift in time units
    pub shift_hours: f64,
    /// Shift in samples
    pub shift_samples: usize,
    /// Response modulus before shifting
    pub baseline_modulus: f64,
    /// Response modulus after shifting
    pub shifted_modulus: f64,
    /// Relative modulus change (percent)
    pub deviation_percent: f64,
    /// `deviation_percent < tolerance`
    pub eigen_invariant: bool,
    /// Driver → response before shifting
    pub baseline_causality: GrangerResult,
    /// Shifted driver → unshifted response
    pub shifted_causality: GrangerResult,
    /// Causality present at baseline and absent after the shift
    pub causality_broken: bool,
    /// `eigen_invariant && causality_broken`
    pub phase_specificity_proven: bool,
}

/// Circularly shift driver and response, refit, and retest causality.
pub fn phase_shift_test(
    driver: &[f64],
    response: &[f64],
    sampling_interval: f64,
    shift_hours: f64,
    lag: usize,
    tolerance_percent: f64,
) -> ValidationResult<PhaseShiftResult> {
    if driver.len() != response.len() {
        return Err(ValidationError::LengthMismatch {
            name: "driver".to_string(),
            expected: response.len(),
            actual: driver.len(),
        });
    }
    if !(sampling_interval > 0.0) {
        return Err(ValidationError::InvalidParameter {
            parameter: "sampling_interval".to_string(),
            value: sampling_interval,
            constraint: "must be > 0".to_string(),
        });
    }

    let shift_samples = shift_in_samples(shift_hours, sampling_interval, response.len());
    let shifted_driver = circular_shift(driver, shift_samples);
    let shifted_response = circular_shift(response, shift_samples);

    let baseline_modulus = ar2_modulus_or_zero(response, sampling_interval)?;
    let shifted_modulus = ar2_modulus_or_zero(&shifted_response, sampling_interval)?;
    let deviation_percent = relative_deviation_percent(baseline_modulus, shifted_modulus);
    let eigen_invariant = deviation_percent < tolerance_percent;

    let baseline_causality = granger_causality(driver, response, lag)?;
    let shifted_causality = granger_causality(&shifted_driver, response, lag)?;
    let causality_broken = baseline_causality.causality && !shifted_causality.causality;

    Ok(PhaseShiftResult {
        shift_hours,
        shift_samples,
        baseline_modulus,
        shifted_modulus,
        deviation_percent,
        eigen_invariant,
        baseline_causality,
        shifted_causality,
        causality_broken,
        phase_specificity_proven: eigen_invariant && causality_broken,
    })
}

/// Kind of robustness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RobustnessTestKind {
    /// Label-shuffling test
    Permutation,
    /// Modulus bootstrap
    Bootstrap,
    /// Random deletion + interpolation
    Sparsity,
    /// Circular shift + causality
    PhaseShift,
}

/// One robustness check with its verdict.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RobustnessResult {
    /// Group permutation test
    Permutation(PermutationTestResult),
    /// Modulus bootstrap interval
    Bootstrap(ModulusBootstrapResult),
    /// Sparsity stress test
    Sparsity(SparsityTestResult),
    /// Phase-shift test at one offset
    PhaseShift(PhaseShiftResult),
}

impl RobustnessResult {
    /// Which check produced this result.
    pub fn kind(&self) -> RobustnessTestKind {
        match self {
            RobustnessResult::Permutation(_) => RobustnessTestKind::Permutation,
            RobustnessResult::Bootstrap(_) => RobustnessTestKind::Bootstrap,
            RobustnessResult::Sparsity(_) => RobustnessTestKind::Sparsity,
            RobustnessResult::PhaseShift(_) => RobustnessTestKind::PhaseShift,
        }
    }

    /// Verdict against the check's fixed threshold.
    pub fn passed(&self) -> bool {
        match self {
            RobustnessResult::Permutation(r) => r.significant,
            RobustnessResult::Bootstrap(r) => r.passed(),
            RobustnessResult::Sparsity(r) => r.stable,
            RobustnessResult::PhaseShift(r) => r.phase_specificity_proven,
        }
    }
}

/// Inputs to [`run_robustness_suite`].
#[derive(Debug, Clone, Copy)]
pub struct SuiteInput<'a> {
    /// Shared timepoint axis
    pub timepoints: &'a [f64],
    /// Putative driver series
    pub driver: &'a [f64],
    /// Response series whose modulus is under test
    pub response: &'a [f64],
    /// Optional `(group_a, group_b)` values for the permutation test
    pub groups: Option<(&'a [f64], &'a [f64])>,
}

/// All robustness checks for one driver/response pair.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RobustnessReport {
    /// Individual results in execution order
    pub results: Vec<RobustnessResult>,
    /// Results that passed
    pub passed: usize,
    /// Results run
    pub total: usize,
}

impl RobustnessReport {
    /// Results of one kind.
    pub fn of_kind(&self, kind: RobustnessTestKind) -> impl Iterator<Item = &RobustnessResult> {
        self.results.iter().filter(move |r| r.kind() == kind)
    }

    /// Every check passed.
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// Run permutation (when groups are given), bootstrap, sparsity and every
/// configured phase shift.
pub fn run_robustness_suite(
    input: &SuiteInput<'_>,
    config: &EngineConfig,
) -> ValidationResult<RobustnessReport> {
    config.validate()?;
    validate_timepoints(input.timepoints)?;
    for (name, series) in [("driver", input.driver), ("response", input.response)] {
        if series.len() != input.timepoints.len() {
            return Err(ValidationError::LengthMismatch {
                name: name.to_string(),
                expected: input.timepoints.len(),
                actual: series.len(),
            });
        }
    }

    let r = &config.robustness;
    let interval = config
        .sampling_interval
        .unwrap_or_else(|| infer_sampling_interval(input.timepoints));
    let sub_seed = |k: usize| config.seed.map(|s| mix_seed(s, k));
    let mut results = Vec::new();

    if let Some((a, b)) = input.groups {
        results.push(RobustnessResult::Permutation(permutation_test(
            a,
            b,
            r.permutations,
            sub_seed(0),
        )?));
    }

    results.push(RobustnessResult::Bootstrap(modulus_bootstrap_test(
        input.response,
        r.bootstrap_iterations,
        r.confidence_level,
        sub_seed(1),
    )?));

    results.push(RobustnessResult::Sparsity(sparsity_test(
        input.timepoints,
        input.response,
        &r.sparsity_levels,
        r.sparsity_trials,
        r.sparsity_tolerance_percent,
        sub_seed(2),
    )?));

    for &hours in &r.phase_shift_hours {
        results.push(RobustnessResult::PhaseShift(phase_shift_test(
            input.driver,
            input.response,
            interval,
            hours,
            r.granger_lag,
            r.phase_shift_tolerance_percent,
        )?));
    }

    let passed = results.iter().filter(|r| r.passed()).count();
    let total = results.len();
    log::debug!("robustness suite: {}/{} checks passed", passed, total);

    Ok(RobustnessReport {
        results,
        passed,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn ar2_series(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = AnalysisRng::with_seed(seed);
        let mut x = vec![0.0; n + 100];
        for t in 2..x.len() {
            x[t] = 0.9 * x[t - 1] - 0.4 * x[t - 2] + rng.standard_normal();
        }
        x.split_off(100)
    }

    #[test]
    fn test_permutation_detects_shifted_group() {
        let a: Vec<f64> = (0..20).map(|i| 0.7 + 0.01 * (i % 5) as f64).collect();
        let b: Vec<f64> = (0..20).map(|i| 0.4 + 0.01 * (i % 5) as f64).collect();
        let result = permutation_test(&a, &b, 500, Some(1)).unwrap();
        assert_approx_eq!(result.observed_difference, 0.3, 1e-12);
        assert_eq!(result.extreme_count, 0);
        assert_approx_eq!(result.p_value, 1.0 / 501.0, 1e-15);
        assert!(result.significant);
        assert!(result.null_mean.abs() < 0.05);
    }

    #[test]
    fn test_permutation_p_value_range() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.5, 2.5, 2.0];
        for permutations in [1, 2, 10, 100] {
            let result = permutation_test(&a, &b, permutations, Some(3)).unwrap();
            assert!(result.p_value > 0.0 && result.p_value <= 1.0);
        }
        // Identical groups: every shuffle is at least as extreme
        let same = permutation_test(&[1.0, 1.0], &[1.0, 1.0], 50, Some(3)).unwrap();
        assert_eq!(same.p_value, 1.0);
    }

    #[test]
    fn test_permutation_contract() {
        assert!(matches!(
            permutation_test(&[], &[1.0], 10, None),
            Err(ValidationError::EmptyGroup { .. })
        ));
        assert!(permutation_test(&[1.0], &[2.0], 0, None).is_err());
    }

    #[test]
    fn test_permutation_by_category() {
        let catalog = GeneSetCatalog::new()
            .with_set("resistance", ["A", "B", "C"])
            .with_set("sensitivity", ["D", "E", "F"]);
        let values: BTreeMap<String, f64> = [("A", 0.7), ("B", 0.72), ("C", 0.69), ("D", 0.3), ("E", 0.31), ("F", 0.29)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let result =
            permutation_test_by_category(&values, &catalog, "resistance", "sensitivity", 200, Some(2))
                .unwrap();
        assert!(result.observed_difference > 0.3);
        // Only the identity split and its mirror are as extreme: 2 of 20 splits
        assert!(result.p_value < 0.2);
    }

    #[test]
    fn test_sparsity_zero_fraction_is_exact() {
        let values = ar2_series(48, 4);
        let timepoints: Vec<f64> = (0..48).map(|i| i as f64 * 2.0).collect();
        let result = sparsity_test(&timepoints, &values, &[0.0], 10, 10.0, Some(1)).unwrap();
        assert_eq!(result.levels[0].deviation_percent, 0.0);
        assert_eq!(result.levels[0].removed_points, 0);
        assert!(result.stable);
    }

    #[test]
    fn test_sparsity_levels_report_deviation() {
        let values = ar2_series(200, 5);
        let timepoints: Vec<f64> = (0..200).map(|i| i as f64).collect();
        let result =
            sparsity_test(&timepoints, &values, &[0.1, 0.3], 5, 10.0, Some(8)).unwrap();
        assert_eq!(result.levels.len(), 2);
        assert_eq!(result.levels[0].removed_points, 20);
        assert_eq!(result.levels[1].removed_points, 60);
        for level in &result.levels {
            assert!(level.deviation_percent >= 0.0);
            assert!(level.max_deviation_percent >= level.deviation_percent);
        }
        assert!(result.baseline_modulus > 0.4 && result.baseline_modulus < 0.9);
        assert!(sparsity_test(&timepoints, &values, &[1.5], 5, 10.0, None).is_err());
    }

    #[test]
    fn test_phase_shift_breaks_lagged_causality() {
        let mut rng = AnalysisRng::with_seed(6);
        let n = 240;
        let driver: Vec<f64> = (0..n).map(|_| rng.standard_normal()).collect();
        let mut response = vec![0.0; n];
        for t in 2..n {
            response[t] = 0.5 * response[t - 1] - 0.2 * response[t - 2]
                + 0.9 * driver[t - 1]
                + 0.3 * rng.standard_normal();
        }

        let result = phase_shift_test(&driver, &response, 1.0, 12.0, 2, 15.0).unwrap();
        assert_eq!(result.shift_samples, 12);
        assert!(result.baseline_causality.causality);
        assert!(result.eigen_invariant, "deviation {}", result.deviation_percent);
        assert!(result.causality_broken);
        assert!(result.phase_specificity_proven);
    }

    #[test]
    fn test_full_period_shift_is_identity() {
        let pattern = [0.2, 0.9, 1.4, 0.8, -0.3, -1.1, -0.7, 0.1];
        let response: Vec<f64> = pattern.repeat(6);
        let driver: Vec<f64> = response.iter().map(|v| v * 0.5).collect();
        // 8 samples of 3h = one 24h period
        let result = phase_shift_test(&driver, &response, 3.0, 24.0, 1, 15.0).unwrap();
        assert_eq!(result.shift_samples, 8);
        assert_eq!(result.deviation_percent, 0.0);
        assert_eq!(result.baseline_modulus, result.shifted_modulus);
    }

    #[test]
    fn test_modulus_bootstrap_degenerate_series() {
        let result = modulus_bootstrap_test(&[3.0; 20], 100, 0.95, Some(1)).unwrap();
        assert_eq!(result.degenerate, Some(DegenerateReason::ZeroVariance));
        assert_eq!(result.validation.original_estimate, 0.0);
        assert!(!result.passed());

        let stable = modulus_bootstrap_test(&ar2_series(150, 12), 200, 0.95, Some(1)).unwrap();
        assert!(stable.degenerate.is_none());
        assert!(stable.validation.confidence_interval.upper_bound < 1.0);
        assert!(stable.passed());
    }

    #[test]
    fn test_suite_runs_every_check() {
        let mut rng = AnalysisRng::with_seed(9);
        let n = 96;
        let driver: Vec<f64> = (0..n).map(|_| rng.standard_normal()).collect();
        let response = ar2_series(n, 10);
        let timepoints: Vec<f64> = (0..n).map(|i| i as f64 * 2.0).collect();
        let group_a = [0.7, 0.72, 0.68, 0.75];
        let group_b = [0.4, 0.42, 0.38, 0.45];
        let input = SuiteInput {
            timepoints: &timepoints,
            driver: &driver,
            response: &response,
            groups: Some((&group_a, &group_b)),
        };
        let config = EngineConfig::light().with_seed(21);

        let report = run_robustness_suite(&input, &config).unwrap();
        // permutation + bootstrap + sparsity + one phase shift
        assert_eq!(report.total, 4);
        assert_eq!(report.of_kind(RobustnessTestKind::PhaseShift).count(), 1);
        assert_eq!(
            report.passed,
            report.results.iter().filter(|r| r.passed()).count()
        );

        let again = run_robustness_suite(&input, &config).unwrap();
        assert_eq!(report, again);
    }
}
