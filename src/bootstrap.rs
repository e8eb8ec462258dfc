//! # Bootstrap Confidence Intervals
//!
//! Resampling-based intervals for arbitrary scalar statistics, with iid
//! resampling for exchangeable data and circular block resampling for
//! autocorrelated series. Each replicate draws from its own seeded stream
//! (see [`crate::rng::AnalysisRng::for_iteration`]) so sequential and parallel
//! runs agree exactly.
//!
//! ## Example
//!
//! ```rust
//! use par2_validation::bootstrap::{bootstrap_validate, BootstrapConfiguration};
//!
//! let data: Vec<f64> = (0..50).map(|i| (i % 7) as f64).collect();
//! let config = BootstrapConfiguration { seed: Some(42), ..Default::default() };
//! let mean = |x: &[f64]| x.iter().sum::<f64>() / x.len() as f64;
//!
//! let result = bootstrap_validate(&data, mean, &config).unwrap();
//! let ci = &result.confidence_interval;
//! assert!(ci.lower_bound <= result.original_estimate);
//! assert!(result.original_estimate <= ci.upper_bound);
//! ```

use crate::autoregressive::fit_ar;
use crate::errors::{
    validate_all_finite, validate_data_length, validate_probability, FitOutcome, ValidationError,
    ValidationResult,
};
use crate::math_utils::{float_total_cmp, mean, quantile_sorted, std_dev};
use crate::rng::AnalysisRng;
use crate::roots::analyze_ar2_roots;
use once_cell::sync::Lazy;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Minimum data points for bootstrap resampling.
pub const MIN_BOOTSTRAP_POINTS: usize = 3;

// Cached standard normal for interval critical values
static STANDARD_NORMAL: Lazy<Option<Normal>> = Lazy::new(|| Normal::new(0.0, 1.0).ok());

/// Resampling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BootstrapMethod {
    /// iid resampling with replacement
    #[default]
    Standard,
    /// Circular block resampling; `None` picks `⌈n^(1/3)⌉`
    CircularBlock {
        /// Block length
        block_size: Option<usize>,
    },
}

/// Interval construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConfidenceIntervalMethod {
    /// Empirical quantiles of the replicates
    #[default]
    BootstrapPercentile,
    /// Estimate ± z · bootstrap standard error
    Normal,
}

/// Bootstrap settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BootstrapConfiguration {
    /// Number of replicates
    pub num_bootstrap_samples: usize,
    /// Resampling scheme
    pub bootstrap_method: BootstrapMethod,
    /// Two-sided confidence level
    pub confidence_level: f64,
    /// Interval construction
    pub confidence_interval_method: ConfidenceIntervalMethod,
    /// Base seed; OS entropy when `None`
    pub seed: Option<u64>,
}

impl Default for BootstrapConfiguration {
    fn default() -> Self {
        Self {
            num_bootstrap_samples: 1_000,
            bootstrap_method: BootstrapMethod::Standard,
            confidence_level: 0.95,
            confidence_interval_method: ConfidenceIntervalMethod::BootstrapPercentile,
            seed: None,
        }
    }
}

/// Confidence interval with method information.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfidenceInterval {
    /// Confidence level (e.g. 0.95)
    pub confidence_level: f64,
    /// Lower bound
    pub lower_bound: f64,
    /// Upper bound
    pub upper_bound: f64,
    /// Construction method
    pub method: ConfidenceIntervalMethod,
}

impl ConfidenceInterval {
    /// True when `value` lies inside the closed interval.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower_bound && value <= self.upper_bound
    }

    /// Interval width.
    pub fn width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

/// Bootstrap distribution summary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BootstrapValidation {
    /// Statistic on the original data
    pub original_estimate: f64,
    /// Finite replicate values
    pub bootstrap_estimates: Vec<f64>,
    /// Mean replicate minus the original estimate
    pub bias: f64,
    /// Standard deviation of the replicates
    pub standard_error: f64,
    /// Interval at the configured level
    pub confidence_interval: ConfidenceInterval,
    /// Replicates dropped for being non-finite
    pub dropped_replicates: usize,
}

/// Default circular block length, `⌈n^(1/3)⌉` clamped to `[1, n]`.
pub fn default_block_size(n: usize) -> usize {
    ((n as f64).cbrt().ceil() as usize).clamp(1, n.max(1))
}

/// Fill `buffer` with an iid resample of `data`.
pub fn standard_resample(data: &[f64], buffer: &mut [f64], rng: &mut AnalysisRng) {
    let n = data.len();
    if n == 0 {
        return;
    }
    for slot in buffer.iter_mut() {
        *slot = data[rng.index(n)];
    }
}

/// Fill `buffer` with wrapped blocks of `data` starting at random offsets.
pub fn circular_block_resample(
    data: &[f64],
    buffer: &mut [f64],
    block_size: usize,
    rng: &mut AnalysisRng,
) {
    let n = data.len();
    if n == 0 || buffer.is_empty() {
        return;
    }
    let block_size = block_size.clamp(1, n);
    let mut pos = 0;
    while pos < buffer.len() {
        let start = rng.index(n);
        let take = (buffer.len() - pos).min(block_size);
        for i in 0..take {
            buffer[pos + i] = data[(start + i) % n];
        }
        pos += take;
    }
}

fn draw_replicate<F>(data: &[f64], estimator: &F, config: &BootstrapConfiguration, index: usize) -> f64
where
    F: Fn(&[f64]) -> f64,
{
    let mut rng = AnalysisRng::for_iteration(config.seed, index);
    let mut buffer = vec![0.0; data.len()];
    match config.bootstrap_method {
        BootstrapMethod::Standard => standard_resample(data, &mut buffer, &mut rng),
        BootstrapMethod::CircularBlock { block_size } => {
            let block = block_size.unwrap_or_else(|| default_block_size(data.len()));
            circular_block_resample(data, &mut buffer, block, &mut rng)
        }
    }
    estimator(&buffer)
}

/// Percentile interval from replicate values (type 7 quantiles).
pub fn calculate_percentile_interval(
    bootstrap_estimates: &[f64],
    original_estimate: f64,
    confidence_level: f64,
) -> ConfidenceInterval {
    let mut sorted: Vec<f64> = bootstrap_estimates
        .iter()
        .copied()
        .filter(|x| x.is_finite())
        .collect();
    sorted.sort_by(float_total_cmp);

    let alpha = 1.0 - confidence_level;
    let (lower_bound, upper_bound) = if sorted.is_empty() {
        (original_estimate, original_estimate)
    } else {
        (
            quantile_sorted(&sorted, alpha / 2.0),
            quantile_sorted(&sorted, 1.0 - alpha / 2.0),
        )
    };

    ConfidenceInterval {
        confidence_level,
        lower_bound,
        upper_bound,
        method: ConfidenceIntervalMethod::BootstrapPercentile,
    }
}

/// Normal-approximation interval `estimate ± z · se`.
pub fn calculate_normal_interval(
    estimate: f64,
    standard_error: f64,
    confidence_level: f64,
) -> ValidationResult<ConfidenceInterval> {
    let normal = STANDARD_NORMAL
        .as_ref()
        .ok_or_else(|| ValidationError::NumericalError {
            reason: "standard normal distribution unavailable".to_string(),
            operation: Some("calculate_normal_interval".to_string()),
        })?;
    let alpha = 1.0 - confidence_level;
    let margin = normal.inverse_cdf(1.0 - alpha / 2.0) * standard_error;

    let (lower_bound, upper_bound) = if margin.is_finite() {
        (estimate - margin, estimate + margin)
    } else {
        (estimate, estimate)
    };

    Ok(ConfidenceInterval {
        confidence_level,
        lower_bound,
        upper_bound,
        method: ConfidenceIntervalMethod::Normal,
    })
}

/// Bootstrap a scalar statistic of `data`.
///
/// Non-finite replicates are dropped (and logged). Returns `Err` when the
/// data or configuration is unusable, the original estimate is non-finite, or
/// every replicate is non-finite.
pub fn bootstrap_validate<F>(
    data: &[f64],
    estimator: F,
    config: &BootstrapConfiguration,
) -> ValidationResult<BootstrapValidation>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    validate_data_length(data, MIN_BOOTSTRAP_POINTS, "bootstrap_validate")?;
    validate_all_finite(data, "bootstrap data")?;
    validate_probability(config.confidence_level, "confidence_level")?;
    if config.num_bootstrap_samples == 0 {
        return Err(ValidationError::InvalidParameter {
            parameter: "num_bootstrap_samples".to_string(),
            value: 0.0,
            constraint: "must be >= 1".to_string(),
        });
    }

    let original_estimate = estimator(data);
    if !original_estimate.is_finite() {
        return Err(ValidationError::NumericalError {
            reason: "Non-finite original estimate".to_string(),
            operation: Some("bootstrap_validate".to_string()),
        });
    }

    #[cfg(feature = "parallel")]
    let replicates: Vec<f64> = {
        use rayon::prelude::*;
        (0..config.num_bootstrap_samples)
            .into_par_iter()
            .map(|i| draw_replicate(data, &estimator, config, i))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let replicates: Vec<f64> = (0..config.num_bootstrap_samples)
        .map(|i| draw_replicate(data, &estimator, config, i))
        .collect();

    let total = replicates.len();
    let bootstrap_estimates: Vec<f64> = replicates.into_iter().filter(|x| x.is_finite()).collect();
    let dropped_replicates = total - bootstrap_estimates.len();
    if dropped_replicates > 0 {
        log::warn!(
            "{} of {} bootstrap replicates were non-finite and dropped",
            dropped_replicates,
            total
        );
    }
    if bootstrap_estimates.is_empty() {
        return Err(ValidationError::NumericalError {
            reason: "No valid bootstrap estimates generated".to_string(),
            operation: Some("bootstrap_validate".to_string()),
        });
    }

    let bias = mean(&bootstrap_estimates) - original_estimate;
    let standard_error = std_dev(&bootstrap_estimates);

    let confidence_interval = match config.confidence_interval_method {
        ConfidenceIntervalMethod::BootstrapPercentile => calculate_percentile_interval(
            &bootstrap_estimates,
            original_estimate,
            config.confidence_level,
        ),
        ConfidenceIntervalMethod::Normal => {
            calculate_normal_interval(original_estimate, standard_error, config.confidence_level)?
        }
    };

    Ok(BootstrapValidation {
        original_estimate,
        bootstrap_estimates,
        bias,
        standard_error,
        confidence_interval,
        dropped_replicates,
    })
}

/// AR(2) eigenvalue modulus of a series, NaN when the fit is degenerate.
pub fn ar2_modulus(series: &[f64]) -> f64 {
    match fit_ar(series, 2) {
        Ok(FitOutcome::Fitted(fit)) => {
            analyze_ar2_roots(fit.coefficients[0], fit.coefficients[1], 1.0).modulus
        }
        _ => f64::NAN,
    }
}

/// Circular-block bootstrap interval for the AR(2) eigenvalue modulus.
///
/// Resamples whole blocks so short-range autocorrelation survives within each
/// replicate.
pub fn bootstrap_ar2_modulus(
    series: &[f64],
    iterations: usize,
    confidence_level: f64,
    seed: Option<u64>,
) -> ValidationResult<BootstrapValidation> {
    let config = BootstrapConfiguration {
        num_bootstrap_samples: iterations,
        bootstrap_method: BootstrapMethod::CircularBlock { block_size: None },
        confidence_level,
        confidence_interval_method: ConfidenceIntervalMethod::BootstrapPercentile,
        seed,
    };
    bootstrap_validate(series, ar2_modulus, &config)
}
