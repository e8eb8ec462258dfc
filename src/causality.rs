//! # Granger Causality
//!
//! Nested-regression F-test of whether the past of a `cause` series improves
//! prediction of an `effect` series beyond the effect's own past.
//!
//! With `L` lags and `n = len - L` usable observations, the restricted model
//! regresses `effect[t]` on an intercept and `effect[t-1..t-L]`; the
//! unrestricted model adds `cause[t-1..t-L]`. Then
//!
//! ```text
//! F = ((SSR_r - SSR_u) / L) / (SSR_u / (n - 2L - 1))
//! ```
//!
//! and the p-value is the upper tail of `F(L, n - 2L - 1)`. Degenerate inputs
//! never produce NaN: they report `causality = false`, `F = 0`, `p = 1`.

use crate::errors::{validate_all_finite, DegenerateReason, ValidationError, ValidationResult};
use crate::linear_algebra::{compute_residuals, fit_ols, sum_of_squares, LinearSolution};
use crate::special_functions::f_distribution_sf;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Significance level for declaring causality.
pub const GRANGER_ALPHA: f64 = 0.05;

/// Unrestricted SSR below which the F ratio is not computed.
const MIN_UNRESTRICTED_SSR: f64 = 1e-12;

/// Outcome of one Granger test.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrangerResult {
    /// `p_value < 0.05 && f_statistic > 0`
    pub causality: bool,
    /// F statistic (clamped at 0)
    pub f_statistic: f64,
    /// Upper-tail p-value
    pub p_value: f64,
    /// Numerator degrees of freedom
    pub df1: usize,
    /// Denominator degrees of freedom (0 when degenerate)
    pub df2: usize,
    /// Lag order tested
    pub lag: usize,
    /// Restricted-model SSR
    pub ssr_restricted: f64,
    /// Unrestricted-model SSR
    pub ssr_unrestricted: f64,
    /// Set when the test fell back to the null result
    pub degenerate: Option<DegenerateReason>,
}

impl GrangerResult {
    /// The conservative no-causality result.
    pub fn null(lag: usize, reason: DegenerateReason) -> Self {
        Self {
            causality: false,
            f_statistic: 0.0,
            p_value: 1.0,
            df1: lag,
            df2: 0,
            lag,
            ssr_restricted: 0.0,
            ssr_unrestricted: 0.0,
            degenerate: Some(reason),
        }
    }
}

fn lagged_design(cause: Option<&[f64]>, effect: &[f64], lag: usize) -> Vec<Vec<f64>> {
    (lag..effect.len())
        .map(|t| {
            let mut row = Vec::with_capacity(1 + 2 * lag);
            row.push(1.0);
            row.extend((1..=lag).map(|l| effect[t - l]));
            if let Some(cause) = cause {
                row.extend((1..=lag).map(|l| cause[t - l]));
            }
            row
        })
        .collect()
}

fn regression_ssr(design: &[Vec<f64>], response: &[f64]) -> ValidationResult<Option<f64>> {
    match fit_ols(design, response)? {
        LinearSolution::Solved(beta) => Ok(Some(sum_of_squares(&compute_residuals(
            design, response, &beta,
        )))),
        LinearSolution::Singular { .. } => Ok(None),
    }
}

/// Test whether `cause` Granger-causes `effect` at the given lag.
///
/// Returns `Err` for mismatched lengths, non-finite values or `lag == 0`.
pub fn granger_causality(cause: &[f64], effect: &[f64], lag: usize) -> ValidationResult<GrangerResult> {
    if cause.len() != effect.len() {
        return Err(ValidationError::LengthMismatch {
            name: "cause".to_string(),
            expected: effect.len(),
            actual: cause.len(),
        });
    }
    if lag == 0 {
        return Err(ValidationError::InvalidParameter {
            parameter: "lag".to_string(),
            value: 0.0,
            constraint: "must be >= 1".to_string(),
        });
    }
    validate_all_finite(cause, "cause")?;
    validate_all_finite(effect, "effect")?;

    let n_obs = effect.len().saturating_sub(lag);
    let unrestricted_params = 2 * lag + 1;
    if n_obs <= unrestricted_params {
        log::debug!(
            "Granger lag {}: {} usable observations, no residual degrees of freedom",
            lag,
            n_obs
        );
        return Ok(GrangerResult::null(lag, DegenerateReason::NoDegreesOfFreedom));
    }
    let df1 = lag;
    let df2 = n_obs - unrestricted_params;

    let response = &effect[lag..];
    let restricted = lagged_design(None, effect, lag);
    let unrestricted = lagged_design(Some(cause), effect, lag);

    let (ssr_r, ssr_u) = match (
        regression_ssr(&restricted, response)?,
        regression_ssr(&unrestricted, response)?,
    ) {
        (Some(r), Some(u)) => (r, u),
        _ => return Ok(GrangerResult::null(lag, DegenerateReason::SingularSystem)),
    };

    if ssr_u < MIN_UNRESTRICTED_SSR {
        return Ok(GrangerResult {
            ssr_restricted: ssr_r,
            ssr_unrestricted: ssr_u,
            ..GrangerResult::null(lag, DegenerateReason::ZeroVariance)
        });
    }

    let f_statistic = (((ssr_r - ssr_u) / df1 as f64) / (ssr_u / df2 as f64)).max(0.0);
    let p_value = if f_statistic > 0.0 {
        f_distribution_sf(f_statistic, df1 as f64, df2 as f64).clamp(0.0, 1.0)
    } else {
        1.0
    };

    Ok(GrangerResult {
        causality: p_value < GRANGER_ALPHA && f_statistic > 0.0,
        f_statistic,
        p_value,
        df1,
        df2,
        lag,
        ssr_restricted: ssr_r,
        ssr_unrestricted: ssr_u,
        degenerate: None,
    })
}

/// Run the test for every lag in `1..=max_lag` and return all results plus the
/// lag with the smallest p-value.
pub fn granger_lag_scan(
    cause: &[f64],
    effect: &[f64],
    max_lag: usize,
) -> ValidationResult<(Vec<GrangerResult>, Option<usize>)> {
    let results = (1..=max_lag)
        .map(|lag| granger_causality(cause, effect, lag))
        .collect::<ValidationResult<Vec<_>>>()?;
    let best = results
        .iter()
        .filter(|r| r.degenerate.is_none())
        .min_by(|a, b| a.p_value.total_cmp(&b.p_value))
        .map(|r| r.lag);
    Ok((results, best))
}

/// Granger tests in both directions between two series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BidirectionalGranger {
    /// `x` → `y`
    pub forward: GrangerResult,
    /// `y` → `x`
    pub reverse: GrangerResult,
}

impl BidirectionalGranger {
    /// Causality detected in exactly one direction.
    pub fn is_unidirectional(&self) -> bool {
        self.forward.causality != self.reverse.causality
    }

    /// Causality detected both ways.
    pub fn is_feedback(&self) -> bool {
        self.forward.causality && self.reverse.causality
    }
}

/// Test `x → y` and `y → x` at the same lag.
pub fn granger_bidirectional(x: &[f64], y: &[f64], lag: usize) -> ValidationResult<BidirectionalGranger> {
    Ok(BidirectionalGranger {
        forward: granger_causality(x, y, lag)?,
        reverse: granger_causality(y, x, lag)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::AnalysisRng;

    fn white_noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = AnalysisRng::with_seed(seed);
        (0..n).map(|_| rng.standard_normal()).collect()
    }

    fn driven_pair(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
        let driver = white_noise(n, seed);
        let noise = white_noise(n, seed + 1000);
        let mut response = vec![0.0; n];
        for t in 1..n {
            response[t] = 0.8 * driver[t - 1] + 0.3 * noise[t];
        }
        (driver, response)
    }

    #[test]
    fn test_detects_lagged_driver() {
        let (driver, response) = driven_pair(200, 1);
        let result = granger_causality(&driver, &response, 2).unwrap();
        assert!(result.causality);
        assert!(result.f_statistic > 10.0);
        assert!(result.p_value < 1e-6);
        assert_eq!(result.df1, 2);
        assert_eq!(result.df2, 198 - 5);
        assert!(result.degenerate.is_none());
    }

    #[test]
    fn test_bidirectional_is_unidirectional_for_driver() {
        let (driver, response) = driven_pair(200, 2);
        let both = granger_bidirectional(&driver, &response, 1).unwrap();
        assert!(both.forward.causality);
        assert!(both.forward.p_value < both.reverse.p_value);
    }

    #[test]
    fn test_independent_noise_rarely_causal() {
        let positives = (0..40)
            .filter(|&seed| {
                let x = white_noise(120, seed * 2);
                let y = white_noise(120, seed * 2 + 1);
                granger_causality(&x, &y, 2).unwrap().causality
            })
            .count();
        assert!(positives <= 8, "{} false positives out of 40", positives);
    }

    #[test]
    fn test_degenerate_inputs_return_null() {
        let short = granger_causality(&[1.0, 2.0, 3.0, 4.0], &[2.0, 1.0, 2.0, 1.0], 2).unwrap();
        assert!(!short.causality);
        assert_eq!(short.f_statistic, 0.0);
        assert_eq!(short.p_value, 1.0);
        assert_eq!(short.degenerate, Some(DegenerateReason::NoDegreesOfFreedom));

        // Perfectly predictable effect leaves no unrestricted residual
        let cause: Vec<f64> = (0..30).map(|i| (i as f64 * 0.7).sin()).collect();
        let effect: Vec<f64> = (0..30).map(|i| 2.0 + 0.5 * i as f64).collect();
        let fitted = granger_causality(&cause, &effect, 1).unwrap();
        assert!(!fitted.causality);
        assert_eq!(fitted.p_value, 1.0);
        assert!(fitted.f_statistic.is_finite());
    }

    #[test]
    fn test_contract_violations_are_errors() {
        assert!(granger_causality(&[1.0; 10], &[1.0; 9], 1).is_err());
        assert!(granger_causality(&[1.0; 10], &[1.0; 10], 0).is_err());
        let mut bad = vec![1.0; 10];
        bad[3] = f64::NAN;
        assert!(granger_causality(&bad, &[1.0; 10], 1).is_err());
    }

    #[test]
    fn test_lag_scan_reports_best_lag() {
        let (driver, response) = driven_pair(150, 5);
        let (results, best) = granger_lag_scan(&driver, &response, 3).unwrap();
        assert_eq!(results.len(), 3);
        assert!(best.is_some());
        assert!(results.iter().all(|r| r.causality));
    }
}
