//! # Autoregressive Model Fitting
//!
//! Conditional least-squares estimation of AR(p) models and a two-stage
//! ARMA(p, q) approximation, plus information-criterion model ranking.
//!
//! ## Estimation
//!
//! The series is demeaned and the lag coefficients solve the normal equations
//! built from lagged cross-products (`(XᵗX + εI) φ = Xᵗy`, see
//! [`crate::linear_algebra::fit_ols`]). Log-likelihood, AIC and BIC use the
//! Gaussian form over the `n - p` conditioned observations:
//!
//! ```text
//! ℓ   = -½ · n_eff · (ln 2π + ln σ² + 1)
//! AIC = -2ℓ + 2k
//! BIC = -2ℓ + k · ln n_eff
//! ```
//!
//! with `k = p + q + 1` (lag coefficients plus the innovation variance).
//!
//! ## ARMA is approximate
//!
//! [`fit_arma`] does **not** maximise the exact ARMA likelihood. It fits AR(p),
//! then fits AR(q) to the AR residuals and reports those coefficients as the
//! moving-average part. Estimates will differ from exact MLE routines in
//! reference statistical packages.

use crate::config::ModelCriterion;
use crate::errors::{
    validate_all_finite, DegenerateReason, FitOutcome, ValidationError, ValidationResult,
};
use crate::linear_algebra::{compute_residuals, fit_ols, sum_of_squares, LinearSolution};
use crate::math_utils::{mean, variance, ZERO_VARIANCE_THRESHOLD};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Floor applied to the residual variance before taking its logarithm.
const MIN_RESIDUAL_VARIANCE: f64 = 1e-12;

/// A fitted AR(p) model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArFit {
    /// Lag coefficients `φ1..φp`
    pub coefficients: Vec<f64>,
    /// Mean removed before fitting
    pub mean: f64,
    /// Innovation variance `RSS / n_eff`
    pub residual_variance: f64,
    /// Gaussian log-likelihood
    pub log_likelihood: f64,
    /// Akaike information criterion
    pub aic: f64,
    /// Bayesian information criterion
    pub bic: f64,
    /// In-sample residuals for observations `p..n`
    pub residuals: Vec<f64>,
    /// Number of conditioned observations (`n - p`)
    pub n_effective: usize,
}

impl ArFit {
    /// Conservative values reported when no fit was possible.
    pub fn sentinel(order: usize) -> Self {
        Self {
            coefficients: vec![0.0; order],
            mean: 0.0,
            residual_variance: 0.0,
            log_likelihood: f64::NEG_INFINITY,
            aic: f64::INFINITY,
            bic: f64::INFINITY,
            residuals: Vec::new(),
            n_effective: 0,
        }
    }

    /// Model order `p`.
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    /// Criterion value used for ranking.
    pub fn score(&self, criterion: ModelCriterion) -> f64 {
        match criterion {
            ModelCriterion::Aic => self.aic,
            ModelCriterion::Bic => self.bic,
        }
    }

    /// One-step-ahead in-sample predictions for observations `p..n` of `series`.
    pub fn one_step_predictions(&self, series: &[f64]) -> Vec<f64> {
        let p = self.order();
        if series.len() <= p {
            return Vec::new();
        }
        (p..series.len())
            .map(|t| self.predict_from(&series[..t]))
            .collect()
    }

    /// Iterated forecasts `horizon` steps beyond the end of `history`.
    pub fn forecast(&self, history: &[f64], horizon: usize) -> Vec<f64> {
        let mut extended = history.to_vec();
        for _ in 0..horizon {
            let next = self.predict_from(&extended);
            extended.push(next);
        }
        extended.split_off(history.len())
    }

    fn predict_from(&self, history: &[f64]) -> f64 {
        let n = history.len();
        self.mean
            + self
                .coefficients
                .iter()
                .enumerate()
                .filter(|(lag, _)| *lag < n)
                .map(|(lag, phi)| phi * (history[n - 1 - lag] - self.mean))
                .sum::<f64>()
    }
}

/// A two-stage ARMA(p, q) approximation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArmaFit {
    /// Autoregressive coefficients from stage one
    pub ar_coefficients: Vec<f64>,
    /// Residual-autoregression coefficients standing in for the MA part
    pub ma_coefficients: Vec<f64>,
    /// Final innovation variance
    pub residual_variance: f64,
    /// Gaussian log-likelihood over the final residuals
    pub log_likelihood: f64,
    /// Akaike information criterion
    pub aic: f64,
    /// Bayesian information criterion
    pub bic: f64,
    /// Final residuals
    pub residuals: Vec<f64>,
    /// Observations contributing to the final residuals
    pub n_effective: usize,
}

impl ArmaFit {
    /// Conservative values reported when no fit was possible.
    pub fn sentinel(p: usize, q: usize) -> Self {
        Self {
            ar_coefficients: vec![0.0; p],
            ma_coefficients: vec![0.0; q],
            residual_variance: 0.0,
            log_likelihood: f64::NEG_INFINITY,
            aic: f64::INFINITY,
            bic: f64::INFINITY,
            residuals: Vec::new(),
            n_effective: 0,
        }
    }

    /// Criterion value used for ranking.
    pub fn score(&self, criterion: ModelCriterion) -> f64 {
        match criterion {
            ModelCriterion::Aic => self.aic,
            ModelCriterion::Bic => self.bic,
        }
    }

    /// Criteria recomputed over the last `window` residuals only.
    pub fn criteria_over_window(&self, window: usize) -> (f64, f64, f64) {
        let window = window.min(self.residuals.len());
        let tail = &self.residuals[self.residuals.len() - window..];
        let k = self.ar_coefficients.len() + self.ma_coefficients.len() + 1;
        let (_, log_likelihood, aic, bic) =
            information_criteria(sum_of_squares(tail), window, k);
        (log_likelihood, aic, bic)
    }
}

/// Gaussian log-likelihood, AIC and BIC for `k` parameters over `n_eff` residuals.
pub fn information_criteria(rss: f64, n_eff: usize, k: usize) -> (f64, f64, f64, f64) {
    let n = n_eff as f64;
    let sigma2 = (rss / n).max(MIN_RESIDUAL_VARIANCE);
    let log_likelihood = -0.5 * n * ((2.0 * PI).ln() + sigma2.ln() + 1.0);
    let aic = -2.0 * log_likelihood + 2.0 * k as f64;
    let bic = -2.0 * log_likelihood + k as f64 * n.ln();
    (sigma2, log_likelihood, aic, bic)
}

/// Fit an AR(p) model by conditional least squares.
///
/// Returns `Err` for non-finite input. Series with `n <= p + 1`, zero
/// variance, or a singular lag system yield [`FitOutcome::Degenerate`].
pub fn fit_ar(series: &[f64], p: usize) -> ValidationResult<FitOutcome<ArFit>> {
    validate_all_finite(series, "series")?;
    let n = series.len();

    if n <= p + 1 {
        log::debug!("AR({}) fit skipped: {} observations", p, n);
        return Ok(FitOutcome::Degenerate(DegenerateReason::InsufficientLength {
            required: p + 2,
            actual: n,
        }));
    }
    if variance(series) < ZERO_VARIANCE_THRESHOLD {
        log::debug!("AR({}) fit skipped: constant series", p);
        return Ok(FitOutcome::Degenerate(DegenerateReason::ZeroVariance));
    }

    let m = mean(series);
    let centered: Vec<f64> = series.iter().map(|x| x - m).collect();

    let design: Vec<Vec<f64>> = (p..n)
        .map(|t| (1..=p).map(|lag| centered[t - lag]).collect())
        .collect();
    let response = &centered[p..];

    let coefficients = if p == 0 {
        Vec::new()
    } else {
        match fit_ols(&design, response)? {
            LinearSolution::Solved(beta) => beta,
            LinearSolution::Singular { column, pivot } => {
                log::warn!(
                    "AR({}) normal equations singular at column {} (pivot {:.3e})",
                    p,
                    column,
                    pivot
                );
                return Ok(FitOutcome::Degenerate(DegenerateReason::SingularSystem));
            }
        }
    };

    let residuals = if p == 0 {
        response.to_vec()
    } else {
        compute_residuals(&design, response, &coefficients)
    };
    let n_effective = n - p;
    let (residual_variance, log_likelihood, aic, bic) =
        information_criteria(sum_of_squares(&residuals), n_effective, p + 1);

    Ok(FitOutcome::Fitted(ArFit {
        coefficients,
        mean: m,
        residual_variance,
        log_likelihood,
        aic,
        bic,
        residuals,
        n_effective,
    }))
}

/// Fit the two-stage ARMA(p, q) approximation.
///
/// When the stage-one residuals carry no variance the MA coefficients are zero
/// and the stage-one residuals are kept.
pub fn fit_arma(series: &[f64], p: usize, q: usize) -> ValidationResult<FitOutcome<ArmaFit>> {
    let stage_one = match fit_ar(series, p)? {
        FitOutcome::Fitted(fit) => fit,
        FitOutcome::Degenerate(reason) => return Ok(FitOutcome::Degenerate(reason)),
    };

    if q == 0 {
        return Ok(FitOutcome::Fitted(ArmaFit {
            ar_coefficients: stage_one.coefficients,
            ma_coefficients: Vec::new(),
            residual_variance: stage_one.residual_variance,
            log_likelihood: stage_one.log_likelihood,
            aic: stage_one.aic,
            bic: stage_one.bic,
            residuals: stage_one.residuals,
            n_effective: stage_one.n_effective,
        }));
    }

    let (ma_coefficients, residuals) = match fit_ar(&stage_one.residuals, q)? {
        FitOutcome::Fitted(stage_two) => (stage_two.coefficients, stage_two.residuals),
        FitOutcome::Degenerate(DegenerateReason::ZeroVariance) => {
            (vec![0.0; q], stage_one.residuals.clone())
        }
        FitOutcome::Degenerate(reason) => return Ok(FitOutcome::Degenerate(reason)),
    };

    let n_effective = residuals.len();
    let (residual_variance, log_likelihood, aic, bic) =
        information_criteria(sum_of_squares(&residuals), n_effective, p + q + 1);

    Ok(FitOutcome::Fitted(ArmaFit {
        ar_coefficients: stage_one.coefficients,
        ma_coefficients,
        residual_variance,
        log_likelihood,
        aic,
        bic,
        residuals,
        n_effective,
    }))
}

/// One ranked entry of a model comparison.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelCandidate {
    /// Autoregressive order
    pub p: usize,
    /// Moving-average order
    pub q: usize,
    /// Log-likelihood (`-inf` when degenerate)
    pub log_likelihood: f64,
    /// AIC (`+inf` when degenerate)
    pub aic: f64,
    /// BIC (`+inf` when degenerate)
    pub bic: f64,
    /// 1-based rank under the chosen criterion
    pub rank: usize,
    /// Why the fit failed, if it did
    pub degenerate: Option<DegenerateReason>,
}

/// All candidate `(p, q)` models ranked by one criterion.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelComparison {
    /// Criterion used for ranking
    pub criterion: ModelCriterion,
    /// Candidates in rank order
    pub candidates: Vec<ModelCandidate>,
    /// Rank of the `(2, 0)` model; `None` when it was not a candidate or its fit was degenerate
    pub ar2_rank: Option<usize>,
}

impl ModelComparison {
    /// Best non-degenerate candidate.
    pub fn best(&self) -> Option<&ModelCandidate> {
        self.candidates.first().filter(|c| c.degenerate.is_none())
    }

    /// Candidate for a specific order.
    pub fn candidate(&self, p: usize, q: usize) -> Option<&ModelCandidate> {
        self.candidates.iter().find(|c| c.p == p && c.q == q)
    }
}

/// Fit every `(p, q)` with `p <= max_p`, `q <= max_q`, `(p, q) != (0, 0)` and rank them.
///
/// Every candidate is scored on the same trailing window of
/// `n - max_p - max_q` residuals, so higher orders gain nothing from
/// conditioning on fewer observations. When that window is shorter than two
/// observations each candidate keeps its own criteria. Degenerate fits rank
/// last; ties go to fewer parameters, then lower `p`.
pub fn compare_models(
    series: &[f64],
    max_p: usize,
    max_q: usize,
    criterion: ModelCriterion,
) -> ValidationResult<ModelComparison> {
    if max_p == 0 && max_q == 0 {
        return Err(ValidationError::InvalidParameter {
            parameter: "max_p".to_string(),
            value: 0.0,
            constraint: "max_p and max_q cannot both be 0".to_string(),
        });
    }

    let window = series.len().saturating_sub(max_p + max_q);
    let mut candidates = Vec::with_capacity((max_p + 1) * (max_q + 1) - 1);
    for p in 0..=max_p {
        for q in 0..=max_q {
            if p == 0 && q == 0 {
                continue;
            }
            let candidate = match fit_arma(series, p, q)? {
                FitOutcome::Fitted(fit) => {
                    let (log_likelihood, aic, bic) = if window >= 2 {
                        fit.criteria_over_window(window)
                    } else {
                        (fit.log_likelihood, fit.aic, fit.bic)
                    };
                    ModelCandidate {
                        p,
                        q,
                        log_likelihood,
                        aic,
                        bic,
                        rank: 0,
                        degenerate: None,
                    }
                }
                FitOutcome::Degenerate(reason) => {
                    let sentinel = ArmaFit::sentinel(p, q);
                    ModelCandidate {
                        p,
                        q,
                        log_likelihood: sentinel.log_likelihood,
                        aic: sentinel.aic,
                        bic: sentinel.bic,
                        rank: 0,
                        degenerate: Some(reason),
                    }
                }
            };
            candidates.push(candidate);
        }
    }

    let score = |c: &ModelCandidate| match criterion {
        ModelCriterion::Aic => c.aic,
        ModelCriterion::Bic => c.bic,
    };
    candidates.sort_by(|a, b| {
        score(a)
            .total_cmp(&score(b))
            .then((a.p + a.q).cmp(&(b.p + b.q)))
            .then(a.p.cmp(&b.p))
    });
    for (i, candidate) in candidates.iter_mut().enumerate() {
        candidate.rank = i + 1;
    }

    // A degenerate AR(2) carries only its sentinel score and never ranks
    let ar2_rank = candidates
        .iter()
        .find(|c| c.p == 2 && c.q == 0 && c.degenerate.is_none())
        .map(|c| c.rank);

    Ok(ModelComparison {
        criterion,
        candidates,
        ar2_rank,
    })
}
