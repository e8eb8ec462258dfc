//! # Engine Configuration
//!
//! Plain parameter structs controlling the search grids, model orders,
//! significance thresholds and resampling budgets. Nothing is read from the
//! environment; callers construct these directly or start from a preset.

use crate::errors::{validate_parameter, validate_probability, ValidationError, ValidationResult};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default nominal period (hours).
pub const DEFAULT_PERIOD_HOURS: f64 = 24.0;
/// Default false discovery rate threshold.
pub const DEFAULT_FDR_THRESHOLD: f64 = 0.05;

/// Information criterion used for model ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ModelCriterion {
    /// Akaike information criterion
    #[default]
    Aic,
    /// Bayesian information criterion
    Bic,
}

/// Closed modulus interval marking the "stable persistence" band.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EigenBand {
    /// Inclusive lower bound
    pub lower: f64,
    /// Inclusive upper bound
    pub upper: f64,
}

impl Default for EigenBand {
    fn default() -> Self {
        Self {
            lower: 0.40,
            upper: 0.80,
        }
    }
}

impl EigenBand {
    /// True when `modulus` lies inside the band.
    pub fn contains(&self, modulus: f64) -> bool {
        modulus >= self.lower && modulus <= self.upper
    }
}

/// Period/phase search grid for the rhythm detectors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RhythmConfig {
    /// Nominal period in the units of the timepoints
    pub nominal_period: f64,
    /// Candidate periods searched by the JTK-like detector
    pub period_grid: Vec<f64>,
    /// Number of evenly spaced phase offsets per candidate period
    pub phase_steps: usize,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            nominal_period: DEFAULT_PERIOD_HOURS,
            period_grid: vec![20.0, 22.0, 24.0, 26.0, 28.0],
            phase_steps: 12,
        }
    }
}

/// AR/ARMA model-selection settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelSelectionConfig {
    /// Maximum autoregressive order
    pub max_p: usize,
    /// Maximum moving-average order
    pub max_q: usize,
    /// Ranking criterion
    pub criterion: ModelCriterion,
}

impl Default for ModelSelectionConfig {
    fn default() -> Self {
        Self {
            max_p: 3,
            max_q: 2,
            criterion: ModelCriterion::Aic,
        }
    }
}

/// Resampling budgets and stress-test levels.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RobustnessConfig {
    /// Label shuffles in the permutation test
    pub permutations: usize,
    /// Bootstrap replicates
    pub bootstrap_iterations: usize,
    /// Bootstrap confidence level
    pub confidence_level: f64,
    /// Fractions of timepoints removed in the sparsity test
    pub sparsity_levels: Vec<f64>,
    /// Random deletions per sparsity level
    pub sparsity_trials: usize,
    /// Maximum eigenvalue deviation (percent) counted as stable under sparsity
    pub sparsity_tolerance_percent: f64,
    /// Circular shifts applied in the phase-shift test (hours)
    pub phase_shift_hours: Vec<f64>,
    /// Maximum eigenvalue deviation (percent) counted as shift-invariant
    pub phase_shift_tolerance_percent: f64,
    /// Lag used by the Granger test
    pub granger_lag: usize,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            permutations: 2_000,
            bootstrap_iterations: 1_000,
            confidence_level: 0.95,
            sparsity_levels: vec![0.1, 0.2, 0.3],
            sparsity_trials: 10,
            sparsity_tolerance_percent: 10.0,
            phase_shift_hours: vec![6.0, 12.0],
            phase_shift_tolerance_percent: 15.0,
            granger_lag: 2,
        }
    }
}

/// Complete configuration for one analysis request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Rhythm-detector search grid
    pub rhythm: RhythmConfig,
    /// Model-selection settings
    pub model: ModelSelectionConfig,
    /// FDR threshold applied to BH q-values
    pub fdr_threshold: f64,
    /// Eigenvalue band used for classification
    pub eigen_band: EigenBand,
    /// Robustness-suite settings
    pub robustness: RobustnessConfig,
    /// AR(2) rank at or below which the model counts as supported
    pub max_supporting_rank: usize,
    /// Sampling interval; inferred from the timepoints when `None`
    pub sampling_interval: Option<f64>,
    /// Base seed for all resampling; OS entropy when `None`
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl EngineConfig {
    /// Light configuration: small grids and resampling budgets.
    pub fn light() -> Self {
        Self {
            rhythm: RhythmConfig {
                period_grid: vec![DEFAULT_PERIOD_HOURS],
                phase_steps: 8,
                ..RhythmConfig::default()
            },
            model: ModelSelectionConfig {
                max_p: 2,
                max_q: 1,
                criterion: ModelCriterion::Aic,
            },
            robustness: RobustnessConfig {
                permutations: 200,
                bootstrap_iterations: 200,
                sparsity_levels: vec![0.2],
                sparsity_trials: 3,
                phase_shift_hours: vec![12.0],
                ..RobustnessConfig::default()
            },
            ..Self::standard()
        }
    }

    /// Standard configuration (default).
    pub fn standard() -> Self {
        Self {
            rhythm: RhythmConfig::default(),
            model: ModelSelectionConfig::default(),
            fdr_threshold: DEFAULT_FDR_THRESHOLD,
            eigen_band: EigenBand::default(),
            robustness: RobustnessConfig::default(),
            max_supporting_rank: 2,
            sampling_interval: None,
            seed: None,
        }
    }

    /// Deep configuration: denser grids and larger resampling budgets.
    pub fn deep() -> Self {
        Self {
            rhythm: RhythmConfig {
                period_grid: (18..=30).map(|p| p as f64).collect(),
                phase_steps: 24,
                ..RhythmConfig::default()
            },
            model: ModelSelectionConfig {
                max_p: 4,
                max_q: 3,
                criterion: ModelCriterion::Aic,
            },
            robustness: RobustnessConfig {
                permutations: 10_000,
                bootstrap_iterations: 5_000,
                sparsity_levels: vec![0.1, 0.2, 0.3, 0.4, 0.5],
                sparsity_trials: 25,
                phase_shift_hours: vec![4.0, 6.0, 8.0, 12.0],
                ..RobustnessConfig::default()
            },
            ..Self::standard()
        }
    }

    /// Builder-style seed setter.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject configurations no analysis could run with.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_probability(self.fdr_threshold, "fdr_threshold")?;

        if !(self.rhythm.nominal_period > 0.0) {
            return Err(ValidationError::InvalidParameter {
                parameter: "nominal_period".to_string(),
                value: self.rhythm.nominal_period,
                constraint: "must be > 0".to_string(),
            });
        }
        if self.rhythm.period_grid.is_empty() {
            return Err(ValidationError::InvalidParameter {
                parameter: "period_grid".to_string(),
                value: 0.0,
                constraint: "must contain at least one period".to_string(),
            });
        }
        if let Some(&bad) = self.rhythm.period_grid.iter().find(|p| !(**p > 0.0)) {
            return Err(ValidationError::InvalidParameter {
                parameter: "period_grid".to_string(),
                value: bad,
                constraint: "periods must be > 0".to_string(),
            });
        }
        if self.rhythm.phase_steps == 0 {
            return Err(ValidationError::InvalidParameter {
                parameter: "phase_steps".to_string(),
                value: 0.0,
                constraint: "must be >= 1".to_string(),
            });
        }
        if self.model.max_p == 0 && self.model.max_q == 0 {
            return Err(ValidationError::InvalidParameter {
                parameter: "max_p".to_string(),
                value: 0.0,
                constraint: "max_p and max_q cannot both be 0".to_string(),
            });
        }

        validate_parameter(self.eigen_band.lower, 0.0, self.eigen_band.upper, "eigen_band.lower")?;

        let r = &self.robustness;
        if r.permutations == 0 {
            return Err(ValidationError::InvalidParameter {
                parameter: "permutations".to_string(),
                value: 0.0,
                constraint: "must be >= 1".to_string(),
            });
        }
        if r.bootstrap_iterations == 0 {
            return Err(ValidationError::InvalidParameter {
                parameter: "bootstrap_iterations".to_string(),
                value: 0.0,
                constraint: "must be >= 1".to_string(),
            });
        }
        validate_probability(r.confidence_level, "confidence_level")?;
        for &level in &r.sparsity_levels {
            validate_parameter(level, 0.0, 0.9, "sparsity_level")?;
        }
        if r.granger_lag == 0 {
            return Err(ValidationError::InvalidParameter {
                parameter: "granger_lag".to_string(),
                value: 0.0,
                constraint: "must be >= 1".to_string(),
            });
        }
        if let Some(interval) = self.sampling_interval {
            if !(interval > 0.0) {
                return Err(ValidationError::InvalidParameter {
                    parameter: "sampling_interval".to_string(),
                    value: interval,
                    constraint: "must be > 0".to_string(),
                });
            }
        }

        Ok(())
    }
}
