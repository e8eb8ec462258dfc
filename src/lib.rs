//! # PAR(2) Validation
//!
//! Statistical validation engine for the circadian AR(2) persistence metric.
//!
//! The crate fits low-order autoregressive models to expression or
//! physiological time series, derives a scalar persistence metric (the
//! modulus of the dominant characteristic root of the AR(2) recurrence), and
//! cross-validates that metric against independent methods:
//!
//! - **Rhythm detection**: a JTK-like rank-correlation detector and a
//!   RAIN-like umbrella detector, each with Benjamini-Hochberg q-values
//! - **Model selection**: AR/ARMA candidates ranked by AIC or BIC, reporting
//!   where AR(2) lands
//! - **Causality**: Granger nested-regression F-tests
//! - **Robustness**: permutation tests, bootstrap intervals, sparsity stress
//!   tests and phase-shift tests
//!
//! Degenerate numerical situations (short or constant series, singular
//! systems) never raise: fits return [`FitOutcome::Degenerate`] and the
//! orchestrator falls back to conservative sentinel values. Contract
//! violations such as mismatched lengths or NaN input are rejected up front
//! with a [`ValidationError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use par2_validation::{compare_batch, render_report, EngineConfig, SeriesPanel};
//! use std::collections::BTreeMap;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let timepoints: Vec<f64> = (0..24).map(|i| i as f64 * 2.0).collect();
//!     let mut series = BTreeMap::new();
//!     series.insert(
//!         "Per2".to_string(),
//!         timepoints
//!             .iter()
//!             .map(|t| (2.0 * std::f64::consts::PI * t / 24.0).cos())
//!             .collect::<Vec<f64>>(),
//!     );
//!
//!     let panel = SeriesPanel::new(timepoints, series)?;
//!     let report = compare_batch(&panel, &EngineConfig::standard().with_seed(42))?;
//!     println!("{}", render_report(&report));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): batch comparison and resampling loops run on rayon
//! - `serde` (default): serialisable configuration and result records
//! - `long-tests`: slower integration tests with larger resampling budgets

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod linear_algebra;
pub mod math_utils;
pub mod results;
pub mod rng;
pub mod series;
pub mod special_functions;

// Analysis methods
pub mod autoregressive;
pub mod benchmark;
pub mod bootstrap;
pub mod causality;
pub mod generators;
pub mod multiple_testing;
pub mod reference;
pub mod rhythm_jtk;
pub mod rhythm_rain;
pub mod robustness;
pub mod roots;

// Re-exports for convenience - main public API
pub use benchmark::{compare_batch, compare_batch_cancellable, compare_series, render_report, BatchReport};
pub use config::{
    EigenBand, EngineConfig, ModelCriterion, ModelSelectionConfig, RhythmConfig, RobustnessConfig,
    DEFAULT_FDR_THRESHOLD, DEFAULT_PERIOD_HOURS,
};
pub use errors::{DegenerateReason, FitOutcome, ValidationError, ValidationResult};
pub use results::{
    classify_agreement, AgreementClass, Ar2Summary, BatchSummary, BenchmarkResult, CategoryCount,
};
pub use series::{SeriesPanel, TimeSeries};

// Model fitting exports
pub use autoregressive::{
    compare_models, fit_ar, fit_arma, information_criteria, ArFit, ArmaFit, ModelCandidate,
    ModelComparison,
};
pub use roots::{analyze_ar2_roots, in_stationarity_triangle, RootPoint, StabilityClass};

// Benchmark detector exports
pub use multiple_testing::{benjamini_hochberg, significant_indices};
pub use rhythm_jtk::{jtk_batch, jtk_test, JtkResult};
pub use rhythm_rain::{rain_batch, rain_test, PeakShape, RainResult};

// Causality exports
pub use causality::{
    granger_bidirectional, granger_causality, granger_lag_scan, BidirectionalGranger,
    GrangerResult,
};

// Robustness exports
pub use bootstrap::{
    bootstrap_ar2_modulus, bootstrap_validate, BootstrapConfiguration, BootstrapMethod,
    BootstrapValidation, ConfidenceInterval, ConfidenceIntervalMethod,
};
pub use reference::GeneSetCatalog;
pub use robustness::{
    modulus_bootstrap_test, permutation_test, permutation_test_by_category, phase_shift_test,
    run_robustness_suite, sparsity_test, ModulusBootstrapResult, PermutationTestResult,
    PhaseShiftResult, RobustnessReport, RobustnessResult, RobustnessTestKind, SparsityLevelResult,
    SparsityTestResult, SuiteInput,
};

// Data generation exports
pub use generators::{
    generate_ar2, generate_benchmark_series, generate_cosine_rhythm, generate_driven_pair,
    generate_white_noise, regular_timepoints, Ar2Config, BenchmarkSeriesType, CosineRhythm,
    DrivenPairConfig, GeneratorConfig,
};

// Special-function exports
pub use special_functions::{
    erf, f_distribution_cdf, f_distribution_sf, incomplete_beta, log_gamma, normal_cdf,
};
