//! Error types, degenerate-fit outcomes and validation helpers.
//!
//! Two kinds of failure are kept apart here. Caller contract violations
//! (mismatched lengths, non-finite input, invalid configuration) are reported
//! through [`ValidationError`] before any model is fit. Numerical degeneracy
//! (too-short series, zero variance, singular systems) is not an error: fitting
//! routines return a [`FitOutcome`] so a single gene can degrade to sentinel
//! values without aborting a multi-gene run.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when an analysis request violates its input contract.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    /// Insufficient data for the requested operation.
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData {
        /// Minimum required data points
        required: usize,
        /// Actual number of data points provided
        actual: usize,
    },

    /// Invalid parameter value.
    #[error("Invalid parameter: {parameter} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value provided
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// A series does not line up with the shared timepoint axis.
    #[error("Length mismatch for {name}: expected {expected} values, got {actual}")]
    LengthMismatch {
        /// Series identifier
        name: String,
        /// Expected length (number of timepoints)
        expected: usize,
        /// Actual length supplied
        actual: usize,
    },

    /// Timepoints must be strictly increasing.
    #[error("Timepoints are not strictly increasing at index {index}")]
    NonMonotonicTimepoints {
        /// First index whose timepoint does not exceed its predecessor
        index: usize,
    },

    /// Non-finite input or an unrecoverable numerical failure.
    #[error("Numerical computation failed: {reason}")]
    NumericalError {
        /// Detailed reason for the failure
        reason: String,
        /// Operation that failed
        operation: Option<String>,
    },

    /// A comparison group has no members.
    #[error("Group '{group}' has no members")]
    EmptyGroup {
        /// Group label
        group: String,
    },

    /// A batch run was cancelled before it completed.
    #[error("Batch cancelled after {completed} series")]
    Cancelled {
        /// Number of series that finished before the cancellation was observed
        completed: usize,
    },
}

/// Result type for validation-engine operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Why a fit fell back to sentinel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DegenerateReason {
    /// Series too short for the requested model order
    InsufficientLength {
        /// Minimum usable length
        required: usize,
        /// Length supplied
        actual: usize,
    },
    /// Series (or residual series) has no variance
    ZeroVariance,
    /// The normal equations could not be solved
    SingularSystem,
    /// Not enough residual degrees of freedom for the test
    NoDegreesOfFreedom,
}

impl std::fmt::Display for DegenerateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegenerateReason::InsufficientLength { required, actual } => {
                write!(f, "insufficient length (need {}, got {})", required, actual)
            }
            DegenerateReason::ZeroVariance => write!(f, "zero variance"),
            DegenerateReason::SingularSystem => write!(f, "singular system"),
            DegenerateReason::NoDegreesOfFreedom => write!(f, "no residual degrees of freedom"),
        }
    }
}

/// Outcome of a numerical fit: a legitimate estimate or an explicit degeneracy.
///
/// A weak but genuine signal is always `Fitted`; `Degenerate` means the fit
/// could not be computed at all.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FitOutcome<T> {
    /// The model was fitted
    Fitted(T),
    /// The model could not be fitted; sentinel values apply
    Degenerate(DegenerateReason),
}

impl<T> FitOutcome<T> {
    /// True when the fit succeeded.
    pub fn is_fitted(&self) -> bool {
        matches!(self, FitOutcome::Fitted(_))
    }

    /// Borrow the fitted value, if any.
    pub fn fitted(&self) -> Option<&T> {
        match self {
            FitOutcome::Fitted(value) => Some(value),
            FitOutcome::Degenerate(_) => None,
        }
    }

    /// The degeneracy reason, if the fit failed.
    pub fn degenerate_reason(&self) -> Option<DegenerateReason> {
        match self {
            FitOutcome::Fitted(_) => None,
            FitOutcome::Degenerate(reason) => Some(*reason),
        }
    }

    /// Map the fitted value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FitOutcome<U> {
        match self {
            FitOutcome::Fitted(value) => FitOutcome::Fitted(f(value)),
            FitOutcome::Degenerate(reason) => FitOutcome::Degenerate(reason),
        }
    }

    /// Unwrap the fitted value or build the sentinel.
    pub fn fit_or_else<F: FnOnce(DegenerateReason) -> T>(self, sentinel: F) -> T {
        match self {
            FitOutcome::Fitted(value) => value,
            FitOutcome::Degenerate(reason) => sentinel(reason),
        }
    }
}

/// Validates that data has sufficient length for analysis.
///
/// # Example
/// ```rust
/// use par2_validation::errors::validate_data_length;
///
/// let data = vec![1.0, 2.0, 3.0];
/// assert!(validate_data_length(&data, 2, "test").is_ok());
/// assert!(validate_data_length(&data, 5, "test").is_err());
/// ```
pub fn validate_data_length(
    data: &[f64],
    min_required: usize,
    operation: &str,
) -> ValidationResult<()> {
    if data.len() < min_required {
        log::debug!(
            "{}: {} points supplied, {} required",
            operation,
            data.len(),
            min_required
        );
        Err(ValidationError::InsufficientData {
            required: min_required,
            actual: data.len(),
        })
    } else {
        Ok(())
    }
}

/// Validates that a parameter lies in `[min, max]`.
///
/// # Example
/// ```rust
/// use par2_validation::errors::validate_parameter;
///
/// assert!(validate_parameter(0.05, 0.0, 1.0, "fdr_threshold").is_ok());
/// assert!(validate_parameter(1.5, 0.0, 1.0, "fdr_threshold").is_err());
/// ```
pub fn validate_parameter(value: f64, min: f64, max: f64, name: &str) -> ValidationResult<()> {
    if value.is_nan() {
        return Err(ValidationError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: "must not be NaN".to_string(),
        });
    }

    if min.is_nan() || max.is_nan() || min > max {
        return Err(ValidationError::NumericalError {
            reason: format!(
                "Invalid bounds for parameter {}: min={}, max={}",
                name, min, max
            ),
            operation: None,
        });
    }

    if value < min || value > max {
        Err(ValidationError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: format!("[{}, {}]", min, max),
        })
    } else {
        Ok(())
    }
}

/// Validates a probability-like threshold in the open interval (0, 1).
pub fn validate_probability(value: f64, name: &str) -> ValidationResult<()> {
    if value.is_nan() || value <= 0.0 || value >= 1.0 {
        return Err(ValidationError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: "must be in (0, 1)".to_string(),
        });
    }
    Ok(())
}

/// Validates that a value is finite.
pub fn validate_finite(value: f64, name: &str) -> ValidationResult<()> {
    if !value.is_finite() {
        Err(ValidationError::NumericalError {
            reason: format!("{} is not finite: {}", name, value),
            operation: None,
        })
    } else {
        Ok(())
    }
}

/// Validates that all values in a slice are finite.
///
/// Returns on the first non-finite value.
///
/// # Example
/// ```rust
/// use par2_validation::errors::validate_all_finite;
///
/// assert!(validate_all_finite(&[1.0, 2.0, 3.0], "expression").is_ok());
/// assert!(validate_all_finite(&[1.0, f64::NAN, 3.0], "expression").is_err());
/// ```
pub fn validate_all_finite(data: &[f64], name: &str) -> ValidationResult<()> {
    if let Some((i, &value)) = data.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        let value_desc = if value.is_nan() {
            "NaN".to_string()
        } else if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };

        return Err(ValidationError::NumericalError {
            reason: format!(
                "{} contains non-finite value at index {}: {}",
                name, i, value_desc
            ),
            operation: None,
        });
    }

    Ok(())
}
