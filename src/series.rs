//! Time series containers and grid operations.
//!
//! A [`SeriesPanel`] is the engine's input boundary: many named value arrays
//! aligned to one shared, strictly increasing timepoint axis. Length
//! mismatches are rejected at construction time so no model is ever fitted on
//! silently truncated data.

use crate::errors::{validate_all_finite, ValidationError, ValidationResult};
use crate::config::DEFAULT_PERIOD_HOURS;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum length for any fit to be meaningful.
pub const MIN_SERIES_LENGTH: usize = 4;
/// Minimum length for an AR(2) fit.
pub const MIN_AR2_LENGTH: usize = 5;

/// One named series of `(timepoint, value)` pairs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeSeries {
    /// Gene or channel identifier
    pub name: String,
    /// Strictly increasing sample times
    pub timepoints: Vec<f64>,
    /// Observed values, one per timepoint
    pub values: Vec<f64>,
}

impl TimeSeries {
    /// Build a validated series.
    pub fn new(name: impl Into<String>, timepoints: Vec<f64>, values: Vec<f64>) -> ValidationResult<Self> {
        let name = name.into();
        validate_timepoints(&timepoints)?;
        if values.len() != timepoints.len() {
            return Err(ValidationError::LengthMismatch {
                name,
                expected: timepoints.len(),
                actual: values.len(),
            });
        }
        validate_all_finite(&values, &name)?;
        Ok(Self {
            name,
            timepoints,
            values,
        })
    }

    /// Series on the integer grid `0, 1, ..., n-1`.
    pub fn from_values(name: impl Into<String>, values: Vec<f64>) -> ValidationResult<Self> {
        let timepoints = (0..values.len()).map(|i| i as f64).collect();
        Self::new(name, timepoints, values)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the series has no samples.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Median spacing between consecutive timepoints.
    pub fn sampling_interval(&self) -> f64 {
        infer_sampling_interval(&self.timepoints)
    }
}

/// Many series aligned to one shared timepoint axis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeriesPanel {
    timepoints: Vec<f64>,
    series: BTreeMap<String, Vec<f64>>,
    sampling_interval: f64,
    nominal_period: f64,
}

impl SeriesPanel {
    /// Build a panel, rejecting any series whose length differs from the axis.
    pub fn new(timepoints: Vec<f64>, series: BTreeMap<String, Vec<f64>>) -> ValidationResult<Self> {
        validate_timepoints(&timepoints)?;
        for (name, values) in &series {
            if values.len() != timepoints.len() {
                return Err(ValidationError::LengthMismatch {
                    name: name.clone(),
                    expected: timepoints.len(),
                    actual: values.len(),
                });
            }
            validate_all_finite(values, name)?;
        }
        let sampling_interval = infer_sampling_interval(&timepoints);
        Ok(Self {
            timepoints,
            series,
            sampling_interval,
            nominal_period: DEFAULT_PERIOD_HOURS,
        })
    }

    /// Override the inferred sampling interval.
    pub fn with_sampling_interval(mut self, interval: f64) -> ValidationResult<Self> {
        if !(interval > 0.0) || !interval.is_finite() {
            return Err(ValidationError::InvalidParameter {
                parameter: "sampling_interval".to_string(),
                value: interval,
                constraint: "must be finite and > 0".to_string(),
            });
        }
        self.sampling_interval = interval;
        Ok(self)
    }

    /// Override the nominal period (default 24).
    pub fn with_nominal_period(mut self, period: f64) -> ValidationResult<Self> {
        if !(period > 0.0) || !period.is_finite() {
            return Err(ValidationError::InvalidParameter {
                parameter: "nominal_period".to_string(),
                value: period,
                constraint: "must be finite and > 0".to_string(),
            });
        }
        self.nominal_period = period;
        Ok(self)
    }

    /// Shared timepoint axis.
    pub fn timepoints(&self) -> &[f64] {
        &self.timepoints
    }

    /// Sampling interval.
    pub fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    /// Nominal period.
    pub fn nominal_period(&self) -> f64 {
        self.nominal_period
    }

    /// Values for one identifier.
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// Iterate `(identifier, values)` in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.series.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Identifiers in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.series.keys().map(|k| k.as_str()).collect()
    }

    /// Number of series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True when the panel holds no series.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Materialise one series as a [`TimeSeries`].
    pub fn time_series(&self, name: &str) -> Option<TimeSeries> {
        self.series.get(name).map(|values| TimeSeries {
            name: name.to_string(),
            timepoints: self.timepoints.clone(),
            values: values.clone(),
        })
    }
}

/// Reject non-finite or non-increasing timepoint axes.
pub fn validate_timepoints(timepoints: &[f64]) -> ValidationResult<()> {
    validate_all_finite(timepoints, "timepoints")?;
    if let Some(index) = timepoints
        .windows(2)
        .position(|w| w[1] <= w[0])
        .map(|i| i + 1)
    {
        return Err(ValidationError::NonMonotonicTimepoints { index });
    }
    Ok(())
}

/// Median spacing of the timepoints; 1.0 when fewer than two points.
pub fn infer_sampling_interval(timepoints: &[f64]) -> f64 {
    if timepoints.len() < 2 {
        return 1.0;
    }
    let gaps: Vec<f64> = timepoints.windows(2).map(|w| w[1] - w[0]).collect();
    crate::math_utils::median(&gaps)
}

/// Rotate a series left by `shift` samples: `out[i] = values[(i + shift) mod n]`.
pub fn circular_shift(values: &[f64], shift: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let shift = shift % n;
    values[shift..]
        .iter()
        .chain(values[..shift].iter())
        .copied()
        .collect()
}

/// Number of samples corresponding to a shift in time units.
pub fn shift_in_samples(shift_time: f64, sampling_interval: f64, length: usize) -> usize {
    if length == 0 || !(sampling_interval > 0.0) {
        return 0;
    }
    let steps = (shift_time / sampling_interval).round();
    (steps.rem_euclid(length as f64)) as usize
}

/// Linearly interpolate known `(time, value)` samples onto `grid`.
///
/// Grid points before the first or after the last known time take the nearest
/// boundary value. `known_times` must be strictly increasing and non-empty.
pub fn interpolate_onto_grid(known_times: &[f64], known_values: &[f64], grid: &[f64]) -> Vec<f64> {
    debug_assert_eq!(known_times.len(), known_values.len());
    if known_times.is_empty() {
        return vec![f64::NAN; grid.len()];
    }
    let last = known_times.len() - 1;

    grid.iter()
        .map(|&t| {
            if t <= known_times[0] {
                return known_values[0];
            }
            if t >= known_times[last] {
                return known_values[last];
            }
            // First known time strictly greater than t
            let upper = known_times.partition_point(|&k| k <= t);
            let lower = upper - 1;
            let (t0, t1) = (known_times[lower], known_times[upper]);
            let (v0, v1) = (known_values[lower], known_values[upper]);
            if t == t0 {
                v0
            } else {
                v0 + (v1 - v0) * (t - t0) / (t1 - t0)
            }
        })
        .collect()
}
