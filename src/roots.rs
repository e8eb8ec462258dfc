//! # AR(2) Characteristic Root Analysis
//!
//! Maps a coefficient pair `(φ1, φ2)` onto the roots of `z² - φ1·z - φ2 = 0`
//! and derives the persistence metric (eigenvalue modulus) together with
//! oscillation and damping descriptors.
//!
//! The mapping is closed-form and branch-stable: identical inputs always give
//! bit-identical outputs, since band membership downstream depends on it.

use crate::config::EigenBand;
use num_complex::Complex64;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Distance from the unit circle treated as a unit root.
pub const UNIT_ROOT_TOLERANCE: f64 = 1e-6;

/// Three-way stability classification of the dominant root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StabilityClass {
    /// Modulus strictly inside the unit circle
    Stable,
    /// Modulus within [`UNIT_ROOT_TOLERANCE`] of one
    UnitRoot,
    /// Modulus outside the unit circle
    Explosive,
}

/// Roots and derived descriptors of an AR(2) recurrence.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RootPoint {
    /// First lag coefficient
    pub phi1: f64,
    /// Second lag coefficient
    pub phi2: f64,
    /// `φ1² + 4φ2`
    pub discriminant: f64,
    /// Both characteristic roots (dominant first)
    pub roots: [Complex64; 2],
    /// Modulus of the dominant root
    pub modulus: f64,
    /// Argument of the dominant root in `[0, π]`
    pub angle: f64,
    /// True iff the discriminant is negative
    pub is_complex: bool,
    /// `-ln r`, complex roots only
    pub damping_rate: Option<f64>,
    /// `2π / θ · Δt`, complex roots only
    pub natural_period: Option<f64>,
    /// `ζ = δ / √(δ² + θ²)`, complex roots only
    pub damping_ratio: Option<f64>,
    /// Time for a perturbation to halve, for `0 < r < 1`
    pub half_life: Option<f64>,
    /// `modulus < 1`
    pub is_stable: bool,
    /// Stable / unit-root / explosive
    pub stability: StabilityClass,
    /// Root-space abscissa `r cos θ`
    pub x: f64,
    /// Root-space ordinate `r sin θ`
    pub y: f64,
}

impl RootPoint {
    /// Root point of the zero-coefficient sentinel fit.
    pub fn sentinel() -> Self {
        analyze_ar2_roots(0.0, 0.0, 1.0)
    }

    /// True when the modulus falls inside `band`.
    pub fn in_band(&self, band: &EigenBand) -> bool {
        band.contains(self.modulus)
    }
}

/// Analyse the AR(2) pair `(φ1, φ2)` sampled every `sampling_interval` time units.
///
/// # Example
/// ```rust
/// use par2_validation::roots::analyze_ar2_roots;
///
/// let point = analyze_ar2_roots(1.0, -0.5, 2.0);
/// assert!(point.is_complex);
/// assert!((point.modulus - 0.5_f64.sqrt()).abs() < 1e-12);
/// // θ = π/4 sampled every 2h gives a 16h cycle
/// assert!((point.natural_period.unwrap() - 16.0).abs() < 1e-9);
/// ```
pub fn analyze_ar2_roots(phi1: f64, phi2: f64, sampling_interval: f64) -> RootPoint {
    let discriminant = phi1 * phi1 + 4.0 * phi2;
    let is_complex = discriminant < 0.0;

    let (roots, modulus, angle) = if is_complex {
        let imag = (-discriminant).sqrt() / 2.0;
        let real = phi1 / 2.0;
        let modulus = (-phi2).sqrt();
        let angle = (-discriminant).sqrt().atan2(phi1);
        (
            [Complex64::new(real, imag), Complex64::new(real, -imag)],
            modulus,
            angle,
        )
    } else {
        let sqrt_d = discriminant.sqrt();
        let r1 = (phi1 + sqrt_d) / 2.0;
        let r2 = (phi1 - sqrt_d) / 2.0;
        let (dominant, other) = if r1.abs() >= r2.abs() { (r1, r2) } else { (r2, r1) };
        let angle = if dominant < 0.0 { PI } else { 0.0 };
        (
            [Complex64::new(dominant, 0.0), Complex64::new(other, 0.0)],
            dominant.abs(),
            angle,
        )
    };

    let (damping_rate, natural_period, damping_ratio) = if is_complex && modulus > 0.0 {
        let delta = -modulus.ln();
        let period = 2.0 * PI / angle * sampling_interval;
        let zeta = delta / (delta * delta + angle * angle).sqrt();
        (Some(delta), Some(period), Some(zeta))
    } else {
        (None, None, None)
    };

    let half_life = if modulus > 0.0 && modulus < 1.0 {
        Some(0.5_f64.ln() / modulus.ln() * sampling_interval)
    } else {
        None
    };

    let stability = if (modulus - 1.0).abs() <= UNIT_ROOT_TOLERANCE {
        StabilityClass::UnitRoot
    } else if modulus < 1.0 {
        StabilityClass::Stable
    } else {
        StabilityClass::Explosive
    };

    RootPoint {
        phi1,
        phi2,
        discriminant,
        roots,
        modulus,
        angle,
        is_complex,
        damping_rate,
        natural_period,
        damping_ratio,
        half_life,
        is_stable: modulus < 1.0,
        stability,
        x: modulus * angle.cos(),
        y: modulus * angle.sin(),
    }
}

/// True when `(φ1, φ2)` lies strictly inside the AR(2) stationarity triangle.
pub fn in_stationarity_triangle(phi1: f64, phi2: f64) -> bool {
    phi2 > -1.0 && phi2 < 1.0 - phi1 && phi2 < 1.0 + phi1
}
