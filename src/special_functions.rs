//! Special functions used by the significance tests.
//!
//! All functions are pure and deterministic. They are approximations: callers
//! should expect residual error around 1e-6 (normal CDF) or better (log-gamma,
//! incomplete beta) rather than exact values.
//!
//! Outside their documented domain the functions return NaN instead of
//! panicking.

use std::f64::consts::PI;

/// Lanczos approximation parameter.
const LANCZOS_G: f64 = 7.0;

/// Lanczos coefficients for g = 7, n = 9.
const LANCZOS_COEF: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Iteration cap for the incomplete-beta continued fraction.
const BETA_CF_MAX_ITER: usize = 200;
/// Floor applied to Lentz denominators.
const BETA_CF_FLOOR: f64 = 1e-10;
/// Convergence tolerance for the continued fraction.
const BETA_CF_TOLERANCE: f64 = 1e-12;

/// Natural logarithm of the gamma function.
///
/// Lanczos approximation for `x >= 0.5`; the reflection formula
/// `ln Γ(x) = ln(π / |sin πx|) - ln Γ(1 - x)` below that.
/// Returns NaN for NaN input and +inf at the poles (non-positive integers).
pub fn log_gamma(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }

    if x <= 0.0 && x == x.floor() {
        return f64::INFINITY;
    }

    if x < 0.5 {
        let sin_pi_x = (PI * x).sin();
        return (PI / sin_pi_x.abs()).ln() - log_gamma(1.0 - x);
    }

    let z = x - 1.0;
    let mut a = LANCZOS_COEF[0];
    let t = z + LANCZOS_G + 0.5;
    for (i, &coef) in LANCZOS_COEF.iter().enumerate().skip(1) {
        a += coef / (z + i as f64);
    }

    0.5 * (2.0 * PI).ln() + (z + 0.5) * t.ln() - t + a.ln()
}

/// Regularized incomplete beta function `I_x(a, b)`.
///
/// Evaluated with the modified Lentz continued fraction, using the symmetry
/// `I_x(a, b) = 1 - I_{1-x}(b, a)` to stay in the rapidly converging region.
/// Inputs are clamped at the ends of `[0, 1]`; NaN is returned for `a <= 0`
/// or `b <= 0`.
pub fn incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x.is_nan() || !(a > 0.0) || !(b > 0.0) {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front =
        log_gamma(a + b) - log_gamma(a) - log_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    let value = if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(x, a, b) / a
    } else {
        1.0 - front * beta_continued_fraction(1.0 - x, b, a) / b
    };

    value.clamp(0.0, 1.0)
}

/// Continued-fraction part of the incomplete beta function (Lentz).
fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < BETA_CF_FLOOR {
        d = BETA_CF_FLOOR;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=BETA_CF_MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        // Even step
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < BETA_CF_FLOOR {
            d = BETA_CF_FLOOR;
        }
        c = 1.0 + aa / c;
        if c.abs() < BETA_CF_FLOOR {
            c = BETA_CF_FLOOR;
        }
        d = 1.0 / d;
        h *= d * c;

        // Odd step
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < BETA_CF_FLOOR {
            d = BETA_CF_FLOOR;
        }
        c = 1.0 + aa / c;
        if c.abs() < BETA_CF_FLOOR {
            c = BETA_CF_FLOOR;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < BETA_CF_TOLERANCE {
            break;
        }
    }

    h
}

/// Error function, Abramowitz & Stegun formula 7.1.26 (|ε| < 1.5e-7).
pub fn erf(x: f64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    if x.abs() > 6.0 {
        return x.signum();
    }

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = x.signum();
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();

    sign * y
}

/// Standard normal cumulative distribution function.
pub fn normal_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }

    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Cumulative distribution function of the F distribution.
///
/// `P(F <= f) = I_{d1 f / (d1 f + d2)}(d1 / 2, d2 / 2)`. Returns 0 for
/// `f <= 0`, 1 for `f = +inf`, NaN for non-positive degrees of freedom.
pub fn f_distribution_cdf(f: f64, df1: f64, df2: f64) -> f64 {
    if f.is_nan() || !(df1 > 0.0) || !(df2 > 0.0) {
        return f64::NAN;
    }
    if f <= 0.0 {
        return 0.0;
    }
    if f.is_infinite() {
        return 1.0;
    }

    let x = df1 * f / (df1 * f + df2);
    incomplete_beta(x, df1 / 2.0, df2 / 2.0)
}

/// Upper-tail probability of the F distribution, clamped to `[0, 1]`.
pub fn f_distribution_sf(f: f64, df1: f64, df2: f64) -> f64 {
    (1.0 - f_distribution_cdf(f, df1, df2)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal};

    #[test]
    fn test_log_gamma_known_values() {
        // Γ(1) = Γ(2) = 1, Γ(5) = 24, Γ(1/2) = √π
        assert_approx_eq!(log_gamma(1.0), 0.0, 1e-12);
        assert_approx_eq!(log_gamma(2.0), 0.0, 1e-12);
        assert_approx_eq!(log_gamma(5.0), 24.0_f64.ln(), 1e-10);
        assert_approx_eq!(log_gamma(0.5), PI.sqrt().ln(), 1e-10);
    }

    #[test]
    fn test_log_gamma_matches_statrs() {
        for &x in &[0.1, 0.3, 0.7, 1.5, 3.2, 10.0, 42.5, 150.0] {
            let expected = statrs::function::gamma::ln_gamma(x);
            assert_approx_eq!(log_gamma(x), expected, 1e-8 * expected.abs().max(1.0));
        }
    }

    #[test]
    fn test_log_gamma_poles() {
        assert!(log_gamma(0.0).is_infinite());
        assert!(log_gamma(-2.0).is_infinite());
        assert!(log_gamma(-1.0).is_infinite());
        assert!(log_gamma(-7.0).is_infinite());
        assert!(log_gamma(-2.5).is_finite());
        assert!(log_gamma(f64::NAN).is_nan());
    }

    #[test]
    fn test_incomplete_beta_matches_statrs() {
        let cases = [
            (0.1, 0.5, 0.5),
            (0.3, 2.0, 3.0),
            (0.5, 1.0, 1.0),
            (0.75, 5.0, 2.5),
            (0.9, 10.0, 20.0),
            (0.02, 0.8, 4.0),
        ];
        for &(x, a, b) in &cases {
            let expected = statrs::function::beta::beta_reg(a, b, x);
            assert_approx_eq!(incomplete_beta(x, a, b), expected, 1e-6);
        }
    }

    #[test]
    fn test_incomplete_beta_symmetry() {
        for &(a, b) in &[(0.5, 0.5), (2.0, 7.0), (3.5, 1.25), (12.0, 4.0)] {
            for i in 1..20 {
                let x = i as f64 / 20.0;
                let total = incomplete_beta(x, a, b) + incomplete_beta(1.0 - x, b, a);
                assert_approx_eq!(total, 1.0, 1e-6);
            }
        }
    }

    #[test]
    fn test_incomplete_beta_bounds_and_domain() {
        assert_eq!(incomplete_beta(0.0, 2.0, 3.0), 0.0);
        assert_eq!(incomplete_beta(1.0, 2.0, 3.0), 1.0);
        assert_eq!(incomplete_beta(-0.5, 2.0, 3.0), 0.0);
        assert!(incomplete_beta(0.5, 0.0, 3.0).is_nan());
        assert!(incomplete_beta(0.5, 2.0, -1.0).is_nan());
        // I_x(1, 1) is the uniform CDF
        assert_approx_eq!(incomplete_beta(0.37, 1.0, 1.0), 0.37, 1e-9);
    }

    #[test]
    fn test_normal_cdf_matches_statrs() {
        let normal = Normal::new(0.0, 1.0).unwrap();
        for i in -40..=40 {
            let x = i as f64 * 0.1;
            assert_approx_eq!(normal_cdf(x), normal.cdf(x), 1e-6);
        }
        assert_eq!(normal_cdf(-10.0), 0.0);
        assert_eq!(normal_cdf(10.0), 1.0);
        assert_approx_eq!(normal_cdf(0.0), 0.5, 1e-12);
    }

    #[test]
    fn test_f_distribution_cdf_matches_statrs() {
        for &(df1, df2) in &[(1.0, 10.0), (2.0, 20.0), (3.0, 7.0), (5.0, 40.0)] {
            let reference = FisherSnedecor::new(df1, df2).unwrap();
            for &f in &[0.1, 0.5, 1.0, 2.0, 4.5, 10.0] {
                assert_approx_eq!(f_distribution_cdf(f, df1, df2), reference.cdf(f), 1e-6);
            }
        }
    }

    #[test]
    fn test_f_distribution_edges() {
        assert_eq!(f_distribution_cdf(0.0, 2.0, 10.0), 0.0);
        assert_eq!(f_distribution_cdf(-1.0, 2.0, 10.0), 0.0);
        assert_eq!(f_distribution_cdf(f64::INFINITY, 2.0, 10.0), 1.0);
        assert!(f_distribution_cdf(1.0, 0.0, 10.0).is_nan());
        assert_eq!(f_distribution_sf(0.0, 2.0, 10.0), 1.0);
        let sf = f_distribution_sf(3.0, 2.0, 30.0);
        assert!(sf > 0.0 && sf < 0.1);
    }
}
