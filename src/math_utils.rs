//! Descriptive statistics and small numeric helpers shared across modules.

use std::cmp::Ordering;

/// Variance below which a series is treated as constant.
pub const ZERO_VARIANCE_THRESHOLD: f64 = 1e-12;

/// Safe comparison for floating point values (NaN sorts last).
pub fn float_total_cmp(a: &f64, b: &f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
    }
}

/// Arithmetic mean; NaN for empty input.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Unbiased sample variance (n - 1 denominator); 0 for fewer than two points.
pub fn variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Sample standard deviation.
pub fn std_dev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Median (even lengths average the two middle values).
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut v = values.to_vec();
    v.sort_by(float_total_cmp);
    quantile_sorted(&v, 0.5)
}

/// Hyndman-Fan type 7 quantile of already sorted data.
///
/// `p` is clamped to `[0, 1]`; NaN for empty input.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let p = p.clamp(0.0, 1.0);
    let h = p * (sorted.len() - 1) as f64;
    let lower = h.floor() as usize;
    let frac = h - lower as f64;

    if lower + 1 < sorted.len() {
        sorted[lower] * (1.0 - frac) + sorted[lower + 1] * frac
    } else {
        sorted[sorted.len() - 1]
    }
}

/// Average ranks (1-based), ties share the mean of their positions.
pub fn average_ranks(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| float_total_cmp(&data[a], &data[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && data[order[j + 1]] == data[order[i]] {
            j += 1;
        }
        let shared = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = shared;
        }
        i = j + 1;
    }
    ranks
}

/// Sign with an exact zero for ties.
#[inline]
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// `n (n + 1) / 2`, the number of pairs among `n + 1` items.
#[inline]
pub fn triangular(n: usize) -> f64 {
    (n * (n + 1)) as f64 / 2.0
}

/// Relative deviation in percent, `|observed - baseline| / |baseline| * 100`.
///
/// A zero baseline yields 0 when the observation is also zero and 100
/// otherwise.
pub fn relative_deviation_percent(baseline: f64, observed: f64) -> f64 {
    if baseline.abs() < ZERO_VARIANCE_THRESHOLD {
        if observed.abs() < ZERO_VARIANCE_THRESHOLD {
            0.0
        } else {
            100.0
        }
    } else {
        (observed - baseline).abs() / baseline.abs() * 100.0
    }
}
