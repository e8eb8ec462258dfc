//! Multiple-testing correction across a batch of genes.

use crate::math_utils::float_total_cmp;

/// Benjamini-Hochberg adjusted p-values (q-values), in input order.
///
/// Non-finite p-values are treated as 1. Each q-value is
/// `min_{j >= i} (p_(j) · m / j)` capped at 1, so q-values are non-decreasing
/// in sorted p-value order and never smaller than their own p-value.
///
/// # Example
/// ```rust
/// use par2_validation::multiple_testing::benjamini_hochberg;
///
/// let q = benjamini_hochberg(&[0.01, 0.04, 0.03, 0.005]);
/// assert!((q[3] - 0.02).abs() < 1e-12);
/// assert!((q[1] - 0.04).abs() < 1e-12);
/// ```
pub fn benjamini_hochberg(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len();
    if m == 0 {
        return Vec::new();
    }

    let cleaned: Vec<f64> = p_values
        .iter()
        .map(|&p| if p.is_finite() { p.clamp(0.0, 1.0) } else { 1.0 })
        .collect();

    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| float_total_cmp(&cleaned[a], &cleaned[b]));

    let mf = m as f64;
    let mut adjusted = vec![1.0; m];
    let mut running_min = f64::INFINITY;
    for (position, &idx) in order.iter().enumerate().rev() {
        let rank = position + 1;
        let candidate = (cleaned[idx] * mf / rank as f64).min(1.0);
        running_min = running_min.min(candidate);
        adjusted[idx] = running_min;
    }

    adjusted
}

/// Indices whose q-value is strictly below `threshold`.
pub fn significant_indices(q_values: &[f64], threshold: f64) -> Vec<usize> {
    q_values
        .iter()
        .enumerate()
        .filter(|(_, q)| **q < threshold)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_bh_known_values() {
        let p = [0.01, 0.04, 0.03, 0.005];
        let q = benjamini_hochberg(&p);
        // sorted: 0.005, 0.01, 0.03, 0.04 -> 0.02, 0.02, 0.04, 0.04
        assert_approx_eq!(q[3], 0.02, 1e-12);
        assert_approx_eq!(q[0], 0.02, 1e-12);
        assert_approx_eq!(q[2], 0.04, 1e-12);
        assert_approx_eq!(q[1], 0.04, 1e-12);
    }

    #[test]
    fn test_bh_monotone_and_dominates_p() {
        let p = [0.8, 0.001, 0.2, 0.049, 0.5, 0.012, 0.3, 0.0401, 0.9, 0.07];
        let q = benjamini_hochberg(&p);
        for (pi, qi) in p.iter().zip(q.iter()) {
            assert!(qi >= pi);
            assert!(*qi <= 1.0);
        }
        let mut order: Vec<usize> = (0..p.len()).collect();
        order.sort_by(|&a, &b| p[a].partial_cmp(&p[b]).unwrap());
        assert!(order.windows(2).all(|w| q[w[0]] <= q[w[1]]));
    }

    #[test]
    fn test_bh_edge_cases() {
        assert!(benjamini_hochberg(&[]).is_empty());
        assert_eq!(benjamini_hochberg(&[0.03]), vec![0.03]);
        let q = benjamini_hochberg(&[f64::NAN, 0.01]);
        assert_eq!(q[0], 1.0);
        assert_approx_eq!(q[1], 0.02, 1e-12);
    }

    #[test]
    fn test_significant_indices() {
        assert_eq!(significant_indices(&[0.01, 0.2, 0.049, 0.05], 0.05), vec![0, 2]);
    }
}
