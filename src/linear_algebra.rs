//! Dense linear algebra for the regression-based components.
//!
//! The systems solved here are tiny (at most a handful of lag coefficients),
//! so a partial-pivot Gaussian elimination on `Vec<Vec<f64>>` is sufficient.
//! Singular systems are not errors: [`solve_linear_system`] reports them as
//! [`LinearSolution::Singular`] and every caller decides its own fallback.

use crate::errors::{ValidationError, ValidationResult};

/// Pivot magnitude below which a system is treated as singular.
pub const PIVOT_TOLERANCE: f64 = 1e-10;

/// Ridge term added to the diagonal of the normal equations.
pub const RIDGE_EPSILON: f64 = 1e-8;

/// Outcome of solving `A x = b`.
#[derive(Debug, Clone, PartialEq)]
pub enum LinearSolution {
    /// Unique solution
    Solved(Vec<f64>),
    /// Elimination hit a pivot smaller than [`PIVOT_TOLERANCE`]
    Singular {
        /// Column at which elimination stopped
        column: usize,
        /// Largest available pivot magnitude in that column
        pivot: f64,
    },
}

/// Validates that a matrix is square with the given dimension and finite.
fn ensure_square_system(a: &[Vec<f64>], b: &[f64], operation: &str) -> ValidationResult<()> {
    let n = b.len();
    if a.len() != n {
        return Err(ValidationError::NumericalError {
            reason: format!("Matrix has {} rows but right-hand side has {}", a.len(), n),
            operation: Some(operation.to_string()),
        });
    }
    for (i, row) in a.iter().enumerate() {
        if row.len() != n {
            return Err(ValidationError::NumericalError {
                reason: format!("Row {} has length {} but expected {}", i, row.len(), n),
                operation: Some(operation.to_string()),
            });
        }
        if let Some(j) = row.iter().position(|v| !v.is_finite()) {
            return Err(ValidationError::NumericalError {
                reason: format!("Non-finite value ({}) at position [{},{}]", row[j], i, j),
                operation: Some(operation.to_string()),
            });
        }
    }
    if let Some(i) = b.iter().position(|v| !v.is_finite()) {
        return Err(ValidationError::NumericalError {
            reason: format!("Non-finite value ({}) at position [{}]", b[i], i),
            operation: Some(operation.to_string()),
        });
    }
    Ok(())
}

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `Err` only for malformed input (ragged or non-square matrix,
/// non-finite entries). A numerically singular system is reported as
/// `Ok(LinearSolution::Singular { .. })`.
pub fn solve_linear_system(a: &[Vec<f64>], b: &[f64]) -> ValidationResult<LinearSolution> {
    ensure_square_system(a, b, "solve_linear_system")?;
    let n = b.len();
    if n == 0 {
        return Ok(LinearSolution::Solved(Vec::new()));
    }

    // Augmented working copy
    let mut m: Vec<Vec<f64>> = a
        .iter()
        .zip(b.iter())
        .map(|(row, &rhs)| {
            let mut r = row.clone();
            r.push(rhs);
            r
        })
        .collect();

    for col in 0..n {
        let (pivot_row, pivot_abs) = (col..n)
            .map(|r| (r, m[r][col].abs()))
            .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if pivot_abs < PIVOT_TOLERANCE {
            return Ok(LinearSolution::Singular {
                column: col,
                pivot: pivot_abs,
            });
        }

        m.swap(col, pivot_row);

        for r in (col + 1)..n {
            let factor = m[r][col] / m[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..=n {
                m[r][c] -= factor * m[col][c];
            }
        }
    }

    // Back substitution
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = m[i][n];
        for j in (i + 1)..n {
            sum -= m[i][j] * x[j];
        }
        x[i] = sum / m[i][i];
    }

    Ok(LinearSolution::Solved(x))
}

/// Ordinary least squares via ridge-stabilised normal equations.
///
/// `x` is observation-major: `x[t]` holds the `p` regressors for observation
/// `t`. Solves `(XᵗX + εI) β = XᵗY` with `ε = RIDGE_EPSILON`.
pub fn fit_ols(x: &[Vec<f64>], y: &[f64]) -> ValidationResult<LinearSolution> {
    if x.len() != y.len() {
        return Err(ValidationError::NumericalError {
            reason: format!(
                "Design matrix has {} rows but response has {} values",
                x.len(),
                y.len()
            ),
            operation: Some("fit_ols".to_string()),
        });
    }
    let p = x.first().map(|row| row.len()).unwrap_or(0);
    if x.iter().any(|row| row.len() != p) {
        return Err(ValidationError::NumericalError {
            reason: "Ragged design matrix (inconsistent row lengths)".to_string(),
            operation: Some("fit_ols".to_string()),
        });
    }

    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, &target) in x.iter().zip(y.iter()) {
        for i in 0..p {
            xty[i] += row[i] * target;
            for j in i..p {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
        xtx[i][i] += RIDGE_EPSILON;
    }

    solve_linear_system(&xtx, &xty)
}

/// Residuals `y - Xβ` for an observation-major design matrix.
pub fn compute_residuals(x: &[Vec<f64>], y: &[f64], coeffs: &[f64]) -> Vec<f64> {
    debug_assert_eq!(x.len(), y.len(), "design rows must match response length");

    x.iter()
        .zip(y.iter())
        .map(|(row, &target)| {
            let fitted: f64 = row.iter().zip(coeffs.iter()).map(|(v, c)| v * c).sum();
            target - fitted
        })
        .collect()
}

/// Sum of squared residuals.
pub fn sum_of_squares(residuals: &[f64]) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}
