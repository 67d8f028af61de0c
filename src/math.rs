//! Shared numerical primitives anchored on `nalgebra`.

use nalgebra::{DMatrix, DVector};

/// Primary scalar type used across the crate.
pub type Scalar = f64;
/// Dense, dynamically sized real matrix.
pub type Matrix = DMatrix<Scalar>;
/// Dense, dynamically sized real column vector.
pub type Vector = DVector<Scalar>;
/// Primary complex scalar type (eigenvalues of non-symmetric matrices).
pub type CScalar = num_complex::Complex<Scalar>;

/// Relative tolerance applied to singular values when estimating rank.
///
/// Matches the usual `max(rows, cols) * eps * sigma_max` cutoff.
const RANK_EPSILON: Scalar = Scalar::EPSILON;

/// Relative tolerance for treating an eigenvalue's imaginary part (or a
/// slightly-wrong-signed real part) as zero.
const EIGEN_TOLERANCE: Scalar = 1.0e-12;

/// Numerical rank of `m`, via singular values.
#[must_use]
pub fn rank(m: &Matrix) -> usize {
    if m.is_empty() {
        return 0;
    }
    let svd = m.clone().svd(false, false);
    let sigma_max = svd.singular_values.amax();
    let tol = sigma_max * m.nrows().max(m.ncols()) as Scalar * RANK_EPSILON;
    svd.rank(tol)
}

/// Returns true when the square matrix `m` is not of full rank.
///
/// # Panics
/// If `m` is not square; singularity has no meaning otherwise.
#[must_use]
pub fn is_singular(m: &Matrix) -> bool {
    assert!(m.is_square(), "singularity test requires a square matrix");
    rank(m) != m.nrows()
}

/// Returns true when `m` admits a symmetric (LDLᵀ-family) factorization:
/// every eigenvalue is real, and they are either all non-negative or all
/// non-positive.
#[must_use]
pub fn can_ldlt_decompose(m: &Matrix) -> bool {
    if !m.is_square() {
        return false;
    }
    if m.is_empty() {
        return true;
    }
    let eigenvalues = m.complex_eigenvalues();
    let scale = eigenvalues
        .iter()
        .map(|z: &CScalar| z.norm())
        .fold(0.0, Scalar::max);
    let tol = scale * EIGEN_TOLERANCE;

    let all_real = eigenvalues.iter().all(|z| z.im.abs() <= tol);
    let non_negative = eigenvalues.iter().all(|z| z.re >= -tol);
    let non_positive = eigenvalues.iter().all(|z| z.re <= tol);
    all_real && (non_negative || non_positive)
}

/// Per-row mask: `true` where every entry of the row is exactly zero.
#[must_use]
pub fn zero_rows(m: &Matrix) -> Vec<bool> {
    m.row_iter().map(|row| row.iter().all(|&v| v == 0.0)).collect()
}
