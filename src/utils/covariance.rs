//! Covariance matrix hygiene

use nalgebra::{DMatrix, RealField, SymmetricEigen};

/// Checks that `m` is square and symmetric to an absolute tolerance.
pub fn is_symmetric<T: RealField + Copy>(m: &DMatrix<T>, tolerance: T) -> bool {
    if !m.is_square() {
        return false;
    }
    let n = m.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            if (m[(i, j)] - m[(j, i)]).abs() > tolerance {
                return false;
            }
        }
    }
    true
}

/// Replaces a square matrix by its symmetric part `(M + Mᵗ) / 2`.
pub fn symmetrize<T: RealField + Copy>(m: &mut DMatrix<T>) {
    let half: T = nalgebra::convert(0.5);
    let n = m.nrows().min(m.ncols());
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = (m[(i, j)] + m[(j, i)]) * half;
            m[(i, j)] = avg;
            m[(j, i)] = avg;
        }
    }
}

/// Smallest eigenvalue of a symmetric matrix, `None` for an empty or non-square matrix.
///
/// A covariance is positive semi-definite iff this is `>= 0`.
pub fn min_eigenvalue<T: RealField + Copy>(m: &DMatrix<T>) -> Option<T> {
    if m.nrows() == 0 || !m.is_square() {
        return None;
    }
    let eigen = SymmetricEigen::new(m.clone());
    Some(eigen.eigenvalues.min())
}
