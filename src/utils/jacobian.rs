//! Finite-difference Jacobians
//!
//! Used to validate the analytic Jacobians of motion models.

use nalgebra::{DMatrix, DVector, RealField};

/// Central-difference Jacobian of `f` at `x` with step `eps`.
///
/// Column `j` is `(f(x + eps·e_j) - f(x - eps·e_j)) / (2·eps)`.
pub fn numerical_jacobian<T, F>(f: F, x: &DVector<T>, eps: T) -> DMatrix<T>
where
    T: RealField + Copy,
    F: Fn(&DVector<T>) -> DVector<T>,
{
    let two_eps = eps + eps;
    let f0 = f(x);
    let mut jac = DMatrix::zeros(f0.len(), x.len());

    for j in 0..x.len() {
        let mut plus = x.clone();
        let mut minus = x.clone();
        plus[j] += eps;
        minus[j] -= eps;
        let column = (f(&plus) - f(&minus)) / two_eps;
        jac.set_column(j, &column);
    }
    jac
}
