//! Gaussian distributions over dynamically sized vectors
//!
//! A [`Gaussian`] is a mean vector plus a symmetric covariance matrix of the same
//! dimension. Map-resident Gaussians are not stored here: the map hands out
//! copies of its blocks through this type and accepts them back.

use nalgebra::{DMatrix, DVector, RealField};

use crate::{ensure_size, Result};

// ============================================================================
// Gaussian
// ============================================================================

/// A multivariate Gaussian `N(mean, covariance)`.
///
/// # Invariants
///
/// - `mean.len() == covariance.nrows() == covariance.ncols()`
/// - `covariance` is symmetric positive semi-definite (not enforced on every
///   write; see [`Gaussian::is_symmetric`] and [`crate::utils::min_eigenvalue`])
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian<T: RealField> {
    mean: DVector<T>,
    covariance: DMatrix<T>,
}

impl<T: RealField + Copy> Gaussian<T> {
    /// Creates a zero-mean, zero-covariance Gaussian of dimension `size`.
    pub fn new(size: usize) -> Self {
        Self {
            mean: DVector::zeros(size),
            covariance: DMatrix::zeros(size, size),
        }
    }

    /// Creates a Gaussian from a mean and a covariance.
    ///
    /// Fails with `SizeMismatch` if the covariance is not square of the mean's size.
    pub fn from_parts(mean: DVector<T>, covariance: DMatrix<T>) -> Result<Self> {
        ensure_size("covariance rows", mean.len(), covariance.nrows())?;
        ensure_size("covariance columns", mean.len(), covariance.ncols())?;
        Ok(Self { mean, covariance })
    }

    /// Creates a Gaussian with a diagonal covariance.
    pub fn with_diagonal(mean: DVector<T>, variances: &DVector<T>) -> Result<Self> {
        ensure_size("variances", mean.len(), variances.len())?;
        Ok(Self {
            covariance: DMatrix::from_diagonal(variances),
            mean,
        })
    }

    /// Dimension of the distribution.
    #[inline]
    pub fn size(&self) -> usize {
        self.mean.len()
    }

    #[inline]
    pub fn mean(&self) -> &DVector<T> {
        &self.mean
    }

    #[inline]
    pub fn covariance(&self) -> &DMatrix<T> {
        &self.covariance
    }

    /// Replaces the mean, keeping the covariance.
    pub fn set_mean(&mut self, mean: DVector<T>) -> Result<()> {
        ensure_size("mean", self.size(), mean.len())?;
        self.mean = mean;
        Ok(())
    }

    /// Replaces the covariance, keeping the mean.
    pub fn set_covariance(&mut self, covariance: DMatrix<T>) -> Result<()> {
        ensure_size("covariance rows", self.size(), covariance.nrows())?;
        ensure_size("covariance columns", self.size(), covariance.ncols())?;
        self.covariance = covariance;
        Ok(())
    }

    /// Consumes self and returns `(mean, covariance)`.
    #[inline]
    pub fn into_parts(self) -> (DVector<T>, DMatrix<T>) {
        (self.mean, self.covariance)
    }

    /// Returns the trace of the covariance matrix (sum of variances).
    #[inline]
    pub fn uncertainty(&self) -> T {
        self.covariance.trace()
    }

    /// Checks covariance symmetry to an absolute tolerance.
    pub fn is_symmetric(&self, tolerance: T) -> bool {
        crate::utils::is_symmetric(&self.covariance, tolerance)
    }
}

// ============================================================================
// Tests
// ============================================================================
