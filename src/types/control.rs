//! Gaussian control inputs
//!
//! A [`Control`] is a Gaussian with a time interval. It represents a
//! discrete-time control vector:
//! - the mean is the deterministic part of the control,
//! - the covariance encodes the random perturbation.
//!
//! Controls may also be specified in continuous time (rates and noise
//! intensities) and converted with the `discretize_*` methods:
//! - deterministic rates integrate linearly with time: `x = x_ct * dt`
//! - white Gaussian noise has a standard deviation growing with `sqrt(dt)`,
//!   so its variance integrates linearly with time: `P = P_ct * dt`

use nalgebra::{DMatrix, DVector, RealField};

use super::gaussian::Gaussian;
use crate::{ensure_size, Result, SlamError};

/// Discrete-time Gaussian control with optional continuous-time shadow values.
#[derive(Debug, Clone, PartialEq)]
pub struct Control<T: RealField> {
    gaussian: Gaussian<T>,
    /// Time interval this control spans
    pub dt: T,
    x_ct: Option<DVector<T>>,
    p_ct: Option<DMatrix<T>>,
}

impl<T: RealField + Copy> Control<T> {
    /// Creates a zero control of dimension `size` with `dt = 1`.
    pub fn new(size: usize) -> Self {
        Self::from_gaussian(Gaussian::new(size))
    }

    /// Wraps a Gaussian as a control with `dt = 1`.
    pub fn from_gaussian(gaussian: Gaussian<T>) -> Self {
        Self {
            gaussian,
            dt: T::one(),
            x_ct: None,
            p_ct: None,
        }
    }

    /// Wraps a Gaussian as a control spanning `dt`.
    pub fn with_dt(gaussian: Gaussian<T>, dt: T) -> Result<Self> {
        check_dt(dt)?;
        let mut control = Self::from_gaussian(gaussian);
        control.dt = dt;
        Ok(control)
    }

    /// Control dimension.
    #[inline]
    pub fn size(&self) -> usize {
        self.gaussian.size()
    }

    #[inline]
    pub fn mean(&self) -> &DVector<T> {
        self.gaussian.mean()
    }

    #[inline]
    pub fn covariance(&self) -> &DMatrix<T> {
        self.gaussian.covariance()
    }

    #[inline]
    pub fn gaussian(&self) -> &Gaussian<T> {
        &self.gaussian
    }

    /// Sets the discrete control mean.
    pub fn set_mean(&mut self, mean: DVector<T>) -> Result<()> {
        self.gaussian.set_mean(mean)
    }

    /// Sets the discrete perturbation covariance.
    pub fn set_covariance(&mut self, covariance: DMatrix<T>) -> Result<()> {
        self.gaussian.set_covariance(covariance)
    }

    /// Whether a continuous-time mean has been stored.
    #[inline]
    pub fn is_continuous_mean_set(&self) -> bool {
        self.x_ct.is_some()
    }

    /// Whether a continuous-time covariance has been stored.
    #[inline]
    pub fn is_continuous_covariance_set(&self) -> bool {
        self.p_ct.is_some()
    }

    /// Stores a continuous-time covariance (noise intensity) matrix.
    pub fn set_continuous_covariance(&mut self, p_ct: DMatrix<T>) -> Result<()> {
        ensure_size("continuous covariance rows", self.size(), p_ct.nrows())?;
        ensure_size("continuous covariance columns", self.size(), p_ct.ncols())?;
        self.p_ct = Some(p_ct);
        Ok(())
    }

    /// Stores a continuous-time mean (rate) vector.
    pub fn set_continuous_mean(&mut self, x_ct: DVector<T>) -> Result<()> {
        ensure_size("continuous mean", self.size(), x_ct.len())?;
        self.x_ct = Some(x_ct);
        Ok(())
    }

    /// Discrete perturbation from the stored continuous covariance: `P = P_ct * dt`.
    ///
    /// `self.dt` is left untouched.
    pub fn discretize_covariance(&mut self, dt: T) -> Result<()> {
        check_dt(dt)?;
        let p_ct = self
            .p_ct
            .as_ref()
            .ok_or(SlamError::UninitializedContinuousState {
                context: "covariance",
            })?;
        let p = p_ct * dt;
        self.gaussian.set_covariance(p)
    }

    /// Stores `p_ct` then discretizes it over `dt`.
    pub fn discretize_covariance_from(&mut self, p_ct: DMatrix<T>, dt: T) -> Result<()> {
        check_dt(dt)?;
        self.set_continuous_covariance(p_ct)?;
        self.discretize_covariance(dt)
    }

    /// Discrete control and perturbation from the stored continuous values:
    /// `x = x_ct * dt`, `P = P_ct * dt`, and `self.dt = dt`.
    pub fn discretize_all(&mut self, dt: T) -> Result<()> {
        check_dt(dt)?;
        let x_ct = self
            .x_ct
            .as_ref()
            .ok_or(SlamError::UninitializedContinuousState { context: "mean" })?;
        let p_ct = self
            .p_ct
            .as_ref()
            .ok_or(SlamError::UninitializedContinuousState {
                context: "covariance",
            })?;

        let x = x_ct * dt;
        let p = p_ct * dt;
        self.gaussian.set_mean(x)?;
        self.gaussian.set_covariance(p)?;
        self.dt = dt;
        Ok(())
    }

    /// Copies a continuous-time Gaussian (rates and noise intensities) into the
    /// continuous shadows, then discretizes everything over `dt`.
    pub fn discretize_all_from(&mut self, continuous: &Gaussian<T>, dt: T) -> Result<()> {
        ensure_size("continuous gaussian", self.size(), continuous.size())?;
        check_dt(dt)?;
        self.set_continuous_covariance(continuous.covariance().clone())?;
        self.set_continuous_mean(continuous.mean().clone())?;
        self.discretize_all(dt)
    }
}

/// Fails with `InvalidTimeStep` unless `dt` is finite and non-negative.
pub(crate) fn check_dt<T: RealField + Copy>(dt: T) -> Result<()> {
    if dt.is_finite() && dt >= T::zero() {
        Ok(())
    } else {
        Err(SlamError::InvalidTimeStep)
    }
}

// ============================================================================
// Tests
// ============================================================================
