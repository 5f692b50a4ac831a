//! RTSLAM: EKF-SLAM prediction core for Rust
//!
//! Propagates a robot pose estimate and its uncertainty forward in time under a
//! control input, and folds the resulting process noise into the covariance
//! matrix shared with every other object tracked in the map.
//!
//! # Features
//!
//! - **Shared State**: One arena-owned mean vector and covariance matrix per map;
//!   robots and landmarks hold stable handles into it
//! - **Pluggable Kinematics**: Motion laws are supplied through the [`models::MotionModel`] trait
//! - **Atomic Steps**: A rejected prediction never leaves the map partially updated
//! - **no_std Support**: Works in embedded environments with an allocator
//!
//! # Example
//!
//! ```
//! use rtslam::prelude::*;
//! use nalgebra::{DMatrix, DVector};
//!
//! let mut map = SlamMap::<f64>::new();
//! let pose = Gaussian::from_parts(DVector::from_vec(vec![0.0]), DMatrix::from_element(1, 1, 0.01)).unwrap();
//! let mut robot = Robot::new(&mut map, ConstantIncrement::new(1), pose).unwrap();
//! robot.link_to_map(&mut map).unwrap();
//!
//! robot.control_mut().set_covariance(DMatrix::from_element(1, 1, 0.02)).unwrap();
//! robot.predict_with_input(&mut map, &DVector::from_vec(vec![1.0])).unwrap();
//!
//! let pose = robot.pose(&map).unwrap();
//! assert!((pose.mean()[0] - 1.0).abs() < 1e-12);
//! assert!((pose.covariance()[(0, 0)] - 0.03).abs() < 1e-12);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "alloc"))]
compile_error!("rtslam stores map state in dynamic matrices and requires the `alloc` feature");

extern crate alloc;

use alloc::string::String;

pub mod types;
pub mod map;
pub mod models;
pub mod robot;
pub mod sensors;
pub mod utils;

pub mod prelude {
    pub use crate::types::gaussian::*;
    pub use crate::types::control::*;
    pub use crate::types::handles::*;
    pub use crate::map::*;
    pub use crate::models::*;
    pub use crate::robot::*;
    pub use crate::sensors::*;
    pub use crate::{Result, SlamError};
}

use types::handles::ObjectId;

/// Error types for the library
#[derive(Debug, Clone, PartialEq)]
pub enum SlamError {
    /// A vector or matrix dimension disagrees with the expected state, control or map size
    SizeMismatch {
        /// What was being sized (e.g. "control mean", "robot pose")
        context: &'static str,
        /// Expected dimension
        expected: usize,
        /// Received dimension
        actual: usize,
    },
    /// Continuous-time discretization requested before the continuous values were set
    UninitializedContinuousState {
        /// Which continuous value is missing
        context: &'static str,
    },
    /// The motion model could not produce a prediction for the given inputs
    MotionModelFailure {
        /// Model-supplied description
        reason: String,
    },
    /// The handle does not name a block of this map (stale or from another map)
    UnknownObject(ObjectId),
    /// A cross-covariance write named the same block twice
    SelfCrossCovariance(ObjectId),
    /// The robot was allocated in a different map than the one supplied
    ForeignMap,
    /// Time step is negative or not finite
    InvalidTimeStep,
    /// Numerical computation became unstable
    NumericalInstability {
        /// Which check failed
        context: &'static str,
    },
}

#[cfg(feature = "std")]
impl std::error::Error for SlamError {}

impl ::core::fmt::Display for SlamError {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        match self {
            SlamError::SizeMismatch {
                context,
                expected,
                actual,
            } => write!(
                f,
                "Size mismatch for {}: expected {}, got {}",
                context, expected, actual
            ),
            SlamError::UninitializedContinuousState { context } => {
                write!(f, "Continuous-time {} not yet initialized", context)
            }
            SlamError::MotionModelFailure { reason } => {
                write!(f, "Motion model failed: {}", reason)
            }
            SlamError::UnknownObject(id) => write!(f, "Unknown map object {}", id),
            SlamError::SelfCrossCovariance(id) => write!(
                f,
                "Cross-covariance of {} with itself; use set_gaussian for its own block",
                id
            ),
            SlamError::ForeignMap => write!(f, "Object belongs to a different map"),
            SlamError::InvalidTimeStep => write!(f, "Time step must be finite and non-negative"),
            SlamError::NumericalInstability { context } => {
                write!(f, "Numerical instability detected: {}", context)
            }
        }
    }
}

pub type Result<T> = ::core::result::Result<T, SlamError>;

/// Fails with [`SlamError::SizeMismatch`] unless `actual == expected`.
#[inline]
pub(crate) fn ensure_size(context: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SlamError::SizeMismatch {
            context,
            expected,
            actual,
        })
    }
}
