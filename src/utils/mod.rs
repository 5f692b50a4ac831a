//! Numerical utilities
//!
//! Covariance hygiene checks and finite-difference Jacobians.

mod covariance;
mod jacobian;

pub use covariance::*;
pub use jacobian::*;
