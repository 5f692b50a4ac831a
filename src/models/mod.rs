//! Robot kinematic models
//!
//! The motion-model contract used by the prediction step, and a few reference
//! kinematic laws implementing it.

mod motion;

pub use motion::*;
