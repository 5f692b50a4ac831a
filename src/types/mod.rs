//! Core value types: Gaussians, controls and map handles

pub mod control;
pub mod gaussian;
pub mod handles;
