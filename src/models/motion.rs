//! Motion models for robot dynamics
//!
//! Describes how a robot state evolves under a control input:
//! x_{k+1} = f(x_k, u_k, dt)
//!
//! The EKF needs both Jacobians of `f`:
//! - `F = ∂f/∂x` propagates the existing uncertainty,
//! - `G = ∂f/∂u` maps the control perturbation into state space (`Q = G·U·Gᵗ`).

use alloc::boxed::Box;
use alloc::string::String;

use nalgebra::{DMatrix, DVector, RealField};
use num_traits::Float;

use crate::{ensure_size, Result, SlamError};

/// Output of one motion-model evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionPrediction<T: RealField> {
    /// Predicted state `f(x, u, dt)`
    pub state: DVector<T>,
    /// Jacobian of the new state w.r.t. the old state (n×n)
    pub jacobian_state: DMatrix<T>,
    /// Jacobian of the new state w.r.t. the control (n×m)
    pub jacobian_control: DMatrix<T>,
}

/// Trait for robot kinematic (motion) models.
///
/// Implementations must be pure: they receive copies of the current pose and
/// control, and must return Jacobians sized exactly n×n and n×m.
pub trait MotionModel<T: RealField> {
    /// Dimension n of the robot state.
    fn state_size(&self) -> usize;

    /// Dimension m of the control vector.
    fn control_size(&self) -> usize;

    /// Predicts the state one step of length `dt` ahead and linearizes there.
    ///
    /// Returns `MotionModelFailure` if no prediction exists for these inputs.
    fn predict(&self, state: &DVector<T>, control: &DVector<T>, dt: T) -> Result<MotionPrediction<T>>;
}

impl<T: RealField, M: MotionModel<T> + ?Sized> MotionModel<T> for Box<M> {
    fn state_size(&self) -> usize {
        (**self).state_size()
    }

    fn control_size(&self) -> usize {
        (**self).control_size()
    }

    fn predict(&self, state: &DVector<T>, control: &DVector<T>, dt: T) -> Result<MotionPrediction<T>> {
        (**self).predict(state, control, dt)
    }
}

fn check_inputs<T: RealField + Float + Copy>(
    state: &DVector<T>,
    state_size: usize,
    control: &DVector<T>,
    control_size: usize,
    dt: T,
) -> Result<()> {
    ensure_size("model state", state_size, state.len())?;
    ensure_size("model control", control_size, control.len())?;
    let finite = state.iter().chain(control.iter()).all(|v| Float::is_finite(*v));
    if finite && Float::is_finite(dt) {
        Ok(())
    } else {
        Err(SlamError::MotionModelFailure {
            reason: String::from("non-finite state, control or time step"),
        })
    }
}

/// Wraps an angle to (-π, π].
#[inline]
pub fn normalize_angle<T: RealField + Float + Copy>(angle: T) -> T {
    Float::atan2(Float::sin(angle), Float::cos(angle))
}

// ============================================================================
// Common Motion Models
// ============================================================================

/// Holonomic constant-increment model of any dimension.
///
/// - x' = x + u·dt
/// - F = I, G = dt·I
#[derive(Debug, Clone)]
pub struct ConstantIncrement {
    size: usize,
}

impl ConstantIncrement {
    /// Creates the model for an `size`-dimensional state driven by a rate of the same size.
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl<T: RealField + Float + Copy> MotionModel<T> for ConstantIncrement {
    fn state_size(&self) -> usize {
        self.size
    }

    fn control_size(&self) -> usize {
        self.size
    }

    fn predict(&self, state: &DVector<T>, control: &DVector<T>, dt: T) -> Result<MotionPrediction<T>> {
        check_inputs(state, self.size, control, self.size, dt)?;
        Ok(MotionPrediction {
            state: state + control * dt,
            jacobian_state: DMatrix::identity(self.size, self.size),
            jacobian_control: DMatrix::identity(self.size, self.size) * dt,
        })
    }
}

/// Planar odometry model.
///
/// State: [x, y, θ]. Control: body-frame increment [dx, dy, dθ] already
/// integrated over the step, so `dt` is not used.
///
/// - x' = x + dx·cos θ - dy·sin θ
/// - y' = y + dx·sin θ + dy·cos θ
/// - θ' = θ + dθ (wrapped to (-π, π])
#[derive(Debug, Clone, Default)]
pub struct Odometry2D;

impl Odometry2D {
    pub const STATE_SIZE: usize = 3;
    pub const CONTROL_SIZE: usize = 3;

    pub fn new() -> Self {
        Self
    }
}

impl<T: RealField + Float + Copy> MotionModel<T> for Odometry2D {
    fn state_size(&self) -> usize {
        Self::STATE_SIZE
    }

    fn control_size(&self) -> usize {
        Self::CONTROL_SIZE
    }

    fn predict(&self, state: &DVector<T>, control: &DVector<T>, dt: T) -> Result<MotionPrediction<T>> {
        check_inputs(state, Self::STATE_SIZE, control, Self::CONTROL_SIZE, dt)?;
        let (x, y, theta) = (state[0], state[1], state[2]);
        let (dx, dy, dtheta) = (control[0], control[1], control[2]);

        let s = Float::sin(theta);
        let c = Float::cos(theta);
        let one = T::one();
        let zero = T::zero();

        let xnew = DVector::from_vec(alloc::vec![
            x + dx * c - dy * s,
            y + dx * s + dy * c,
            normalize_angle(theta + dtheta),
        ]);

        let jacobian_state = DMatrix::from_row_slice(3, 3, &[
            one, zero, -dx * s - dy * c,
            zero, one, dx * c - dy * s,
            zero, zero, one,
        ]);

        let jacobian_control = DMatrix::from_row_slice(3, 3, &[
            c, -s, zero,
            s, c, zero,
            zero, zero, one,
        ]);

        Ok(MotionPrediction {
            state: xnew,
            jacobian_state,
            jacobian_control,
        })
    }
}

/// Differential-drive (unicycle) velocity model.
///
/// State: [x, y, θ]. Control: [v, ω] (linear and angular velocity).
///
/// With the turn angle φ = ωΔt the robot follows an arc of radius v/ω:
/// - x' = x + vΔt·[sin(θ + φ) - sin θ]/φ
/// - y' = y + vΔt·[cos θ - cos(θ + φ)]/φ
/// - θ' = θ + φ
///
/// Written this way the straight line is the φ → 0 limit. Below
/// `min_turn_angle` the φ-dependent factors and their derivatives come from
/// their Taylor series, so the Jacobians stay accurate for tiny turn rates.
#[derive(Debug, Clone)]
pub struct Unicycle2D<T> {
    /// Turn angles |ωΔt| below this use the series expansion
    pub min_turn_angle: T,
}

impl<T: RealField + Float + Copy> Unicycle2D<T> {
    pub const STATE_SIZE: usize = 3;
    pub const CONTROL_SIZE: usize = 2;

    pub fn new() -> Self {
        Self {
            min_turn_angle: nalgebra::convert(1e-3),
        }
    }

    /// Returns `(sin φ/φ, (cos φ - 1)/φ)` and their derivatives w.r.t. φ.
    fn arc_factors(&self, phi: T) -> (T, T, T, T) {
        let one = T::one();
        if Float::abs(phi) < self.min_turn_angle {
            let k = |v: f64| -> T { nalgebra::convert(v) };
            let phi2 = phi * phi;
            let phi4 = phi2 * phi2;
            let sinc = one - phi2 / k(6.0) + phi4 / k(120.0);
            let cosc = -phi / k(2.0) + phi * phi2 / k(24.0);
            let d_sinc = -phi / k(3.0) + phi * phi2 / k(30.0);
            let d_cosc = -k(0.5) + phi2 / k(8.0) - phi4 / k(144.0);
            (sinc, cosc, d_sinc, d_cosc)
        } else {
            let sp = Float::sin(phi);
            let cp = Float::cos(phi);
            let phi2 = phi * phi;
            (
                sp / phi,
                (cp - one) / phi,
                (phi * cp - sp) / phi2,
                (one - cp - phi * sp) / phi2,
            )
        }
    }
}

impl<T: RealField + Float + Copy> Default for Unicycle2D<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RealField + Float + Copy> MotionModel<T> for Unicycle2D<T> {
    fn state_size(&self) -> usize {
        Self::STATE_SIZE
    }

    fn control_size(&self) -> usize {
        Self::CONTROL_SIZE
    }

    fn predict(&self, state: &DVector<T>, control: &DVector<T>, dt: T) -> Result<MotionPrediction<T>> {
        check_inputs(state, Self::STATE_SIZE, control, Self::CONTROL_SIZE, dt)?;
        let (x, y, theta) = (state[0], state[1], state[2]);
        let (v, omega) = (control[0], control[1]);

        let one = T::one();
        let zero = T::zero();
        let s = Float::sin(theta);
        let c = Float::cos(theta);
        let phi = omega * dt;
        let dist = v * dt;
        let (sinc, cosc, d_sinc, d_cosc) = self.arc_factors(phi);

        // Displacement per unit distance, its θ-derivative and its φ-derivative
        let ax = c * sinc + s * cosc;
        let ay = s * sinc - c * cosc;
        let ax_theta = -s * sinc + c * cosc;
        let ay_theta = c * sinc + s * cosc;
        let ax_phi = c * d_sinc + s * d_cosc;
        let ay_phi = s * d_sinc - c * d_cosc;

        let xnew = DVector::from_vec(alloc::vec![
            x + dist * ax,
            y + dist * ay,
            normalize_angle(theta + phi),
        ]);

        let jacobian_state = DMatrix::from_row_slice(3, 3, &[
            one, zero, dist * ax_theta,
            zero, one, dist * ay_theta,
            zero, zero, one,
        ]);

        let jacobian_control = DMatrix::from_row_slice(3, 2, &[
            dt * ax, dist * dt * ax_phi,
            dt * ay, dist * dt * ay_phi,
            zero, dt,
        ]);

        Ok(MotionPrediction {
            state: xnew,
            jacobian_state,
            jacobian_control,
        })
    }
}

/// Constant-velocity model in 2D driven by acceleration impulses.
///
/// State: [x, y, vx, vy]. Control: [ax, ay] held constant over the step.
///
/// - p' = p + v·dt + a·dt²/2
/// - v' = v + a·dt
#[derive(Debug, Clone, Default)]
pub struct ConstantVelocity2D;

impl ConstantVelocity2D {
    pub const STATE_SIZE: usize = 4;
    pub const CONTROL_SIZE: usize = 2;

    pub fn new() -> Self {
        Self
    }
}

impl<T: RealField + Float + Copy> MotionModel<T> for ConstantVelocity2D {
    fn state_size(&self) -> usize {
        Self::STATE_SIZE
    }

    fn control_size(&self) -> usize {
        Self::CONTROL_SIZE
    }

    fn predict(&self, state: &DVector<T>, control: &DVector<T>, dt: T) -> Result<MotionPrediction<T>> {
        check_inputs(state, Self::STATE_SIZE, control, Self::CONTROL_SIZE, dt)?;
        let one = T::one();
        let zero = T::zero();
        let half: T = nalgebra::convert(0.5);
        let dt2_half = dt * dt * half;

        let jacobian_state = DMatrix::from_row_slice(4, 4, &[
            one, zero, dt, zero,
            zero, one, zero, dt,
            zero, zero, one, zero,
            zero, zero, zero, one,
        ]);
        let jacobian_control = DMatrix::from_row_slice(4, 2, &[
            dt2_half, zero,
            zero, dt2_half,
            dt, zero,
            zero, dt,
        ]);

        Ok(MotionPrediction {
            state: &jacobian_state * state + &jacobian_control * control,
            jacobian_state,
            jacobian_control,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
