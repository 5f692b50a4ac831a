//! Robots: the motion-update side of EKF-SLAM
//!
//! A [`Robot`] owns its kinematic model, its current [`Control`], the Jacobians
//! of the last motion step and the process noise `Q`. Its pose is not stored
//! here: it is a block of the shared [`SlamMap`] state, addressed by an
//! [`ObjectId`].
//!
//! # Prediction
//!
//! [`Robot::predict`] performs the EKF time update on the shared map:
//! 1. `(x', F, G) = f(x, u, dt)` from the motion model
//! 2. `Q = G·U·Gᵗ` (skipped with constant perturbation)
//! 3. `x ← x'`
//! 4. `P_rr ← F·P_rr·Fᵗ + Q`, and `P_ro ← F·P_ro` for every other map object
//!
//! # Example
//!
//! ```
//! use rtslam::prelude::*;
//! use nalgebra::{DMatrix, DVector};
//!
//! let mut map = SlamMap::<f64>::new();
//! let start = Gaussian::from_parts(DVector::zeros(3), DMatrix::identity(3, 3) * 0.01).unwrap();
//! let mut robot = Robot::new(&mut map, Unicycle2D::new(), start).unwrap();
//! robot.link_to_map(&mut map).unwrap();
//!
//! let mut control = Control::new(2);
//! control.set_continuous_mean(DVector::from_vec(vec![1.0, 0.0])).unwrap();
//! control.set_continuous_covariance(DMatrix::identity(2, 2) * 0.01).unwrap();
//! control.discretize_covariance(0.1).unwrap();
//! control.set_mean(DVector::from_vec(vec![1.0, 0.0])).unwrap();
//! control.dt = 0.1;
//!
//! robot.predict_with(&mut map, control).unwrap();
//! assert!((robot.pose(&map).unwrap().mean()[0] - 0.1).abs() < 1e-12);
//! ```

mod summary;

pub use summary::*;

use alloc::boxed::Box;
use alloc::vec::Vec;
use ::core::fmt;

use log::{debug, trace, warn};
use nalgebra::{DMatrix, DVector, RealField};

use crate::map::{ObjectKind, SlamMap};
use crate::models::{MotionModel, MotionPrediction};
use crate::sensors::Sensor;
use crate::types::control::{check_dt, Control};
use crate::types::gaussian::Gaussian;
use crate::types::handles::{MapId, ObjectId};
use crate::utils::symmetrize;
use crate::{ensure_size, Result, SlamError};

// ============================================================================
// Configuration
// ============================================================================

/// Behaviour switches for a robot's prediction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotConfig {
    /// `Q` is fixed at setup time and never recomputed by `predict`.
    ///
    /// Enter it with [`Robot::set_constant_perturbation`] or compute it once with
    /// [`Robot::setup_constant_perturbation`] before the first prediction.
    pub constant_perturbation: bool,
    /// Re-symmetrize the robot covariance block after each prediction.
    pub enforce_symmetry: bool,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            constant_perturbation: false,
            enforce_symmetry: true,
        }
    }
}

impl RobotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constant_perturbation(mut self, constant: bool) -> Self {
        self.constant_perturbation = constant;
        self
    }

    pub fn with_enforce_symmetry(mut self, enforce: bool) -> Self {
        self.enforce_symmetry = enforce;
        self
    }
}

// ============================================================================
// Robot
// ============================================================================

/// A robot moving through a shared SLAM map.
///
/// # Type Parameters
///
/// - `T`: Scalar type
/// - `M`: Kinematic model (must implement [`MotionModel`])
pub struct Robot<T: RealField, M> {
    id: ObjectId,
    map: MapId,
    linked_to_map: bool,
    model: M,
    control: Control<T>,
    /// ∂x'/∂x of the last step (n×n)
    xnew_x: DMatrix<T>,
    /// ∂x'/∂u of the last step (n×m)
    xnew_control: DMatrix<T>,
    /// Process noise in state space (n×n)
    q: DMatrix<T>,
    constant_perturbation: bool,
    enforce_symmetry: bool,
    sensors: Vec<Box<dyn Sensor<T>>>,
}

impl<T, M> Robot<T, M>
where
    T: RealField + Copy,
    M: MotionModel<T>,
{
    /// Allocates the robot pose in `map` and builds a robot with default configuration.
    ///
    /// Fails with `SizeMismatch` if `initial_pose` is not of the model's state size.
    pub fn new(map: &mut SlamMap<T>, model: M, initial_pose: Gaussian<T>) -> Result<Self> {
        Self::with_config(map, model, initial_pose, RobotConfig::default())
    }

    /// Allocates the robot pose in `map` and builds a robot with `config`.
    pub fn with_config(
        map: &mut SlamMap<T>,
        model: M,
        initial_pose: Gaussian<T>,
        config: RobotConfig,
    ) -> Result<Self> {
        let n = model.state_size();
        let m = model.control_size();
        ensure_size("robot pose", n, initial_pose.size())?;

        let id = map.allocate(ObjectKind::Robot, &initial_pose)?;
        debug!("robot {}: created with {} states and {} controls", id, n, m);

        Ok(Self {
            id,
            map: map.id(),
            linked_to_map: false,
            model,
            control: Control::new(m),
            xnew_x: DMatrix::zeros(n, n),
            xnew_control: DMatrix::zeros(n, m),
            q: DMatrix::zeros(n, n),
            constant_perturbation: config.constant_perturbation,
            enforce_symmetry: config.enforce_symmetry,
            sensors: Vec::new(),
        })
    }

    /// Handle of the robot pose block in its map.
    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[inline]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Robot state dimension n.
    #[inline]
    pub fn state_size(&self) -> usize {
        self.model.state_size()
    }

    /// Control dimension m.
    #[inline]
    pub fn control_size(&self) -> usize {
        self.model.control_size()
    }

    #[inline]
    pub fn control(&self) -> &Control<T> {
        &self.control
    }

    /// Mutable access to the current control. Its size is fixed at construction.
    #[inline]
    pub fn control_mut(&mut self) -> &mut Control<T> {
        &mut self.control
    }

    /// Replaces the current control.
    pub fn set_control(&mut self, control: Control<T>) -> Result<()> {
        ensure_size("control", self.control_size(), control.size())?;
        self.control = control;
        Ok(())
    }

    /// Jacobian of the new pose w.r.t. the old pose, from the last step.
    #[inline]
    pub fn jacobian_state(&self) -> &DMatrix<T> {
        &self.xnew_x
    }

    /// Jacobian of the new pose w.r.t. the control, from the last step.
    #[inline]
    pub fn jacobian_control(&self) -> &DMatrix<T> {
        &self.xnew_control
    }

    /// Process noise `Q` in state space.
    #[inline]
    pub fn perturbation(&self) -> &DMatrix<T> {
        &self.q
    }

    #[inline]
    pub fn is_constant_perturbation(&self) -> bool {
        self.constant_perturbation
    }

    #[inline]
    pub fn is_linked_to_map(&self) -> bool {
        self.linked_to_map
    }

    /// Names of the linked sensors, in link order.
    pub fn sensor_names(&self) -> impl Iterator<Item = &str> {
        self.sensors.iter().map(|s| s.name())
    }

    #[inline]
    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Copy of the robot pose from `map`.
    pub fn pose(&self, map: &SlamMap<T>) -> Result<Gaussian<T>> {
        self.check_map(map)?;
        map.gaussian(self.id)
    }

    /// Registers this robot in the map's robot roster.
    ///
    /// Fails with `ForeignMap` if the robot was allocated in another map.
    pub fn link_to_map(&mut self, map: &mut SlamMap<T>) -> Result<()> {
        self.check_map(map)?;
        map.register_robot(self.id)?;
        self.linked_to_map = true;
        debug!("robot {}: linked to map", self.id);
        Ok(())
    }

    /// Mounts `sensor` on this robot. Sensors are explored in link order.
    pub fn link_to_sensor<S: Sensor<T> + 'static>(&mut self, mut sensor: S) {
        sensor.link_to_robot(self.id);
        debug!("robot {}: linked sensor '{}'", self.id, sensor.name());
        self.sensors.push(Box::new(sensor));
    }

    /// Recomputes the process noise `Q = G·U·Gᵗ` from the last control Jacobian
    /// and the current control covariance.
    pub fn compute_state_perturbation(&mut self) {
        let mut q = &self.xnew_control * self.control.covariance() * self.xnew_control.transpose();
        symmetrize(&mut q);
        self.q = q;
    }

    /// Fixes `Q` to a user-supplied matrix and enables constant perturbation.
    pub fn set_constant_perturbation(&mut self, q: DMatrix<T>) -> Result<()> {
        let n = self.state_size();
        ensure_size("perturbation rows", n, q.nrows())?;
        ensure_size("perturbation columns", n, q.ncols())?;
        self.q = q;
        self.constant_perturbation = true;
        Ok(())
    }

    /// Linearizes the model at the current pose and control, computes `Q` once
    /// and enables constant perturbation. The map is not modified.
    pub fn setup_constant_perturbation(&mut self, map: &SlamMap<T>) -> Result<()> {
        let pose = self.pose(map)?;
        let prediction = self.evaluate(pose.mean())?;
        self.xnew_x = prediction.jacobian_state;
        self.xnew_control = prediction.jacobian_control;
        self.compute_state_perturbation();
        self.constant_perturbation = true;
        debug!("robot {}: constant perturbation fixed", self.id);
        Ok(())
    }

    /// Moves one step ahead with the current control, updating the robot block
    /// and its cross-covariances with every other map object.
    ///
    /// On error the map is left unchanged.
    pub fn predict(&mut self, map: &mut SlamMap<T>) -> Result<()> {
        self.step(map).map_err(|e| self.rejected(e))
    }

    /// Sets the control, then moves one step ahead.
    pub fn predict_with(&mut self, map: &mut SlamMap<T>, control: Control<T>) -> Result<()> {
        self.set_control(control).map_err(|e| self.rejected(e))?;
        self.predict(map)
    }

    /// Sets the control mean to `u` (covariance and `dt` kept), then moves one step ahead.
    ///
    /// Fails with `SizeMismatch` before touching anything if `u` is not of control size.
    pub fn predict_with_input(&mut self, map: &mut SlamMap<T>, u: &DVector<T>) -> Result<()> {
        ensure_size("control input", self.control_size(), u.len()).map_err(|e| self.rejected(e))?;
        self.control.set_mean(u.clone())?;
        self.predict(map)
    }

    /// Runs every linked sensor's processing hook once, in link order.
    ///
    /// Stops at and returns the first sensor error.
    pub fn explore_sensors(&mut self, map: &mut SlamMap<T>) -> Result<()> {
        self.check_map(map)?;
        let id = self.id;
        for sensor in self.sensors.iter_mut() {
            trace!("robot {}: exploring sensor '{}'", id, sensor.name());
            sensor.process(id, map)?;
        }
        Ok(())
    }

    /// Snapshot of pose, control and perturbation for display.
    pub fn summary(&self, map: &SlamMap<T>) -> Result<RobotSummary<T>> {
        Ok(RobotSummary::new(
            self.id,
            self.pose(map)?,
            self.control.clone(),
            self.q.diagonal(),
            self.sensor_names().map(alloc::string::String::from).collect(),
        ))
    }

    fn check_map(&self, map: &SlamMap<T>) -> Result<()> {
        if map.id() == self.map {
            Ok(())
        } else {
            Err(SlamError::ForeignMap)
        }
    }

    fn step(&mut self, map: &mut SlamMap<T>) -> Result<()> {
        self.check_map(map)?;
        let pose = map.gaussian(self.id)?;
        ensure_size("robot pose", self.state_size(), pose.size())?;
        let prediction = self.evaluate(pose.mean())?;

        self.xnew_x = prediction.jacobian_state;
        self.xnew_control = prediction.jacobian_control;
        if !self.constant_perturbation {
            self.compute_state_perturbation();
        }

        map.predict_block(
            self.id,
            &prediction.state,
            &self.xnew_x,
            &self.q,
            self.enforce_symmetry,
        )?;

        debug!("robot {}: predicted over dt = {}", self.id, self.control.dt);
        trace!("robot {}: x = {} Q = {}", self.id, prediction.state, self.q);
        Ok(())
    }

    fn rejected(&self, e: SlamError) -> SlamError {
        warn!("robot {}: prediction rejected: {}", self.id, e);
        e
    }

    /// Evaluates the motion model at `x` and the current control, and checks
    /// the result shapes.
    fn evaluate(&self, x: &DVector<T>) -> Result<MotionPrediction<T>> {
        let n = self.state_size();
        let m = self.control_size();
        ensure_size("control", m, self.control.size())?;
        check_dt(self.control.dt)?;

        let prediction = self.model.predict(x, self.control.mean(), self.control.dt)?;
        ensure_size("predicted state", n, prediction.state.len())?;
        ensure_size("state jacobian rows", n, prediction.jacobian_state.nrows())?;
        ensure_size("state jacobian columns", n, prediction.jacobian_state.ncols())?;
        ensure_size("control jacobian rows", n, prediction.jacobian_control.nrows())?;
        ensure_size("control jacobian columns", m, prediction.jacobian_control.ncols())?;
        Ok(prediction)
    }
}

impl<T: RealField, M: fmt::Debug> fmt::Debug for Robot<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Robot")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("control", &self.control)
            .field("constant_perturbation", &self.constant_perturbation)
            .field("sensors", &self.sensors.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
