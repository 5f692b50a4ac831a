//! Common test helpers for prediction integration tests

#![allow(dead_code)]

use nalgebra::{DMatrix, DVector};
use rtslam::prelude::*;

/// Column vector from a slice.
pub fn vector(values: &[f64]) -> DVector<f64> {
    DVector::from_column_slice(values)
}

/// Gaussian with the given mean and isotropic variance.
pub fn isotropic(mean: &[f64], variance: f64) -> Gaussian<f64> {
    let n = mean.len();
    Gaussian::from_parts(vector(mean), DMatrix::identity(n, n) * variance).unwrap()
}

/// Map holding a 3-state robot with `model` and one 2D landmark, with a
/// non-zero robot/landmark cross-covariance.
pub fn robot_and_landmark<M: MotionModel<f64>>(
    model: M,
) -> (SlamMap<f64>, Robot<f64, M>, ObjectId) {
    let mut map = SlamMap::new();
    let pose = Gaussian::from_parts(
        vector(&[1.0, 2.0, 0.3]),
        nalgebra::dmatrix![
            0.10, 0.01, 0.00;
            0.01, 0.20, 0.02;
            0.00, 0.02, 0.05
        ],
    )
    .unwrap();
    let mut robot = Robot::new(&mut map, model, pose).unwrap();
    robot.link_to_map(&mut map).unwrap();

    let landmark = map.add_landmark(&isotropic(&[4.0, -1.0], 0.7)).unwrap();
    map.set_cross_covariance(
        robot.id(),
        landmark,
        &nalgebra::dmatrix![
            0.03, 0.01;
            -0.02, 0.04;
            0.00, 0.01
        ],
    )
    .unwrap();

    (map, robot, landmark)
}

/// Motion model with fixed Jacobians, used to pin the propagation algebra.
#[derive(Debug, Clone)]
pub struct FixedLinearModel {
    pub f: DMatrix<f64>,
    pub g: DMatrix<f64>,
}

impl MotionModel<f64> for FixedLinearModel {
    fn state_size(&self) -> usize {
        self.f.nrows()
    }

    fn control_size(&self) -> usize {
        self.g.ncols()
    }

    fn predict(&self, state: &DVector<f64>, control: &DVector<f64>, _dt: f64) -> rtslam::Result<MotionPrediction<f64>> {
        Ok(MotionPrediction {
            state: &self.f * state + &self.g * control,
            jacobian_state: self.f.clone(),
            jacobian_control: self.g.clone(),
        })
    }
}

/// Motion model that always fails.
#[derive(Debug, Clone)]
pub struct SingularModel;

impl MotionModel<f64> for SingularModel {
    fn state_size(&self) -> usize {
        3
    }

    fn control_size(&self) -> usize {
        2
    }

    fn predict(&self, _state: &DVector<f64>, _control: &DVector<f64>, _dt: f64) -> rtslam::Result<MotionPrediction<f64>> {
        Err(SlamError::MotionModelFailure {
            reason: "singular configuration".to_string(),
        })
    }
}

/// Motion model returning a control Jacobian of the wrong width.
#[derive(Debug, Clone)]
pub struct MisshapenModel;

impl MotionModel<f64> for MisshapenModel {
    fn state_size(&self) -> usize {
        3
    }

    fn control_size(&self) -> usize {
        2
    }

    fn predict(&self, state: &DVector<f64>, _control: &DVector<f64>, _dt: f64) -> rtslam::Result<MotionPrediction<f64>> {
        Ok(MotionPrediction {
            state: state.clone(),
            jacobian_state: DMatrix::identity(3, 3),
            jacobian_control: DMatrix::zeros(3, 3),
        })
    }
}
