//! Example usage of the RTSLAM library
//!
//! Drives a differential-drive robot around a small landmark map and shows how
//! the prediction step grows the robot uncertainty and its correlations with
//! the landmarks.

use log::info;
use nalgebra::{DMatrix, DVector};
use rtslam::prelude::*;

/// Sensor that only reports the pose it is handed after each motion step.
struct PoseReporter {
    robot: Option<ObjectId>,
}

impl Sensor<f64> for PoseReporter {
    fn name(&self) -> &str {
        "pose-reporter"
    }

    fn link_to_robot(&mut self, robot: ObjectId) {
        self.robot = Some(robot);
    }

    fn process(&mut self, robot: ObjectId, map: &mut SlamMap<f64>) -> rtslam::Result<()> {
        let pose = map.gaussian(robot)?;
        info!(
            "{} on {:?}: pose = ({:.3}, {:.3}, {:.3}), trace(P) = {:.5}",
            self.name(),
            self.robot,
            pose.mean()[0],
            pose.mean()[1],
            pose.mean()[2],
            pose.uncertainty()
        );
        Ok(())
    }
}

fn main() -> rtslam::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("RTSLAM: EKF-SLAM prediction");
    println!("===========================\n");

    let mut map = SlamMap::<f64>::new();

    // Robot at the origin, facing +x
    let start = Gaussian::with_diagonal(
        DVector::from_vec(vec![0.0, 0.0, 0.0]),
        &DVector::from_vec(vec![0.01, 0.01, 0.001]),
    )?;
    let mut robot = Robot::new(&mut map, Unicycle2D::new(), start)?;
    robot.link_to_map(&mut map)?;
    robot.link_to_sensor(PoseReporter { robot: None });

    // Two landmarks, the first one correlated with the robot
    let landmarks = [
        map.add_landmark(&Gaussian::with_diagonal(
            DVector::from_vec(vec![5.0, 1.0]),
            &DVector::from_vec(vec![0.5, 0.5]),
        )?)?,
        map.add_landmark(&Gaussian::with_diagonal(
            DVector::from_vec(vec![3.0, -2.0]),
            &DVector::from_vec(vec![0.2, 0.2]),
        )?)?,
    ];
    map.set_cross_covariance(
        robot.id(),
        landmarks[0],
        &DMatrix::from_row_slice(3, 2, &[0.005, 0.0, 0.0, 0.005, 0.0, 0.0]),
    )?;

    // Continuous-time control: 1 m/s forward, 0.2 rad/s turn, white velocity noise
    let control = robot.control_mut();
    control.set_continuous_mean(DVector::from_vec(vec![1.0, 0.2]))?;
    control.set_continuous_covariance(DMatrix::from_diagonal(&DVector::from_vec(vec![
        0.01, 0.005,
    ])))?;

    let dt = 0.1;
    for step in 0..20 {
        // Discretize the noise for this step; the velocities stay rates
        let control = robot.control_mut();
        control.discretize_covariance(dt)?;
        control.set_mean(DVector::from_vec(vec![1.0, 0.2]))?;
        control.dt = dt;

        robot.predict(&mut map)?;
        robot.explore_sensors(&mut map)?;

        if step % 5 == 4 {
            println!("Step {}:\n{}", step + 1, robot.summary(&map)?);
            for (i, &lmk) in landmarks.iter().enumerate() {
                let cross = map.cross_covariance(robot.id(), lmk)?;
                println!("  |P_r{}| = {:.5}", i, cross.norm());
            }
            println!();
        }
    }

    map.check_consistency(1e-9)?;
    println!("Map covariance is symmetric and positive semi-definite.");
    Ok(())
}
