//! Integration tests for the robot prediction step over a shared map

mod common;

use approx::assert_relative_eq;
use common::{isotropic, robot_and_landmark, vector, FixedLinearModel, MisshapenModel, SingularModel};
use nalgebra::{dmatrix, DMatrix};
use rtslam::prelude::*;

fn max_abs_diff(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
    (a - b).abs().max()
}

#[test]
fn test_end_to_end_one_dimensional() {
    let mut map = SlamMap::new();
    let mut robot = Robot::new(&mut map, ConstantIncrement::new(1), isotropic(&[0.0], 0.01)).unwrap();
    robot.link_to_map(&mut map).unwrap();

    let control = Control::with_dt(isotropic(&[1.0], 0.02), 1.0).unwrap();
    robot.predict_with(&mut map, control).unwrap();

    let pose = robot.pose(&map).unwrap();
    assert_relative_eq!(pose.mean()[0], 1.0);
    assert_relative_eq!(robot.perturbation()[(0, 0)], 0.02);
    assert_relative_eq!(pose.covariance()[(0, 0)], 0.03, epsilon = 1e-15);
}

#[test]
fn test_identity_motion_without_noise_keeps_all_blocks() {
    let model = FixedLinearModel {
        f: DMatrix::identity(3, 3),
        g: DMatrix::zeros(3, 2),
    };
    let (mut map, mut robot, landmark) = robot_and_landmark(model);
    let before = map.clone();

    robot.predict(&mut map).unwrap();

    assert_eq!(robot.perturbation(), &DMatrix::zeros(3, 3));
    assert_eq!(map.gaussian(robot.id()).unwrap(), before.gaussian(robot.id()).unwrap());
    assert_eq!(
        map.cross_covariance(robot.id(), landmark).unwrap(),
        before.cross_covariance(robot.id(), landmark).unwrap()
    );
    assert_eq!(map.gaussian(landmark).unwrap(), before.gaussian(landmark).unwrap());
}

#[test]
fn test_cross_blocks_follow_state_jacobian() {
    let f = dmatrix![
        1.0, 0.0, -0.4;
        0.0, 1.0, 0.9;
        0.0, 0.0, 1.0
    ];
    let g = dmatrix![
        0.1, 0.0;
        0.0, 0.0;
        0.0, 0.1
    ];
    let (mut map, mut robot, landmark) = robot_and_landmark(FixedLinearModel { f: f.clone(), g: g.clone() });
    robot
        .control_mut()
        .set_covariance(dmatrix![0.5, 0.0; 0.0, 0.2])
        .unwrap();
    let before = map.clone();

    robot.predict_with_input(&mut map, &vector(&[1.0, 0.5])).unwrap();

    let p_rr = before.gaussian(robot.id()).unwrap().covariance().clone();
    let p_rl = before.cross_covariance(robot.id(), landmark).unwrap();
    let q = &g * robot.control().covariance() * g.transpose();

    let expected_rr = &f * &p_rr * f.transpose() + &q;
    let expected_rl = &f * &p_rl;

    let pose = map.gaussian(robot.id()).unwrap();
    assert!(max_abs_diff(pose.covariance(), &expected_rr) < 1e-12);
    assert!(max_abs_diff(&map.cross_covariance(robot.id(), landmark).unwrap(), &expected_rl) < 1e-12);
    assert!(max_abs_diff(&map.cross_covariance(landmark, robot.id()).unwrap(), &expected_rl.transpose()) < 1e-12);
    assert_eq!(map.gaussian(landmark).unwrap(), before.gaussian(landmark).unwrap());
    map.check_consistency(1e-12).unwrap();
}

#[test]
fn test_wrong_control_size_leaves_map_unchanged() {
    let (mut map, mut robot, _) = robot_and_landmark(Unicycle2D::new());
    let before = map.clone();

    let result = robot.predict_with_input(&mut map, &vector(&[1.0, 0.1, 0.0]));

    assert!(matches!(result, Err(SlamError::SizeMismatch { expected: 2, actual: 3, .. })));
    assert_eq!(map.mean(), before.mean());
    assert_eq!(map.covariance(), before.covariance());
}

#[test]
fn test_motion_model_failure_propagates_unchanged() {
    let (mut map, mut robot, _) = robot_and_landmark(SingularModel);
    let before = map.clone();

    let result = robot.predict(&mut map);

    assert_eq!(
        result,
        Err(SlamError::MotionModelFailure {
            reason: "singular configuration".to_string()
        })
    );
    assert_eq!(map.covariance(), before.covariance());
}

#[test]
fn test_misshapen_jacobian_is_size_mismatch() {
    let (mut map, mut robot, _) = robot_and_landmark(MisshapenModel);
    let before = map.clone();

    let result = robot.predict(&mut map);

    assert!(matches!(
        result,
        Err(SlamError::SizeMismatch {
            context: "control jacobian columns",
            expected: 2,
            actual: 3
        })
    ));
    assert_eq!(map.mean(), before.mean());
}

#[test]
fn test_constant_perturbation_is_never_recomputed() {
    let (mut map, mut robot, _) = robot_and_landmark(Unicycle2D::new());
    let q0 = DMatrix::from_diagonal(&vector(&[0.001, 0.002, 0.0005]));
    robot.set_constant_perturbation(q0.clone()).unwrap();

    for (i, u) in [[1.0, 0.0], [0.5, 0.3], [2.0, -0.7]].iter().enumerate() {
        let noise = 0.01 * (i + 1) as f64;
        robot
            .control_mut()
            .set_covariance(DMatrix::identity(2, 2) * noise)
            .unwrap();
        robot.control_mut().dt = 0.1 * (i + 1) as f64;
        robot.predict_with_input(&mut map, &vector(u)).unwrap();
        assert_eq!(robot.perturbation(), &q0);
    }
}

#[test]
fn test_constant_perturbation_via_config_and_setup() {
    let mut map = SlamMap::new();
    let config = RobotConfig::new().with_constant_perturbation(true);
    let mut robot = Robot::with_config(
        &mut map,
        Unicycle2D::new(),
        isotropic(&[0.0, 0.0, 0.0], 0.01),
        config,
    )
    .unwrap();
    robot.control_mut().set_mean(vector(&[1.0, 0.0])).unwrap();
    robot.control_mut().set_covariance(DMatrix::identity(2, 2) * 0.1).unwrap();
    robot.control_mut().dt = 0.5;
    robot.setup_constant_perturbation(&map).unwrap();
    let q0 = robot.perturbation().clone();
    assert!(q0[(0, 0)] > 0.0);

    robot.control_mut().set_covariance(DMatrix::identity(2, 2) * 5.0).unwrap();
    robot.predict(&mut map).unwrap();
    robot.predict(&mut map).unwrap();

    assert_eq!(robot.perturbation(), &q0);
}

#[test]
fn test_perturbation_refreshes_each_step() {
    let (mut map, mut robot, _) = robot_and_landmark(Unicycle2D::new());
    robot.control_mut().set_covariance(DMatrix::identity(2, 2) * 0.01).unwrap();
    robot.control_mut().dt = 0.2;

    robot.predict_with_input(&mut map, &vector(&[1.0, 0.0])).unwrap();
    let q1 = robot.perturbation().clone();
    robot.predict_with_input(&mut map, &vector(&[3.0, 0.5])).unwrap();
    let q2 = robot.perturbation().clone();

    assert!(max_abs_diff(&q1, &q2) > 1e-9);
    let g = robot.jacobian_control();
    let expected = g * robot.control().covariance() * g.transpose();
    assert!(max_abs_diff(&q2, &expected) < 1e-15);
    assert!(rtslam::utils::is_symmetric(&q2, 0.0));
}

#[test]
fn test_two_robots_share_one_covariance() {
    let mut map = SlamMap::new();
    let mut a = Robot::new(&mut map, Odometry2D::new(), isotropic(&[0.0, 0.0, 0.0], 0.01)).unwrap();
    let mut b = Robot::new(&mut map, Odometry2D::new(), isotropic(&[5.0, 5.0, 1.0], 0.02)).unwrap();
    a.link_to_map(&mut map).unwrap();
    b.link_to_map(&mut map).unwrap();
    assert_eq!(map.robots(), &[a.id(), b.id()]);

    a.control_mut().set_covariance(DMatrix::identity(3, 3) * 0.001).unwrap();
    a.predict_with_input(&mut map, &vector(&[1.0, 0.0, 0.1])).unwrap();

    // Robot b was not moved: its block and the (still zero) a/b cross block are intact
    assert_eq!(map.gaussian(b.id()).unwrap(), isotropic(&[5.0, 5.0, 1.0], 0.02));
    assert_eq!(map.cross_covariance(a.id(), b.id()).unwrap(), DMatrix::zeros(3, 3));
    assert_relative_eq!(map.gaussian(a.id()).unwrap().mean()[0], 1.0, epsilon = 1e-12);
}

#[test]
fn test_repeated_prediction_grows_heading_uncertainty_and_stays_consistent() {
    let (mut map, mut robot, landmark) = robot_and_landmark(Unicycle2D::new());
    robot.control_mut().set_continuous_covariance(DMatrix::identity(2, 2) * 0.05).unwrap();

    let mut last = robot.pose(&map).unwrap().covariance()[(2, 2)];
    for _ in 0..50 {
        robot.control_mut().discretize_covariance(0.1).unwrap();
        robot.control_mut().dt = 0.1;
        robot.predict_with_input(&mut map, &vector(&[1.0, 0.3])).unwrap();

        let now = robot.pose(&map).unwrap().covariance()[(2, 2)];
        assert!(now >= last);
        last = now;
    }

    map.check_consistency(1e-9).unwrap();
    assert_eq!(map.gaussian(landmark).unwrap(), isotropic(&[4.0, -1.0], 0.7));
}

#[test]
fn test_removing_a_landmark_keeps_prediction_working() {
    let (mut map, mut robot, landmark) = robot_and_landmark(Unicycle2D::new());
    let second = map.add_landmark(&isotropic(&[0.0, 3.0], 0.3)).unwrap();
    map.remove(landmark).unwrap();

    robot.predict_with_input(&mut map, &vector(&[1.0, 0.0])).unwrap();

    assert_eq!(map.state_size(), 5);
    assert_eq!(map.gaussian(second).unwrap(), isotropic(&[0.0, 3.0], 0.3));
    map.check_consistency(1e-12).unwrap();
}

#[test]
fn test_tiny_turn_rate_keeps_process_noise_of_straight_motion() {
    let perturbation_for = |omega: f64| {
        let mut map = SlamMap::new();
        let mut robot = Robot::new(&mut map, Unicycle2D::new(), isotropic(&[0.0, 0.0, 0.0], 0.01)).unwrap();
        robot
            .control_mut()
            .set_covariance(DMatrix::from_diagonal(&vector(&[0.01, 0.01])))
            .unwrap();
        robot.predict_with_input(&mut map, &vector(&[1.0, omega])).unwrap();
        robot.perturbation().clone()
    };

    let straight = perturbation_for(0.0);
    // G[1][1] = v·dt²/2 at θ = 0
    assert_relative_eq!(straight[(1, 1)], 0.0025, epsilon = 1e-12);
    for omega in [2e-9, 1e-7, 1e-5, 2e-3] {
        let turning = perturbation_for(omega);
        assert!(max_abs_diff(&turning, &straight) < 1e-4, "omega = {}: {}", omega, turning);
    }
}
