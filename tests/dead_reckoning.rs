//! Dead reckoning against the simulated robot
//!
//! The simulator integrates exact arcs while the estimator uses midpoint
//! integration, so small differences are expected on curved paths.
//!
//! | Scenario | Position error | Heading error |
//! |----------|----------------|---------------|
//! | Straight 1 m | < 1 mm | < 1e-9 rad |
//! | Spin 360 deg | < 1 mm | < 1e-6 rad |
//! | Square 0.5 m | < 2 cm | < 0.02 rad |
//! | Pushing a wall | < 1 cm | - |
//!
//! Run with: `cargo test --test dead_reckoning`

use approx::assert_relative_eq;
use seeker_core::common::math::angle_diff;
use seeker_core::common::types::{Pose, WheelCommand};
use seeker_core::config::{LidarConfig, PoseConfig, RobotConfig, ScanMatchConfig, SlipConfig};
use seeker_core::control::{Actuator, DifferentialDrive};
use seeker_core::perception::localization::PoseEstimator;
use seeker_core::perception::sensors::SensorSource;
use seeker_core::sim::{Rect, SimRobot, World, DEFAULT_DT};

fn estimator() -> PoseEstimator {
    PoseEstimator::new(
        &RobotConfig::default(),
        PoseConfig::default(),
        SlipConfig::default(),
        ScanMatchConfig {
            enabled: false,
            ..ScanMatchConfig::default()
        },
    )
}

fn robot() -> SimRobot {
    SimRobot::new(
        World::new(),
        RobotConfig::default(),
        LidarConfig::default(),
        Pose::origin(),
    )
}

/// Drive `command` for `ticks` cycles, feeding the estimator each cycle
fn drive(robot: &mut SimRobot, est: &mut PoseEstimator, command: WheelCommand, ticks: usize) {
    for _ in 0..ticks {
        robot.apply(command);
        robot.advance(DEFAULT_DT);
        let frame = robot.read();
        est.update(frame.left_wheel, frame.right_wheel, None, None, None);
    }
}

fn position_error(a: &Pose, b: &Pose) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

#[test]
fn straight_line() {
    let drive_model = DifferentialDrive::new(&RobotConfig::default());
    let mut bot = robot();
    let mut est = estimator();
    est.update(0.0, 0.0, None, None, None);

    // 0.1 m/s for 10 s
    let command = drive_model.wheel_speeds(0.1, 0.0);
    let ticks = (10.0 / DEFAULT_DT).round() as usize;
    drive(&mut bot, &mut est, command, ticks);

    let truth = bot.pose();
    let pose = est.pose();
    assert_relative_eq!(truth.x, 0.1 * ticks as f64 * DEFAULT_DT, epsilon = 1e-9);
    assert!(position_error(&truth, &pose) < 1e-3);
    assert!(pose.theta.abs() < 1e-9);
}

#[test]
fn spin_in_place_returns_heading() {
    let drive_model = DifferentialDrive::new(&RobotConfig::default());
    let mut bot = robot();
    let mut est = estimator();
    est.update(0.0, 0.0, None, None, None);

    // pi/4 rad/s for 8 s: one full turn
    let command = drive_model.wheel_speeds(0.0, std::f64::consts::FRAC_PI_4);
    drive(&mut bot, &mut est, command, 250);

    let pose = est.pose();
    assert!(position_error(&bot.pose(), &pose) < 1e-3);
    assert!(angle_diff(bot.pose().theta, pose.theta).abs() < 1e-6);
    assert!(pose.theta > -std::f64::consts::PI && pose.theta <= std::f64::consts::PI);
}

#[test]
fn square_path_tracks_truth() {
    let drive_model = DifferentialDrive::new(&RobotConfig::default());
    let mut bot = robot();
    let mut est = estimator();
    est.update(0.0, 0.0, None, None, None);

    let forward = drive_model.wheel_speeds(0.1, 0.0);
    let turn = drive_model.wheel_speeds(0.0, std::f64::consts::FRAC_PI_4);
    for _ in 0..4 {
        // 0.5 m then roughly 90 degrees
        drive(&mut bot, &mut est, forward, 156);
        drive(&mut bot, &mut est, turn, 62);
    }

    let truth = bot.pose();
    let pose = est.pose();
    assert!(position_error(&truth, &pose) < 0.02, "truth {:?} estimate {:?}", truth, pose);
    assert!(angle_diff(truth.theta, pose.theta).abs() < 0.02);
}

#[test]
fn compass_heading_overrides_drift() {
    let mut bot = robot().with_compass(true);
    let mut est = estimator();
    est.update(0.0, 0.0, None, None, None);

    bot.apply(WheelCommand::new(1.0, 3.0));
    for _ in 0..200 {
        bot.advance(DEFAULT_DT);
        let frame = bot.read();
        est.update(frame.left_wheel, frame.right_wheel, frame.heading, None, None);
        assert_relative_eq!(est.pose().theta, bot.pose().theta, epsilon = 1e-12);
    }
}

#[test]
fn pushing_into_a_wall_freezes_the_estimate() {
    // Nose against a wall with side walls close by: every forward step is
    // blocked while the wheels keep turning
    let world = World::new()
        .with_obstacle(Rect::new(0.002, -1.0, 1.0, 1.0))
        .with_obstacle(Rect::new(-1.0, 0.06, 1.0, 1.0))
        .with_obstacle(Rect::new(-1.0, -1.0, 1.0, -0.06));
    let mut bot = SimRobot::new(
        world,
        RobotConfig::default(),
        LidarConfig::default(),
        Pose::origin(),
    );
    let mut est = estimator();
    let frame = bot.read();
    est.update(0.0, 0.0, None, frame.scan.as_ref(), None);

    let command = DifferentialDrive::new(&RobotConfig::default()).wheel_speeds(0.1, 0.0);
    for _ in 0..40 {
        bot.apply(command);
        bot.advance(DEFAULT_DT);
        let frame = bot.read();
        est.update(frame.left_wheel, frame.right_wheel, None, frame.scan.as_ref(), None);
    }

    assert_eq!(bot.pose(), Pose::origin());
    assert!(bot.collisions() > 0);
    assert!(est.slip_active());
    // Only the cycles before the debounce completes leak through
    assert!(est.pose().x < 0.01, "estimate drifted to {:?}", est.pose());
}
