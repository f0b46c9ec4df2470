//! Closed-loop navigation scenarios
//!
//! The core drives a simulated robot at the default 32 ms control period:
//! - open field run to a nearby goal
//! - first contact with an obstacle (hit point and wall side)
//! - Bug2 run around a single rectangle
//!
//! Run with: `cargo test --test navigation_scenarios`

use seeker_core::common::types::Pose;
use seeker_core::config::CoreConfig;
use seeker_core::control::{Actuator, WallSide};
use seeker_core::navigation::bug2::NavigationState;
use seeker_core::perception::sensors::SensorSource;
use seeker_core::sim::{Rect, SimRobot, Simulation, World, DEFAULT_DT};
use seeker_core::SeekerCore;

fn config_without_matching() -> CoreConfig {
    let mut config = CoreConfig::default();
    config.scan_match.enabled = false;
    config
}

fn simulation(config: CoreConfig, world: World, goal: (f64, f64)) -> Simulation {
    let robot = SimRobot::new(world, config.robot.clone(), config.lidar.clone(), Pose::origin());
    let mut core = SeekerCore::new(config).unwrap();
    core.init().unwrap();
    core.set_goal(goal.0, goal.1).unwrap();
    Simulation::new(core, robot, DEFAULT_DT)
}

#[test]
fn open_field_run_reaches_goal() {
    let mut sim = simulation(CoreConfig::default(), World::new(), (1.0, 0.0));

    let mut last_distance = f64::INFINITY;
    let mut reached_at = None;
    for _ in 0..1_000 {
        let output = sim.step();
        let telemetry = sim.core().telemetry();
        let distance = telemetry.distance_to_goal().unwrap();
        assert!(
            distance <= last_distance + 1e-9,
            "distance grew from {} to {} at tick {}",
            last_distance,
            distance,
            telemetry.tick
        );
        last_distance = distance;
        assert_eq!(telemetry.state, NavigationState::GoToGoal);

        if output.reached {
            assert!(output.command.is_stopped());
            reached_at = Some(telemetry.tick);
            break;
        }
    }

    assert!(reached_at.is_some(), "goal not reached");
    assert!(last_distance < 0.20);
    let truth = sim.robot().pose();
    assert!((truth.x - 1.0).abs() < 0.25);
    assert!(truth.y.abs() < 0.01);

    // Keeps holding still once there
    let output = sim.step();
    assert!(output.reached);
    assert!(output.command.is_stopped());
}

#[test]
fn obstacle_contact_records_hit_point_and_side() {
    // Wall face at x = 1.0, extending further to the left than to the right
    let world = World::new().with_obstacle(Rect::new(1.0, -1.0, 1.3, 1.5));
    let config = config_without_matching();
    let mut robot =
        SimRobot::new(world, config.robot.clone(), config.lidar.clone(), Pose::origin());
    let mut core = SeekerCore::new(config).unwrap();
    core.init().unwrap();
    // Slightly left of straight ahead, so the wall's nearest point is on the right
    core.set_goal(3.0, 0.5).unwrap();

    let mut contact = None;
    for _ in 0..1_000 {
        let frame = robot.read();
        let before = core.navigation().state();
        let output = core.tick(&frame);
        robot.apply(output.command);
        robot.advance(DEFAULT_DT);

        if core.navigation().state() == NavigationState::WallFollow {
            assert_eq!(before, NavigationState::GoToGoal);
            contact = Some((frame, output));
            break;
        }
        assert!(!output.obstacle);
    }

    let (frame, output) = contact.expect("never reached the wall");
    let telemetry = core.telemetry();
    assert!(output.obstacle);
    assert!(telemetry.obstacle_detected);
    assert!(telemetry.tick > 50);

    let hit = core.navigation().navigator().hit_point().unwrap();
    assert_eq!(hit.pose, output.pose);
    assert!(hit.pose.x > 0.6 && hit.pose.x < 0.8);

    let scan = frame.scan.unwrap();
    assert!(scan.right_min() < scan.left_min());
    assert_eq!(telemetry.wall_side, Some(WallSide::Right));
}

#[test]
fn bug2_gets_around_a_rectangle() {
    let world = World::new().with_obstacle(Rect::new(1.2, -0.5, 1.6, 0.7));
    let mut sim = simulation(config_without_matching(), world, (3.0, 0.0));

    let mut transitions = Vec::new();
    let mut state = NavigationState::GoToGoal;
    let mut reached = false;
    for _ in 0..12_000 {
        let output = sim.step();
        let telemetry = sim.core().telemetry();
        if telemetry.state != state {
            state = telemetry.state;
            transitions.push((telemetry.tick, state, telemetry.pose));
        }
        if output.reached {
            reached = true;
            break;
        }
    }

    assert!(reached, "goal not reached after {} ticks", sim.ticks());
    assert!(transitions.len() >= 2, "transitions: {:?}", transitions);
    assert_eq!(transitions[0].1, NavigationState::WallFollow);
    assert_eq!(transitions.last().map(|t| t.1), Some(NavigationState::GoToGoal));

    // Left the wall on the far side of the obstacle, back on the M-line
    let (_, _, leave) = transitions[transitions.len() - 1];
    assert!(leave.x > 1.6);
    assert!(leave.y.abs() < 0.08);

    let truth = sim.robot().pose();
    assert!((truth.x - 3.0).abs() < 0.3 && truth.y.abs() < 0.3);
    assert_eq!(sim.robot().collisions(), 0);
}
