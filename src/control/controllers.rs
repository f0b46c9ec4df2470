//! Controllers for the robot

use crate::common::math::wrap_angle;
use crate::common::types::{Point2D, Pose, WheelCommand};
use crate::config::{NavigationConfig, RobotConfig};

/// Which side of the robot the followed wall is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WallSide {
    Left,
    Right,
}

/// Unicycle to wheel-speed conversion for a differential drive
#[derive(Debug, Clone)]
pub struct DifferentialDrive {
    wheel_radius: f64,
    axle_length: f64,
    max_wheel_speed: f64,
}

impl DifferentialDrive {
    pub fn new(robot: &RobotConfig) -> Self {
        DifferentialDrive {
            wheel_radius: robot.wheel_radius,
            axle_length: robot.axle_length,
            max_wheel_speed: robot.max_wheel_speed,
        }
    }

    pub fn max_wheel_speed(&self) -> f64 {
        self.max_wheel_speed
    }

    /// Wheel speeds for body velocities `v` (m/s) and `omega` (rad/s).
    ///
    /// If either wheel exceeds the limit both are scaled by the same factor,
    /// which keeps the turning radius.
    pub fn wheel_speeds(&self, v: f64, omega: f64) -> WheelCommand {
        let half_axle = self.axle_length / 2.0;
        let left = (v - omega * half_axle) / self.wheel_radius;
        let right = (v + omega * half_axle) / self.wheel_radius;
        self.saturate(WheelCommand::new(left, right))
    }

    /// Scale a wheel command into the speed limit, preserving its ratio
    pub fn saturate(&self, command: WheelCommand) -> WheelCommand {
        if !command.left.is_finite() || !command.right.is_finite() {
            return WheelCommand::stop();
        }
        let peak = command.left.abs().max(command.right.abs());
        if peak <= self.max_wheel_speed {
            return command;
        }
        let scale = self.max_wheel_speed / peak;
        WheelCommand::new(command.left * scale, command.right * scale)
    }

    /// Body velocities `(v, omega)` produced by a wheel command
    pub fn body_velocity(&self, command: &WheelCommand) -> (f64, f64) {
        let v = self.wheel_radius * (command.left + command.right) / 2.0;
        let omega = self.wheel_radius * (command.right - command.left) / self.axle_length;
        (v, omega)
    }
}

/// Polar-coordinate point stabilising controller
#[derive(Debug, Clone)]
pub struct GoToGoalController {
    k_rho: f64,
    k_alpha: f64,
    k_beta: f64,
}

impl GoToGoalController {
    /// Create a new controller
    pub fn new(config: &NavigationConfig) -> Self {
        GoToGoalController {
            k_rho: config.k_rho,
            k_alpha: config.k_alpha,
            k_beta: config.k_beta,
        }
    }

    /// Compute `(v, omega)` toward `goal`.
    ///
    /// The forward term is gated by `max(cos(alpha), 0)` so the robot turns
    /// in place instead of reversing when the goal is behind it.
    pub fn compute_velocity(&self, pose: &Pose, goal: &Point2D) -> (f64, f64) {
        let rho = pose.distance_to(goal);
        let alpha = pose.relative_bearing(goal);
        let beta = wrap_angle(-pose.theta - alpha);

        let v = self.k_rho * rho * alpha.cos().max(0.0);
        let omega = self.k_alpha * alpha + self.k_beta * beta;
        (v, omega)
    }
}

/// Proportional wall follower on the side range
#[derive(Debug, Clone)]
pub struct WallFollowController {
    standoff: f64,
    k_wall: f64,
    base_speed: f64,
    turn_speed: f64,
    front_min_distance: f64,
}

impl WallFollowController {
    pub fn new(config: &NavigationConfig) -> Self {
        WallFollowController {
            standoff: config.wall_standoff,
            k_wall: config.k_wall,
            base_speed: config.wall_base_speed,
            turn_speed: config.wall_turn_speed,
            front_min_distance: config.front_min_distance,
        }
    }

    /// Wheel speeds for one wall-following cycle.
    ///
    /// `side_range` is the nearest return on the wall side, `front_range` the
    /// nearest return in the narrow front cone.
    pub fn compute_wheels(&self, side: WallSide, side_range: f64, front_range: f64) -> WheelCommand {
        if front_range < self.front_min_distance {
            // Turn in place away from the wall
            return match side {
                WallSide::Left => WheelCommand::new(self.turn_speed, -self.turn_speed),
                WallSide::Right => WheelCommand::new(-self.turn_speed, self.turn_speed),
            };
        }

        let error = side_range - self.standoff;
        let delta = (self.k_wall * error).clamp(-self.base_speed, self.base_speed);
        match side {
            WallSide::Left => WheelCommand::new(self.base_speed - delta, self.base_speed + delta),
            WallSide::Right => WheelCommand::new(self.base_speed + delta, self.base_speed - delta),
        }
    }

    /// Turn in place toward `bearing` (robot frame)
    pub fn turn_toward(&self, bearing: f64) -> WheelCommand {
        if bearing >= 0.0 {
            WheelCommand::new(-self.turn_speed, self.turn_speed)
        } else {
            WheelCommand::new(self.turn_speed, -self.turn_speed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn drive() -> DifferentialDrive {
        DifferentialDrive::new(&RobotConfig::default())
    }

    #[test]
    fn straight_command_has_equal_wheels() {
        let cmd = drive().wheel_speeds(0.1, 0.0);
        assert_relative_eq!(cmd.left, 0.1 / 0.033);
        assert_relative_eq!(cmd.left, cmd.right);
    }

    #[test]
    fn saturation_keeps_ratio() {
        let d = drive();
        let cmd = d.wheel_speeds(1.0, 2.0);
        let raw_left = (1.0 - 2.0 * 0.08) / 0.033;
        let raw_right = (1.0 + 2.0 * 0.08) / 0.033;
        assert_relative_eq!(cmd.right, 6.28, epsilon = 1e-9);
        assert_relative_eq!(cmd.left / cmd.right, raw_left / raw_right, epsilon = 1e-9);
    }

    #[test]
    fn body_velocity_inverts_wheel_speeds() {
        let d = drive();
        let cmd = d.wheel_speeds(0.05, 0.3);
        let (v, w) = d.body_velocity(&cmd);
        assert_relative_eq!(v, 0.05, epsilon = 1e-12);
        assert_relative_eq!(w, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn goal_ahead_drives_straight() {
        let c = GoToGoalController::new(&NavigationConfig::default());
        let (v, w) = c.compute_velocity(&Pose::origin(), &Point2D::new(2.0, 0.0));
        assert_relative_eq!(v, 1.0);
        assert_relative_eq!(w, 0.0);
    }

    #[test]
    fn goal_behind_turns_in_place() {
        let c = GoToGoalController::new(&NavigationConfig::default());
        let pose = Pose::new(0.0, 0.0, PI);
        let (v, w) = c.compute_velocity(&pose, &Point2D::new(1.0, 0.1));
        assert_eq!(v, 0.0);
        assert!(w.abs() > 0.0);
    }

    #[test]
    fn wall_follower_steers_toward_distant_wall() {
        let c = WallFollowController::new(&NavigationConfig::default());
        let cmd = c.compute_wheels(WallSide::Left, 0.25, 3.0);
        // Positive error on the left: right wheel faster
        assert!(cmd.right > cmd.left);
        let cmd = c.compute_wheels(WallSide::Right, 0.25, 3.0);
        assert!(cmd.left > cmd.right);
    }

    #[test]
    fn wall_follower_offset_is_clamped() {
        let c = WallFollowController::new(&NavigationConfig::default());
        let cmd = c.compute_wheels(WallSide::Left, 3.5, 3.0);
        assert_relative_eq!(cmd.left, 0.0);
        assert_relative_eq!(cmd.right, 4.0);
    }

    #[test]
    fn blocked_front_turns_away_from_wall() {
        let c = WallFollowController::new(&NavigationConfig::default());
        let cmd = c.compute_wheels(WallSide::Left, 0.15, 0.1);
        assert!(cmd.left > 0.0 && cmd.right < 0.0);
        let cmd = c.compute_wheels(WallSide::Right, 0.15, 0.1);
        assert!(cmd.left < 0.0 && cmd.right > 0.0);
    }

    #[test]
    fn turn_toward_follows_bearing_sign() {
        let c = WallFollowController::new(&NavigationConfig::default());
        let cmd = c.turn_toward(1.0);
        assert!(cmd.left < 0.0 && cmd.right > 0.0);
        let cmd = c.turn_toward(-1.0);
        assert!(cmd.left > 0.0 && cmd.right < 0.0);
    }
}
