//! Bug2 reactive navigation
//!
//! The robot drives straight at the goal until something blocks the forward
//! third of the scan, then follows the obstacle boundary until it is back on
//! the M-line, closer to the goal than where it left it, with a clear path
//! ahead. On such a point with the wall still in the forward third but the
//! goal direction open, it turns in place toward the goal before leaving.

use super::mline::MLine;
use crate::common::types::{Point2D, Pose, WheelCommand};
use crate::config::{NavigationConfig, RobotConfig};
use crate::control::{DifferentialDrive, GoToGoalController, WallFollowController, WallSide};
use crate::error::{ConfigError, CoreError};
use crate::perception::sensors::RangeScan;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Navigation state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationState {
    GoToGoal,
    WallFollow,
}

impl std::fmt::Display for NavigationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationState::GoToGoal => write!(f, "GO_TO_GOAL"),
            NavigationState::WallFollow => write!(f, "WALL_FOLLOW"),
        }
    }
}

/// Where the robot left the M-line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitPoint {
    pub pose: Pose,
    pub distance_to_goal: f64,
}

/// Result of one navigation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    pub command: WheelCommand,
    pub reached: bool,
    pub obstacle: bool,
}

impl StepOutput {
    fn stopped(obstacle: bool, reached: bool) -> Self {
        StepOutput {
            command: WheelCommand::stop(),
            reached,
            obstacle,
        }
    }
}

/// Range readings the state machine looks at each step
#[derive(Debug, Clone, Copy)]
struct Ranges {
    /// Forward third of the scan
    forward: f64,
    /// Sector of the same width centred on the goal
    toward_goal: f64,
    left: f64,
    right: f64,
    /// Narrow cone around the heading
    front: f64,
}

impl Ranges {
    fn measure(scan: Option<&RangeScan>, goal_bearing: f64, front_half_angle: f64) -> Self {
        match scan {
            Some(scan) => Ranges {
                forward: scan.forward_min(),
                toward_goal: scan.min_in_sector(goal_bearing, scan.third_half_width()),
                left: scan.left_min(),
                right: scan.right_min(),
                front: scan.min_in_sector(0.0, front_half_angle),
            },
            None => Ranges {
                forward: f64::INFINITY,
                toward_goal: f64::INFINITY,
                left: f64::INFINITY,
                right: f64::INFINITY,
                front: f64::INFINITY,
            },
        }
    }

    fn side(&self, side: WallSide) -> f64 {
        match side {
            WallSide::Left => self.left,
            WallSide::Right => self.right,
        }
    }
}

/// Bug2 navigator
#[derive(Debug)]
pub struct BugNavigator {
    config: NavigationConfig,
    drive: DifferentialDrive,
    go_to_goal: GoToGoalController,
    wall_follower: WallFollowController,
    state: NavigationState,
    goal: Option<Point2D>,
    mline: Option<MLine>,
    hit_point: Option<HitPoint>,
    wall_side: Option<WallSide>,
}

impl BugNavigator {
    pub fn new(config: NavigationConfig, robot: &RobotConfig) -> Self {
        BugNavigator {
            drive: DifferentialDrive::new(robot),
            go_to_goal: GoToGoalController::new(&config),
            wall_follower: WallFollowController::new(&config),
            config,
            state: NavigationState::GoToGoal,
            goal: None,
            mline: None,
            hit_point: None,
            wall_side: None,
        }
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn goal(&self) -> Option<Point2D> {
        self.goal
    }

    pub fn mline(&self) -> Option<&MLine> {
        self.mline.as_ref()
    }

    pub fn hit_point(&self) -> Option<HitPoint> {
        self.hit_point
    }

    pub fn wall_side(&self) -> Option<WallSide> {
        self.wall_side
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Forget the goal and return to GoToGoal
    pub fn reset(&mut self) {
        self.state = NavigationState::GoToGoal;
        self.goal = None;
        self.mline = None;
        self.hit_point = None;
        self.wall_side = None;
    }

    /// Set a new goal. The M-line runs from the current pose to the goal.
    ///
    /// Re-sending the current goal leaves the state machine untouched.
    pub fn set_goal(&mut self, goal: Point2D, pose: &Pose) -> Result<(), CoreError> {
        if !goal.is_finite() {
            log::warn!("Rejecting non-finite goal ({}, {})", goal.x, goal.y);
            return Err(CoreError::InvalidGoal { x: goal.x, y: goal.y });
        }
        if self.goal == Some(goal) {
            log::debug!("Goal ({:.2}, {:.2}) unchanged", goal.x, goal.y);
            return Ok(());
        }
        log::info!(
            "New goal ({:.2}, {:.2}) from ({:.2}, {:.2})",
            goal.x,
            goal.y,
            pose.x,
            pose.y
        );
        self.goal = Some(goal);
        self.mline = Some(MLine::new(pose.position(), goal));
        self.state = NavigationState::GoToGoal;
        self.hit_point = None;
        self.wall_side = None;
        Ok(())
    }

    /// Advance the state machine by one control cycle.
    ///
    /// A goal that differs from the current one restarts navigation from
    /// `pose`. A non-finite goal is ignored in favour of the previous one.
    pub fn step(&mut self, pose: &Pose, scan: Option<&RangeScan>, goal: Point2D) -> StepOutput {
        if self.goal != Some(goal) && self.set_goal(goal, pose).is_err() && self.goal.is_none() {
            return StepOutput::stopped(false, false);
        }
        let (goal, mline) = match (self.goal, self.mline) {
            (Some(goal), Some(mline)) => (goal, mline),
            _ => return StepOutput::stopped(false, false),
        };

        let distance = pose.distance_to(&goal);
        let ranges = Ranges::measure(
            scan,
            pose.relative_bearing(&goal),
            self.config.front_half_angle,
        );
        let obstacle = ranges.forward < self.config.obstacle_distance;

        if distance < self.config.goal_tolerance {
            return StepOutput::stopped(obstacle, true);
        }

        let state = self.state;
        let command = match state {
            NavigationState::GoToGoal if obstacle => {
                let side = if ranges.left <= ranges.right {
                    WallSide::Left
                } else {
                    WallSide::Right
                };
                self.enter_wall_follow(pose, distance, side);
                self.wall_command(side, &ranges)
            }
            NavigationState::GoToGoal => self.goal_command(pose, &goal),
            NavigationState::WallFollow => {
                let progress = self.hit_point.map_or(true, |hit| {
                    mline.contains(&pose.position(), self.config.mline_tolerance)
                        && distance < hit.distance_to_goal
                });
                let clearance = self.config.clearance_distance;
                if progress && ranges.forward > clearance {
                    self.leave_wall_follow(pose);
                    self.goal_command(pose, &goal)
                } else if progress && ranges.toward_goal > clearance {
                    let turn = self.wall_follower.turn_toward(pose.relative_bearing(&goal));
                    self.drive.saturate(turn)
                } else {
                    let side = self.wall_side.unwrap_or(WallSide::Left);
                    self.wall_command(side, &ranges)
                }
            }
        };

        StepOutput {
            command,
            reached: false,
            obstacle,
        }
    }

    fn enter_wall_follow(&mut self, pose: &Pose, distance: f64, side: WallSide) {
        log::info!(
            "Obstacle at ({:.2}, {:.2}), following wall on the {:?}",
            pose.x,
            pose.y,
            side
        );
        self.state = NavigationState::WallFollow;
        self.wall_side = Some(side);
        self.hit_point = Some(HitPoint {
            pose: *pose,
            distance_to_goal: distance,
        });
    }

    fn leave_wall_follow(&mut self, pose: &Pose) {
        log::info!("Back on the M-line at ({:.2}, {:.2})", pose.x, pose.y);
        self.state = NavigationState::GoToGoal;
        self.hit_point = None;
    }

    fn goal_command(&self, pose: &Pose, goal: &Point2D) -> WheelCommand {
        let (v, omega) = self.go_to_goal.compute_velocity(pose, goal);
        self.drive.wheel_speeds(v, omega)
    }

    fn wall_command(&self, side: WallSide, ranges: &Ranges) -> WheelCommand {
        let command = self
            .wall_follower
            .compute_wheels(side, ranges.side(side), ranges.front);
        self.drive.saturate(command)
    }

    /// Configure the navigator with parameters
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<(), ConfigError> {
        let mut next = self.config.clone();
        for (key, &value) in params {
            let field = match key.as_str() {
                "goal_tolerance" => &mut next.goal_tolerance,
                "obstacle_distance" => &mut next.obstacle_distance,
                "clearance_distance" => &mut next.clearance_distance,
                "mline_tolerance" => &mut next.mline_tolerance,
                "k_rho" => &mut next.k_rho,
                "k_alpha" => &mut next.k_alpha,
                "k_beta" => &mut next.k_beta,
                "wall_standoff" => &mut next.wall_standoff,
                "k_wall" => &mut next.k_wall,
                "wall_base_speed" => &mut next.wall_base_speed,
                "wall_turn_speed" => &mut next.wall_turn_speed,
                "front_min_distance" => &mut next.front_min_distance,
                "front_half_angle" => &mut next.front_half_angle,
                _ => return Err(ConfigError::invalid(key, "unknown navigation parameter")),
            };
            if !value.is_finite() {
                return Err(ConfigError::invalid(key, "must be finite"));
            }
            *field = value;
        }
        next.validate()?;

        self.go_to_goal = GoToGoalController::new(&next);
        self.wall_follower = WallFollowController::new(&next);
        self.config = next;
        Ok(())
    }
}
