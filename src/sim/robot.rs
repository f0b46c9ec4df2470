//! Simulated differential-drive robot
//!
//! Integrates wheel commands with exact arc kinematics, accumulates encoder
//! angles and ray-casts a planar scan against the world. When a step would
//! end inside an obstacle the body stays put while the encoders still turn,
//! which is what a slipping wheel looks like to odometry.

use super::world::World;
use crate::common::math::wrap_angle;
use crate::common::types::{Pose, WheelCommand};
use crate::config::{LidarConfig, RobotConfig};
use crate::control::{Actuator, DifferentialDrive};
use crate::perception::sensors::{RangeScan, SensorFrame, SensorSource};

#[derive(Debug, Clone)]
pub struct SimRobot {
    world: World,
    drive: DifferentialDrive,
    lidar: LidarConfig,
    pose: Pose,
    left_angle: f64,
    right_angle: f64,
    command: WheelCommand,
    compass: bool,
    collisions: u64,
}

impl SimRobot {
    pub fn new(world: World, robot: RobotConfig, lidar: LidarConfig, start: Pose) -> Self {
        SimRobot {
            world,
            drive: DifferentialDrive::new(&robot),
            lidar,
            pose: start,
            left_angle: 0.0,
            right_angle: 0.0,
            command: WheelCommand::stop(),
            compass: false,
            collisions: 0,
        }
    }

    /// Report the true heading with every frame
    pub fn with_compass(mut self, enabled: bool) -> Self {
        self.compass = enabled;
        self
    }

    /// Ground-truth pose
    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    pub fn command(&self) -> WheelCommand {
        self.command
    }

    /// Ray-cast a scan from the current pose
    pub fn scan(&self) -> RangeScan {
        let mut scan = RangeScan::uniform(
            self.lidar.beams,
            self.lidar.fov,
            self.lidar.min_range,
            self.lidar.max_range,
            f64::INFINITY,
        );
        for i in 0..scan.len() {
            let angle = self.pose.theta + scan.beam_angle(i);
            if let Some(d) = self
                .world
                .ray_cast(self.pose.x, self.pose.y, angle, self.lidar.max_range)
            {
                scan.ranges[i] = d.max(self.lidar.min_range);
            }
        }
        scan
    }

    /// Advance the simulation by `dt` seconds under the last applied command
    pub fn advance(&mut self, dt: f64) {
        let limit = self.drive.max_wheel_speed();
        let wheels = WheelCommand::new(
            self.command.left.clamp(-limit, limit),
            self.command.right.clamp(-limit, limit),
        );

        self.left_angle += wheels.left * dt;
        self.right_angle += wheels.right * dt;

        let (v, omega) = self.drive.body_velocity(&wheels);

        let theta = self.pose.theta;
        let new_theta = theta + omega * dt;
        let (x, y) = if omega.abs() < 1e-9 {
            (
                self.pose.x + v * theta.cos() * dt,
                self.pose.y + v * theta.sin() * dt,
            )
        } else {
            let radius = v / omega;
            (
                self.pose.x + radius * (new_theta.sin() - theta.sin()),
                self.pose.y + radius * (theta.cos() - new_theta.cos()),
            )
        };

        if self.world.is_occupied(x, y) {
            self.collisions += 1;
            log::debug!("Sim robot blocked at ({:.3}, {:.3})", self.pose.x, self.pose.y);
            return;
        }
        self.pose = Pose {
            x,
            y,
            theta: wrap_angle(new_theta),
        };
    }
}

impl SensorSource for SimRobot {
    fn name(&self) -> &str {
        "sim_robot"
    }

    fn read(&mut self) -> SensorFrame {
        SensorFrame {
            left_wheel: self.left_angle,
            right_wheel: self.right_angle,
            heading: if self.compass { Some(self.pose.theta) } else { None },
            scan: Some(self.scan()),
        }
    }
}

impl Actuator for SimRobot {
    fn name(&self) -> &str {
        "sim_robot"
    }

    fn apply(&mut self, command: WheelCommand) {
        self.command = command;
    }
}
