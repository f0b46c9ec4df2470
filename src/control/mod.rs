//! Control laws for Seeker robot
pub mod controllers;

pub use self::controllers::{DifferentialDrive, GoToGoalController, WallFollowController, WallSide};

use crate::common::types::WheelCommand;

/// Something that accepts wheel commands (robot driver or simulator)
pub trait Actuator {
    /// Get the actuator name
    fn name(&self) -> &str;

    /// Apply a wheel velocity command, rad/s
    fn apply(&mut self, command: WheelCommand);
}
