//! Closed-loop simulation harness
//!
//! Runs [`SeekerCore`](crate::SeekerCore) against a simulated robot at a
//! fixed control period.

pub mod robot;
pub mod world;

pub use self::robot::SimRobot;
pub use self::world::{Rect, World};

use crate::control::Actuator;
use crate::perception::sensors::SensorSource;
use crate::{SeekerCore, TickOutput};

/// Default control period, seconds
pub const DEFAULT_DT: f64 = 0.032;

pub struct Simulation {
    core: SeekerCore,
    robot: SimRobot,
    dt: f64,
    ticks: u64,
}

impl Simulation {
    pub fn new(core: SeekerCore, robot: SimRobot, dt: f64) -> Self {
        Simulation {
            core,
            robot,
            dt,
            ticks: 0,
        }
    }

    pub fn core(&self) -> &SeekerCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut SeekerCore {
        &mut self.core
    }

    pub fn robot(&self) -> &SimRobot {
        &self.robot
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn elapsed(&self) -> f64 {
        self.ticks as f64 * self.dt
    }

    /// Sense, decide, act, then move the world forward by one period
    pub fn step(&mut self) -> TickOutput {
        let frame = self.robot.read();
        let output = self.core.tick(&frame);
        self.robot.apply(output.command);
        self.robot.advance(self.dt);
        self.ticks += 1;
        output
    }
}
