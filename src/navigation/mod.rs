//! Navigation module for Seeker robot
pub mod bug2;
pub mod mline;

use self::bug2::{BugNavigator, NavigationState, StepOutput};
use crate::common::types::{Point2D, Pose};
use crate::config::{NavigationConfig, RobotConfig};
use crate::control::WallSide;
use crate::error::{ConfigError, CoreError};
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use crate::perception::sensors::RangeScan;
use std::collections::HashMap;

/// Navigation stack for the robot
pub struct NavigationStack {
    base: LifecycleNodeBase,
    navigator: BugNavigator,
    goal: Option<Point2D>,
}

impl NavigationStack {
    /// Create a new navigation stack
    pub fn new(config: NavigationConfig, robot: &RobotConfig) -> Self {
        NavigationStack {
            base: LifecycleNodeBase::new("navigation_stack"),
            navigator: BugNavigator::new(config, robot),
            goal: None,
        }
    }

    /// Set the goal navigation runs toward
    pub fn set_goal(&mut self, goal: Point2D, pose: &Pose) -> Result<(), CoreError> {
        self.navigator.set_goal(goal, pose)?;
        self.goal = Some(goal);
        Ok(())
    }

    pub fn goal(&self) -> Option<Point2D> {
        self.goal
    }

    /// Run one navigation step; `None` until a goal has been set
    pub fn step(&mut self, pose: &Pose, scan: Option<&RangeScan>) -> Option<StepOutput> {
        let goal = self.goal?;
        Some(self.navigator.step(pose, scan, goal))
    }

    pub fn state(&self) -> NavigationState {
        self.navigator.state()
    }

    pub fn wall_side(&self) -> Option<WallSide> {
        self.navigator.wall_side()
    }

    pub fn navigator(&self) -> &BugNavigator {
        &self.navigator
    }

    /// Configure the navigator
    pub fn configure_navigator(&mut self, params: &HashMap<String, f64>) -> Result<(), ConfigError> {
        self.navigator.configure(params)
    }
}

impl LifecycleNode for NavigationStack {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn state(&self) -> State {
        self.base.get_state()
    }

    fn on_configure(&mut self) -> Result<(), CoreError> {
        self.navigator.config().validate()?;
        log::info!("Configuring navigation stack");
        self.base.transition(State::Inactive)
    }

    fn on_activate(&mut self) -> Result<(), CoreError> {
        log::info!("Activating navigation stack");
        self.base.transition(State::Active)
    }

    fn on_deactivate(&mut self) -> Result<(), CoreError> {
        log::info!("Deactivating navigation stack");
        self.base.transition(State::Inactive)
    }

    fn on_cleanup(&mut self) -> Result<(), CoreError> {
        log::info!("Cleaning up navigation stack");
        self.goal = None;
        self.navigator.reset();
        self.base.transition(State::Unconfigured)
    }

    fn on_shutdown(&mut self) -> Result<(), CoreError> {
        log::info!("Shutting down navigation stack");
        self.base.transition(State::Finalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_forgets_goal() {
        let mut stack = NavigationStack::new(NavigationConfig::default(), &RobotConfig::default());
        stack.on_configure().unwrap();
        stack.set_goal(Point2D::new(2.0, 0.0), &Pose::origin()).unwrap();
        assert!(stack.step(&Pose::origin(), None).is_some());

        stack.on_cleanup().unwrap();
        assert_eq!(stack.goal(), None);
        assert_eq!(stack.navigator().goal(), None);
        assert!(stack.navigator().mline().is_none());
        assert!(stack.step(&Pose::origin(), None).is_none());
    }
}
