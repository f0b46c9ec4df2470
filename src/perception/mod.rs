//! Perception module for Seeker robot
pub mod filters;
pub mod localization;
pub mod scan_matching;
pub mod sensors;

use self::localization::PoseEstimator;
use self::sensors::SensorFrame;
use crate::common::types::Pose;
use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use crate::mapping::occupancy_grid::OccupancyGrid;

/// Perception stack for the robot
pub struct PerceptionStack {
    base: LifecycleNodeBase,
    estimator: PoseEstimator,
}

impl PerceptionStack {
    /// Create a new perception stack
    pub fn new(config: &CoreConfig) -> Self {
        PerceptionStack {
            base: LifecycleNodeBase::new("perception_stack"),
            estimator: PoseEstimator::new(
                &config.robot,
                config.pose.clone(),
                config.slip.clone(),
                config.scan_match.clone(),
            ),
        }
    }

    /// Fold one sensor frame into the pose estimate
    pub fn update(&mut self, frame: &SensorFrame, map: Option<&OccupancyGrid>) -> Pose {
        self.estimator.update(
            frame.left_wheel,
            frame.right_wheel,
            frame.heading,
            frame.scan.as_ref(),
            map,
        )
    }

    /// Get the current pose estimate
    pub fn get_pose(&self) -> Pose {
        self.estimator.pose()
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.estimator.set_pose(pose);
    }

    pub fn estimator(&self) -> &PoseEstimator {
        &self.estimator
    }
}

impl LifecycleNode for PerceptionStack {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn state(&self) -> State {
        self.base.get_state()
    }

    fn on_configure(&mut self) -> Result<(), CoreError> {
        log::info!("Configuring perception stack");
        self.base.transition(State::Inactive)
    }

    fn on_activate(&mut self) -> Result<(), CoreError> {
        log::info!("Activating perception stack");
        self.base.transition(State::Active)
    }

    fn on_deactivate(&mut self) -> Result<(), CoreError> {
        log::info!("Deactivating perception stack");
        self.base.transition(State::Inactive)
    }

    fn on_cleanup(&mut self) -> Result<(), CoreError> {
        log::info!("Cleaning up perception stack");
        self.estimator.reset();
        self.base.transition(State::Unconfigured)
    }

    fn on_shutdown(&mut self) -> Result<(), CoreError> {
        log::info!("Shutting down perception stack");
        self.base.transition(State::Finalized)
    }
}
