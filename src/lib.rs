pub mod command;
pub mod common;
pub mod config;
pub mod control;
pub mod error;
pub mod lifecycle;
pub mod mapping;
pub mod navigation;
pub mod perception;
pub mod sim;
pub mod telemetry;

use crate::command::{CommandHandle, CommandQueue, ControlCommand};
use crate::common::types::{Point2D, Pose, WheelCommand};
use crate::config::CoreConfig;
use crate::error::{ConfigError, CoreError};
use crate::lifecycle::LifecycleNode;
use crate::mapping::MappingStack;
use crate::navigation::NavigationStack;
use crate::perception::sensors::SensorFrame;
use crate::perception::PerceptionStack;
use crate::telemetry::{MapSummary, TelemetrySnapshot};
use std::collections::HashMap;
use std::sync::Arc;

/// What the host applies after a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    pub command: WheelCommand,
    pub pose: Pose,
    pub reached: bool,
    pub obstacle: bool,
}

impl TickOutput {
    fn idle(pose: Pose) -> Self {
        TickOutput {
            command: WheelCommand::stop(),
            pose,
            reached: false,
            obstacle: false,
        }
    }
}

/// Core functionality for the Seeker robot
pub struct SeekerCore {
    config: CoreConfig,
    perception: PerceptionStack,
    mapping: MappingStack,
    navigation: NavigationStack,
    commands: CommandQueue,
    telemetry: Arc<TelemetrySnapshot>,
    tick: u64,
    paused: bool,
}

impl SeekerCore {
    /// Create a new core from a validated configuration
    pub fn new(config: CoreConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let mapping = MappingStack::new(config.mapping.clone());
        let telemetry = Arc::new(TelemetrySnapshot::initial(mapping.snapshot()));
        Ok(SeekerCore {
            perception: PerceptionStack::new(&config),
            navigation: NavigationStack::new(config.navigation.clone(), &config.robot),
            mapping,
            commands: CommandQueue::new(),
            telemetry,
            tick: 0,
            paused: false,
            config,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    fn nodes_mut(&mut self) -> [&mut dyn LifecycleNode; 3] {
        [&mut self.perception, &mut self.mapping, &mut self.navigation]
    }

    /// Configure and activate every stack
    pub fn init(&mut self) -> Result<(), CoreError> {
        for node in self.nodes_mut() {
            node.on_configure()?;
            node.on_activate()?;
        }
        log::info!("Seeker core active");
        Ok(())
    }

    /// Deactivate, clean up and finalize every stack, in reverse order
    pub fn shutdown(&mut self) -> Result<(), CoreError> {
        for node in self.nodes_mut().into_iter().rev() {
            node.on_deactivate()?;
            node.on_cleanup()?;
            node.on_shutdown()?;
        }
        log::info!("Seeker core shut down after {} ticks", self.tick);
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.perception.is_active() && self.mapping.is_active() && self.navigation.is_active()
    }

    /// Handle for sending goals and pause/resume from elsewhere
    pub fn command_handle(&self) -> CommandHandle {
        self.commands.handle()
    }

    /// Set the goal immediately (same as queueing `SetGoal` before a tick)
    pub fn set_goal(&mut self, x: f64, y: f64) -> Result<(), CoreError> {
        let pose = self.perception.get_pose();
        self.navigation.set_goal(Point2D::new(x, y), &pose)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pose(&self) -> Pose {
        self.perception.get_pose()
    }

    /// Place the robot, e.g. at a known start pose before the first tick
    pub fn set_pose(&mut self, pose: Pose) {
        self.perception.set_pose(pose);
    }

    pub fn mapping(&self) -> &MappingStack {
        &self.mapping
    }

    pub fn navigation(&self) -> &NavigationStack {
        &self.navigation
    }

    pub fn perception(&self) -> &PerceptionStack {
        &self.perception
    }

    /// Latest published snapshot
    pub fn telemetry(&self) -> Arc<TelemetrySnapshot> {
        Arc::clone(&self.telemetry)
    }

    pub fn configure_mapper(&mut self, params: &HashMap<String, f64>) -> Result<(), ConfigError> {
        self.mapping.configure_mapper(params)
    }

    pub fn configure_navigator(&mut self, params: &HashMap<String, f64>) -> Result<(), ConfigError> {
        self.navigation.configure_navigator(params)
    }

    fn apply_commands(&mut self) {
        for command in self.commands.drain() {
            match command {
                ControlCommand::SetGoal(goal) => {
                    let pose = self.perception.get_pose();
                    if let Err(e) = self.navigation.set_goal(goal, &pose) {
                        log::warn!("Ignoring goal: {}", e);
                    }
                }
                ControlCommand::Pause => {
                    if !self.paused {
                        log::info!("Paused at tick {}", self.tick);
                    }
                    self.paused = true;
                }
                ControlCommand::Resume => {
                    if self.paused {
                        log::info!("Resumed at tick {}", self.tick);
                    }
                    self.paused = false;
                }
            }
        }
    }

    /// Run one control cycle and return the wheel command to apply
    pub fn tick(&mut self, frame: &SensorFrame) -> TickOutput {
        if !self.is_active() {
            log::debug!("Tick before activation, holding still");
            return TickOutput::idle(self.perception.get_pose());
        }
        self.tick += 1;
        self.apply_commands();

        // Matching reads last tick's grid
        let pose = {
            let previous = self.mapping.snapshot();
            self.perception.update(frame, Some(previous.as_ref()))
        };
        self.mapping.update(&pose, frame.scan.as_ref());

        let output = if self.paused {
            TickOutput::idle(pose)
        } else {
            match self.navigation.step(&pose, frame.scan.as_ref()) {
                Some(step) => TickOutput {
                    command: step.command,
                    pose,
                    reached: step.reached,
                    obstacle: step.obstacle,
                },
                None => TickOutput::idle(pose),
            }
        };

        self.publish(&output);
        output
    }

    fn publish(&mut self, output: &TickOutput) {
        let grid = self.mapping.snapshot();
        self.telemetry = Arc::new(TelemetrySnapshot {
            tick: self.tick,
            pose: output.pose,
            theta_deg: output.pose.theta.to_degrees(),
            state: self.navigation.state(),
            goal: self.navigation.goal(),
            obstacle_detected: output.obstacle,
            command: output.command,
            paused: self.paused,
            reached: output.reached,
            wall_side: self.navigation.wall_side(),
            slip_active: self.perception.estimator().slip_active(),
            map: MapSummary::from_grid(&grid),
            grid,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::bug2::NavigationState;
    use crate::perception::sensors::RangeScan;
    use std::f64::consts::TAU;

    fn frame(wheel: f64) -> SensorFrame {
        SensorFrame {
            left_wheel: wheel,
            right_wheel: wheel,
            heading: None,
            scan: Some(RangeScan::uniform(360, TAU, 0.12, 3.5, 3.5)),
        }
    }

    fn active_core() -> SeekerCore {
        let mut core = SeekerCore::new(CoreConfig::default()).unwrap();
        core.init().unwrap();
        core
    }

    #[test]
    fn inactive_core_holds_still() {
        let mut core = SeekerCore::new(CoreConfig::default()).unwrap();
        core.set_goal(1.0, 0.0).unwrap();
        let out = core.tick(&frame(0.0));
        assert!(out.command.is_stopped());
        assert_eq!(core.telemetry().tick, 0);
    }

    #[test]
    fn no_goal_means_no_motion() {
        let mut core = active_core();
        let out = core.tick(&frame(0.0));
        assert!(out.command.is_stopped());
        assert_eq!(core.telemetry().tick, 1);
    }

    #[test]
    fn queued_goal_applies_on_next_tick() {
        let mut core = active_core();
        let handle = core.command_handle();
        handle.set_goal(2.0, 0.0);
        let out = core.tick(&frame(0.0));
        assert!(out.command.left > 0.0);
        assert_eq!(core.telemetry().goal, Some(Point2D::new(2.0, 0.0)));
    }

    #[test]
    fn pause_zeroes_command_but_keeps_tracking() {
        let mut core = active_core();
        let handle = core.command_handle();
        handle.set_goal(2.0, 0.0);
        core.tick(&frame(0.0));

        handle.pause();
        let out = core.tick(&frame(3.0));
        assert!(out.command.is_stopped());
        assert!(out.pose.x > 0.0);
        assert!(core.telemetry().paused);

        handle.resume();
        let out = core.tick(&frame(3.0));
        assert!(!out.command.is_stopped());
        assert!(!core.telemetry().paused);
    }

    #[test]
    fn invalid_goal_is_rejected() {
        let mut core = active_core();
        assert!(matches!(
            core.set_goal(f64::NAN, 0.0),
            Err(CoreError::InvalidGoal { .. })
        ));
        let handle = core.command_handle();
        handle.set_goal(f64::INFINITY, 0.0);
        core.tick(&frame(0.0));
        assert_eq!(core.telemetry().goal, None);
    }

    #[test]
    fn resending_goal_keeps_wall_follow() {
        let mut core = active_core();
        core.set_goal(3.0, 0.0).unwrap();
        let mut blocked = frame(0.0);
        if let Some(scan) = blocked.scan.as_mut() {
            // Bearing 0 at 0.2 m
            scan.ranges[180] = 0.2;
        }
        core.tick(&blocked);
        assert_eq!(core.navigation().state(), NavigationState::WallFollow);
        let hit = core.navigation().navigator().hit_point();
        assert!(hit.is_some());

        core.command_handle().set_goal(3.0, 0.0);
        core.tick(&blocked);
        assert_eq!(core.navigation().state(), NavigationState::WallFollow);
        assert_eq!(core.navigation().navigator().hit_point(), hit);
    }

    #[test]
    fn shutdown_reverses_init() {
        let mut core = active_core();
        assert!(core.is_active());
        core.shutdown().unwrap();
        assert!(!core.is_active());
        assert!(core
            .nodes_mut()
            .iter()
            .all(|node| node.state() == crate::lifecycle::State::Finalized));
        assert!(core.shutdown().is_err());
        assert!(core.init().is_err());
    }

    #[test]
    fn telemetry_snapshot_is_stable() {
        let mut core = active_core();
        core.set_goal(2.0, 0.0).unwrap();
        core.tick(&frame(0.0));
        let held = core.telemetry();
        core.tick(&frame(1.0));
        assert_eq!(held.tick, 1);
        assert_eq!(core.telemetry().tick, 2);
    }
}
