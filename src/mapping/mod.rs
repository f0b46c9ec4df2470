//! Mapping module for Seeker robot
pub mod mapper;
pub mod occupancy_grid;
pub mod raycast;

use self::mapper::{MapUpdateStats, OccupancyGridMapper};
use self::occupancy_grid::OccupancyGrid;
use crate::common::types::Pose;
use crate::config::MappingConfig;
use crate::error::{ConfigError, CoreError};
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use crate::perception::sensors::RangeScan;
use std::collections::HashMap;
use std::sync::Arc;

/// Mapping stack for the robot
pub struct MappingStack {
    base: LifecycleNodeBase,
    mapper: OccupancyGridMapper,
}

impl MappingStack {
    /// Create a new mapping stack
    pub fn new(config: MappingConfig) -> Self {
        MappingStack {
            base: LifecycleNodeBase::new("mapping_stack"),
            mapper: OccupancyGridMapper::new(config),
        }
    }

    /// Fuse the scan for this tick, or only clear and decay when there is none
    pub fn update(&mut self, pose: &Pose, scan: Option<&RangeScan>) -> Option<MapUpdateStats> {
        match scan {
            Some(scan) => Some(self.mapper.update(pose, scan)),
            None => {
                self.mapper.idle_update(pose);
                None
            }
        }
    }

    pub fn grid(&self) -> &OccupancyGrid {
        self.mapper.grid()
    }

    pub fn snapshot(&self) -> Arc<OccupancyGrid> {
        self.mapper.snapshot()
    }

    pub fn probability_at(&self, x: f64, y: f64) -> f64 {
        self.mapper.probability_at(x, y)
    }

    /// Configure the mapper
    pub fn configure_mapper(&mut self, params: &HashMap<String, f64>) -> Result<(), ConfigError> {
        self.mapper.configure(params)
    }

    pub fn mapper(&self) -> &OccupancyGridMapper {
        &self.mapper
    }
}

impl LifecycleNode for MappingStack {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn state(&self) -> State {
        self.base.get_state()
    }

    fn on_configure(&mut self) -> Result<(), CoreError> {
        self.mapper.config().validate()?;
        let grid = self.mapper.grid();
        log::info!(
            "Configuring mapping stack: {}x{} cells at {} m",
            grid.width,
            grid.height,
            grid.resolution()
        );
        self.base.transition(State::Inactive)
    }

    fn on_activate(&mut self) -> Result<(), CoreError> {
        log::info!("Activating mapping stack");
        self.base.transition(State::Active)
    }

    fn on_deactivate(&mut self) -> Result<(), CoreError> {
        log::info!("Deactivating mapping stack");
        self.base.transition(State::Inactive)
    }

    fn on_cleanup(&mut self) -> Result<(), CoreError> {
        log::info!("Cleaning up mapping stack");
        self.mapper.reset();
        self.base.transition(State::Unconfigured)
    }

    fn on_shutdown(&mut self) -> Result<(), CoreError> {
        log::info!("Shutting down mapping stack");
        self.base.transition(State::Finalized)
    }
}
