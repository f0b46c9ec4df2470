//! Per-tick telemetry snapshot
//!
//! Built once per tick and shared as `Arc<TelemetrySnapshot>`. Readers never
//! see a partially updated tick.

use crate::common::types::{Point2D, Pose, WheelCommand};
use crate::control::WallSide;
use crate::mapping::occupancy_grid::OccupancyGrid;
use crate::navigation::bug2::NavigationState;
use serde::Serialize;
use std::sync::Arc;

/// Grid summary for monitors
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapSummary {
    pub width: usize,
    pub height: usize,
    pub resolution: f64,
    pub known_cells: usize,
    pub occupied_cells: usize,
}

impl MapSummary {
    pub fn from_grid(grid: &OccupancyGrid) -> Self {
        MapSummary {
            width: grid.width,
            height: grid.height,
            resolution: grid.resolution(),
            known_cells: grid.known_cell_count(0.5),
            occupied_cells: grid.occupied_cell_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub tick: u64,
    pub pose: Pose,
    /// Heading in degrees, for display
    pub theta_deg: f64,
    pub state: NavigationState,
    pub goal: Option<Point2D>,
    pub obstacle_detected: bool,
    pub command: WheelCommand,
    pub paused: bool,
    pub reached: bool,
    pub wall_side: Option<WallSide>,
    pub slip_active: bool,
    pub map: MapSummary,
    #[serde(skip)]
    pub grid: Arc<OccupancyGrid>,
}

impl TelemetrySnapshot {
    /// Snapshot before the first tick
    pub fn initial(grid: Arc<OccupancyGrid>) -> Self {
        TelemetrySnapshot {
            tick: 0,
            pose: Pose::origin(),
            theta_deg: 0.0,
            state: NavigationState::GoToGoal,
            goal: None,
            obstacle_detected: false,
            command: WheelCommand::stop(),
            paused: false,
            reached: false,
            wall_side: None,
            slip_active: false,
            map: MapSummary::from_grid(&grid),
            grid,
        }
    }

    /// Occupancy probability from the grid as of this tick
    pub fn probability_at(&self, x: f64, y: f64) -> f64 {
        self.grid.probability_at(x, y)
    }

    pub fn distance_to_goal(&self) -> Option<f64> {
        self.goal.map(|goal| self.pose.distance_to(&goal))
    }
}
