//! Range-scan fusion into the occupancy grid

use super::occupancy_grid::OccupancyGrid;
use super::raycast::{BresenhamLine, GridCoord};
use crate::common::types::Pose;
use crate::config::MappingConfig;
use crate::error::ConfigError;
use crate::perception::sensors::RangeScan;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-update bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapUpdateStats {
    pub beams_used: usize,
    pub beams_discarded: usize,
    pub cells_freed: usize,
    pub hits_recorded: usize,
    pub hits_confirmed: usize,
}

/// Owns the grid and fuses range beams into it.
///
/// The grid sits behind an `Arc`. Readers hold immutable snapshots; the next
/// update clones the grid only if a snapshot is still alive.
#[derive(Debug)]
pub struct OccupancyGridMapper {
    config: MappingConfig,
    grid: Arc<OccupancyGrid>,
    updates: u64,
}

impl OccupancyGridMapper {
    pub fn new(config: MappingConfig) -> Self {
        let grid = Arc::new(OccupancyGrid::new(&config));
        OccupancyGridMapper {
            config,
            grid,
            updates: 0,
        }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Immutable view of the grid as of the last update
    pub fn snapshot(&self) -> Arc<OccupancyGrid> {
        Arc::clone(&self.grid)
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn probability_at(&self, x: f64, y: f64) -> f64 {
        self.grid.probability_at(x, y)
    }

    /// Drop all map evidence
    pub fn reset(&mut self) {
        self.grid = Arc::new(OccupancyGrid::new(&self.config));
        self.updates = 0;
    }

    /// Fuse one scan taken at `pose`, then age the whole grid.
    pub fn update(&mut self, pose: &Pose, scan: &RangeScan) -> MapUpdateStats {
        let mut stats = MapUpdateStats::default();
        let config = &self.config;
        let grid = Arc::make_mut(&mut self.grid);

        clear_footprint(grid, config, pose);

        let robot_cell = grid.world_to_map(pose.x, pose.y);
        let robot_inside = grid.in_bounds(robot_cell);
        let no_hit_range = config.no_hit_fraction * scan.max_range;

        for (i, &raw) in scan.ranges.iter().enumerate() {
            if !raw.is_finite() {
                continue;
            }
            let range = raw.clamp(scan.min_range, scan.max_range);
            if range <= config.min_valid_range || range >= no_hit_range {
                continue;
            }

            let hit = pose.project(range, scan.beam_angle(i));
            let hit_cell = grid.world_to_map(hit.x, hit.y);
            if !robot_inside || !grid.in_bounds(hit_cell) {
                stats.beams_discarded += 1;
                continue;
            }

            integrate_beam(grid, config, robot_cell, hit_cell, &mut stats);
            stats.beams_used += 1;
        }

        decay(grid, config);
        self.updates += 1;

        if stats.beams_discarded > 0 {
            log::debug!(
                "Map update {}: {} beams fused, {} outside the grid",
                self.updates,
                stats.beams_used,
                stats.beams_discarded
            );
        }
        stats
    }

    /// Update for a tick without range data: footprint clearing and decay only.
    pub fn idle_update(&mut self, pose: &Pose) {
        let grid = Arc::make_mut(&mut self.grid);
        clear_footprint(grid, &self.config, pose);
        decay(grid, &self.config);
        self.updates += 1;
    }

    /// Apply decay alone
    pub fn decay(&mut self) {
        decay(Arc::make_mut(&mut self.grid), &self.config);
    }

    /// Configure the mapper with parameters
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<(), ConfigError> {
        let mut next = self.config.clone();
        let mut resize = false;

        if let Some(&size_m) = params.get("size_m") {
            next.size_m = size_m;
            resize = true;
        }
        if let Some(&cells_per_meter) = params.get("cells_per_meter") {
            next.cells_per_meter = cells_per_meter;
            resize = true;
        }
        if let Some(&free) = params.get("log_odds_free") {
            next.log_odds_free = free;
        }
        if let Some(&occupied) = params.get("log_odds_occupied") {
            next.log_odds_occupied = occupied;
        }
        if let Some(&threshold) = params.get("confirm_threshold") {
            if threshold < 1.0 || threshold > f64::from(u16::MAX) {
                return Err(ConfigError::invalid(
                    "confirm_threshold",
                    "must be between 1 and 65535",
                ));
            }
            next.confirm_threshold = threshold.round() as u16;
            resize = true;
        }
        if let Some(&decay) = params.get("decay") {
            next.decay = decay;
        }
        if let Some(&strong) = params.get("strong_occupied") {
            next.strong_occupied = strong;
        }
        if let Some(&radius) = params.get("footprint_radius") {
            if radius < 0.0 {
                return Err(ConfigError::invalid(
                    "footprint_radius",
                    "must be non-negative",
                ));
            }
            next.footprint_radius = radius;
        }

        next.validate()?;
        self.config = next;
        if resize {
            log::warn!("Grid geometry or confirmation changed, clearing the map");
            self.reset();
        }
        Ok(())
    }
}

/// Free every cell on the ray before the hit cell, then count the hit.
fn integrate_beam(
    grid: &mut OccupancyGrid,
    config: &MappingConfig,
    from: GridCoord,
    hit_cell: GridCoord,
    stats: &mut MapUpdateStats,
) {
    let strong = config.strong_occupied as f32;

    for coord in BresenhamLine::new(from, hit_cell) {
        if coord == hit_cell {
            break;
        }
        let skip = grid.cell(coord).map_or(true, |c| c.log_odds >= strong);
        if !skip && grid.add_log_odds(coord, config.log_odds_free) {
            stats.cells_freed += 1;
        }
    }

    if let Some(hits) = grid.record_hit(hit_cell) {
        stats.hits_recorded += 1;
        if hits >= config.confirm_threshold {
            grid.add_log_odds(hit_cell, config.log_odds_occupied);
            stats.hits_confirmed += 1;
        }
    }
}

/// Nudge the cells under the robot toward free.
fn clear_footprint(grid: &mut OccupancyGrid, config: &MappingConfig, pose: &Pose) {
    if config.footprint_radius <= 0.0 || config.footprint_free == 0.0 {
        return;
    }
    let strong = config.strong_occupied as f32;
    let centre = grid.world_to_map(pose.x, pose.y);
    let reach = (config.footprint_radius * grid.cells_per_meter).ceil() as i64;

    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let coord = GridCoord::new(centre.x + dx, centre.y + dy);
            let (cx, cy) = grid.map_to_world(coord);
            if (cx - pose.x).hypot(cy - pose.y) > config.footprint_radius {
                continue;
            }
            let strongly_occupied = grid.cell(coord).map_or(true, |c| c.log_odds >= strong);
            if !strongly_occupied {
                grid.add_log_odds(coord, config.footprint_free);
            }
        }
    }
}

/// Exponential decay; weak and medium occupied evidence fades faster.
fn decay(grid: &mut OccupancyGrid, config: &MappingConfig) {
    let base = config.decay as f32;
    let weak = base * config.weak_decay as f32;
    let medium = base * config.medium_decay as f32;
    let weak_band = config.weak_band as f32;
    let strong = config.strong_occupied as f32;

    grid.scale_log_odds(|l| {
        if l > 0.0 && l < weak_band {
            weak
        } else if l >= weak_band && l < strong {
            medium
        } else {
            base
        }
    });
}
