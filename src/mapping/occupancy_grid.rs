//! Occupancy grid storage
//!
//! Fixed-size square grid centred on the world origin. Each cell carries a
//! clamped log-odds belief and a saturating hit counter; a cell only counts as
//! occupied once enough hits confirm it.

use super::raycast::GridCoord;
use crate::common::math::logistic;
use crate::config::MappingConfig;

/// Values used when exporting the grid as bytes
pub mod occupancy_values {
    pub const FREE: u8 = 0;
    pub const OCCUPIED: u8 = 100;
    pub const UNKNOWN: u8 = 255;
}

/// Log-odds magnitude below which a cell is reported as unknown
const UNKNOWN_EPSILON: f32 = 1e-3;

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cell {
    pub log_odds: f32,
    pub hits: u16,
}

/// A bounded log-odds occupancy grid
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    pub width: usize,
    pub height: usize,
    pub cells_per_meter: f64,
    log_odds_min: f32,
    log_odds_max: f32,
    confirm_threshold: u16,
    occupied_log_odds: f32,
    cells: Vec<Cell>,
}

impl OccupancyGrid {
    /// Create an empty (all unknown) grid
    pub fn new(config: &MappingConfig) -> Self {
        let size = (config.size_m * config.cells_per_meter).round().max(1.0) as usize;
        OccupancyGrid {
            width: size,
            height: size,
            cells_per_meter: config.cells_per_meter,
            log_odds_min: config.log_odds_min as f32,
            log_odds_max: config.log_odds_max as f32,
            confirm_threshold: config.confirm_threshold,
            occupied_log_odds: config.occupied_log_odds as f32,
            cells: vec![Cell::default(); size * size],
        }
    }

    pub fn resolution(&self) -> f64 {
        1.0 / self.cells_per_meter
    }

    pub fn log_odds_bounds(&self) -> (f32, f32) {
        (self.log_odds_min, self.log_odds_max)
    }

    /// Convert world coordinates to map coordinates. The result may be out of bounds.
    pub fn world_to_map(&self, x: f64, y: f64) -> GridCoord {
        GridCoord::new(
            (x * self.cells_per_meter).round() as i64 + (self.width / 2) as i64,
            (y * self.cells_per_meter).round() as i64 + (self.height / 2) as i64,
        )
    }

    /// Convert map coordinates to world coordinates (cell centre)
    pub fn map_to_world(&self, coord: GridCoord) -> (f64, f64) {
        (
            (coord.x - (self.width / 2) as i64) as f64 / self.cells_per_meter,
            (coord.y - (self.height / 2) as i64) as f64 / self.cells_per_meter,
        )
    }

    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.y as usize * self.width + coord.x as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, coord: GridCoord) -> Option<&Cell> {
        self.index(coord).map(|i| &self.cells[i])
    }

    pub fn cell_at(&self, x: f64, y: f64) -> Option<&Cell> {
        self.cell(self.world_to_map(x, y))
    }

    /// Log-odds at a world position; 0 (unknown) outside the grid
    pub fn log_odds_at(&self, x: f64, y: f64) -> f64 {
        self.cell_at(x, y).map_or(0.0, |c| f64::from(c.log_odds))
    }

    /// Occupancy probability at a world position; 0.5 when unknown or outside the grid
    pub fn probability_at(&self, x: f64, y: f64) -> f64 {
        logistic(self.log_odds_at(x, y))
    }

    /// Probability of a map cell; 0.5 outside the grid
    pub fn probability(&self, coord: GridCoord) -> f64 {
        self.cell(coord)
            .map_or(0.5, |c| logistic(f64::from(c.log_odds)))
    }

    /// Confirmed by enough hits and above the occupied threshold
    pub fn is_occupied(&self, x: f64, y: f64) -> bool {
        self.cell_at(x, y).map_or(false, |c| self.cell_occupied(c))
    }

    fn cell_occupied(&self, cell: &Cell) -> bool {
        cell.hits >= self.confirm_threshold && cell.log_odds > self.occupied_log_odds
    }

    /// Add to a cell's log-odds, clamped. Returns false outside the grid.
    pub fn add_log_odds(&mut self, coord: GridCoord, delta: f64) -> bool {
        let (lo, hi) = (self.log_odds_min, self.log_odds_max);
        match self.index(coord) {
            Some(i) => {
                let cell = &mut self.cells[i];
                cell.log_odds = (cell.log_odds + delta as f32).clamp(lo, hi);
                true
            }
            None => false,
        }
    }

    /// Count one more hit on a cell. Returns the new count.
    pub fn record_hit(&mut self, coord: GridCoord) -> Option<u16> {
        self.index(coord).map(|i| {
            let cell = &mut self.cells[i];
            cell.hits = cell.hits.saturating_add(1);
            cell.hits
        })
    }

    /// Rescale every cell's log-odds by `factor(log_odds)`, keeping the clamp bounds
    pub fn scale_log_odds<F>(&mut self, factor: F)
    where
        F: Fn(f32) -> f32,
    {
        let (lo, hi) = (self.log_odds_min, self.log_odds_max);
        for cell in &mut self.cells {
            cell.log_odds = (cell.log_odds * factor(cell.log_odds)).clamp(lo, hi);
        }
    }

    /// Cells whose |log-odds| reaches `min_abs`
    pub fn known_cell_count(&self, min_abs: f64) -> usize {
        let min_abs = min_abs as f32;
        self.cells
            .iter()
            .filter(|c| c.log_odds.abs() >= min_abs)
            .count()
    }

    pub fn occupied_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| self.cell_occupied(c)).count()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Row-major export: 0..100 occupancy percentage, 255 unknown
    pub fn occupancy_bytes(&self) -> Vec<u8> {
        self.cells
            .iter()
            .map(|c| {
                if c.log_odds.abs() < UNKNOWN_EPSILON {
                    occupancy_values::UNKNOWN
                } else {
                    let p = logistic(f64::from(c.log_odds));
                    (p * f64::from(occupancy_values::OCCUPIED)).round() as u8
                }
            })
            .collect()
    }
}
