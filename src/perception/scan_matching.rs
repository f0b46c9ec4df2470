//! Scan-to-map pose correction
//!
//! A small brute-force search around the odometry pose. Every candidate
//! offset re-projects a subsample of the scan's hits into the grid and is
//! scored by the mean occupancy probability of the cells it lands on.

use super::sensors::RangeScan;
use crate::common::math::wrap_angle;
use crate::common::types::Pose;
use crate::config::ScanMatchConfig;
use crate::mapping::occupancy_grid::OccupancyGrid;

/// Returns at or beyond this fraction of max range are not hits
const NO_HIT_FRACTION: f64 = 0.98;

/// A pose offset in the world frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoseOffset {
    pub dx: f64,
    pub dy: f64,
    pub dtheta: f64,
}

impl PoseOffset {
    pub fn translation(&self) -> f64 {
        self.dx.hypot(self.dy)
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0 && self.dtheta == 0.0
    }
}

/// Result of one matching attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    pub offset: PoseOffset,
    pub score: f64,
    pub accepted: bool,
}

#[derive(Debug)]
pub struct ScanMatcher {
    config: ScanMatchConfig,
    ticks: u64,
    last: Option<MatchOutcome>,
}

impl ScanMatcher {
    pub fn new(config: ScanMatchConfig) -> Self {
        ScanMatcher {
            config,
            ticks: 0,
            last: None,
        }
    }

    pub fn reset(&mut self) {
        self.ticks = 0;
        self.last = None;
    }

    pub fn last_outcome(&self) -> Option<MatchOutcome> {
        self.last
    }

    /// Count a tick and report whether matching should run on it.
    pub fn tick(&mut self, map: &OccupancyGrid) -> bool {
        self.ticks += 1;
        self.config.enabled
            && self.ticks % u64::from(self.config.interval) == 0
            && map.known_cell_count(self.config.known_log_odds) >= self.config.min_known_cells
    }

    /// Search the 27 neighbouring offsets of `pose` for the best map agreement.
    ///
    /// Candidates are visited from the smallest offset outward and only a
    /// strictly better score replaces the current best, so ties keep the
    /// smaller correction.
    pub fn match_scan(&mut self, pose: &Pose, scan: &RangeScan, map: &OccupancyGrid) -> MatchOutcome {
        let hits = self.sample_hits(scan);

        let mut best = MatchOutcome {
            offset: PoseOffset::default(),
            score: score(pose, &PoseOffset::default(), &hits, map),
            accepted: false,
        };
        for offset in self.candidates().into_iter().skip(1) {
            let candidate = score(pose, &offset, &hits, map);
            if candidate > best.score {
                best.offset = offset;
                best.score = candidate;
            }
        }

        best.accepted = best.score > self.config.min_score
            && best.offset.translation() < self.config.max_correction;
        log::debug!(
            "Scan match: offset ({:.3}, {:.3}, {:.3}) score {:.3} accepted {}",
            best.offset.dx,
            best.offset.dy,
            best.offset.dtheta,
            best.score,
            best.accepted
        );
        self.last = Some(best);
        best
    }

    /// Apply the blended share of an accepted offset.
    pub fn apply(&self, pose: &Pose, outcome: &MatchOutcome) -> Pose {
        if !outcome.accepted || outcome.offset.is_zero() {
            return *pose;
        }
        let blend = self.config.blend;
        Pose::new(
            pose.x + blend * outcome.offset.dx,
            pose.y + blend * outcome.offset.dy,
            pose.theta + blend * outcome.offset.dtheta,
        )
    }

    /// `(range, bearing)` of every `stride`-th beam that carries a hit
    fn sample_hits(&self, scan: &RangeScan) -> Vec<(f64, f64)> {
        let no_hit = NO_HIT_FRACTION * scan.max_range;
        scan.ranges
            .iter()
            .enumerate()
            .filter(|(_, &r)| r.is_finite() && r > scan.min_range && r < no_hit)
            .step_by(self.config.stride.max(1))
            .map(|(i, &r)| (r, scan.beam_angle(i)))
            .collect()
    }

    /// Zero offset first, then single-axis offsets, then combinations
    fn candidates(&self) -> Vec<PoseOffset> {
        let steps = [0.0, -1.0, 1.0];
        let mut offsets = Vec::with_capacity(27);
        for &sx in &steps {
            for &sy in &steps {
                for &st in &steps {
                    offsets.push(PoseOffset {
                        dx: sx * self.config.step_xy,
                        dy: sy * self.config.step_xy,
                        dtheta: st * self.config.step_theta,
                    });
                }
            }
        }
        offsets.sort_by_key(|o| {
            (o.dx != 0.0) as u8 + (o.dy != 0.0) as u8 + (o.dtheta != 0.0) as u8
        });
        offsets
    }
}

fn score(pose: &Pose, offset: &PoseOffset, hits: &[(f64, f64)], map: &OccupancyGrid) -> f64 {
    let candidate = Pose {
        x: pose.x + offset.dx,
        y: pose.y + offset.dy,
        theta: wrap_angle(pose.theta + offset.dtheta),
    };
    let mut total = 0.0;
    let mut count = 0usize;
    for &(range, bearing) in hits {
        let point = candidate.project(range, bearing);
        let coord = map.world_to_map(point.x, point.y);
        if map.in_bounds(coord) {
            total += map.probability(coord);
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
