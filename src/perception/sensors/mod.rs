//! Sensor interfaces for the Seeker robot

use crate::common::math::angle_diff;
use std::f64::consts::{PI, TAU};

/// A source of per-tick sensor readings (robot driver or simulator)
pub trait SensorSource {
    /// Get the sensor name
    fn name(&self) -> &str;

    /// Sample every sensor for the current tick
    fn read(&mut self) -> SensorFrame;
}

/// Everything the core consumes in one tick
#[derive(Debug, Clone, Default)]
pub struct SensorFrame {
    /// Cumulative left wheel encoder angle, radians
    pub left_wheel: f64,
    /// Cumulative right wheel encoder angle, radians
    pub right_wheel: f64,
    /// Absolute heading, radians. `None` or NaN when unavailable.
    pub heading: Option<f64>,
    pub scan: Option<RangeScan>,
}

/// One planar range scan.
///
/// Beams are ordered counter-clockwise. A partial scan spans
/// `[-fov/2, fov/2]` with both ends sampled; a full circle starts at `-pi`
/// and does not repeat the last beam.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeScan {
    pub ranges: Vec<f64>,
    pub fov: f64,
    pub min_range: f64,
    pub max_range: f64,
}

impl RangeScan {
    pub fn new(ranges: Vec<f64>, fov: f64, min_range: f64, max_range: f64) -> Self {
        RangeScan {
            ranges,
            fov,
            min_range,
            max_range,
        }
    }

    /// A scan where every beam reads `range`.
    pub fn uniform(beams: usize, fov: f64, min_range: f64, max_range: f64, range: f64) -> Self {
        RangeScan::new(vec![range; beams], fov, min_range, max_range)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn is_full_circle(&self) -> bool {
        self.fov >= TAU - 1e-9
    }

    /// Bearing of beam `index` in the robot frame.
    pub fn beam_angle(&self, index: usize) -> f64 {
        let n = self.ranges.len();
        if n < 2 {
            return 0.0;
        }
        if self.is_full_circle() {
            -PI + index as f64 * TAU / n as f64
        } else {
            -self.fov / 2.0 + index as f64 * self.fov / (n - 1) as f64
        }
    }

    /// Reading clipped to the sensor range; non-finite readings become max range.
    pub fn effective_range(&self, raw: f64) -> f64 {
        if raw.is_finite() {
            raw.clamp(self.min_range, self.max_range)
        } else {
            self.max_range
        }
    }

    /// Iterate `(bearing, effective range)` pairs.
    pub fn beams(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.ranges
            .iter()
            .enumerate()
            .map(move |(i, &r)| (self.beam_angle(i), self.effective_range(r)))
    }

    /// Minimum range over beams within `half_width` of `center`.
    ///
    /// An empty sector reads as max range.
    pub fn min_in_sector(&self, center: f64, half_width: f64) -> f64 {
        self.beams()
            .filter(|(angle, _)| angle_diff(center, *angle).abs() <= half_width + 1e-9)
            .map(|(_, range)| range)
            .fold(self.max_range, f64::min)
    }

    /// Half width of a sector spanning a third of the field of view.
    pub fn third_half_width(&self) -> f64 {
        self.fov / 6.0
    }

    /// Minimum over the forward third of the scan.
    pub fn forward_min(&self) -> f64 {
        self.min_in_sector(0.0, self.third_half_width())
    }

    /// Minimum over the left half (positive bearings).
    pub fn left_min(&self) -> f64 {
        self.min_in_sector(self.fov / 4.0, self.fov / 4.0)
    }

    /// Minimum over the right half (negative bearings).
    pub fn right_min(&self) -> f64 {
        self.min_in_sector(-self.fov / 4.0, self.fov / 4.0)
    }
}
