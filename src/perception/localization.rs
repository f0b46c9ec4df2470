//! Pose estimation from wheel odometry
//!
//! Dead reckoning with midpoint integration, an optional absolute heading
//! override, a wheel-slip guard and a periodic scan-to-map correction.

use super::filters::SlipGuard;
use super::scan_matching::ScanMatcher;
use super::sensors::RangeScan;
use crate::common::math::wrap_angle;
use crate::common::types::Pose;
use crate::config::{PoseConfig, RobotConfig, ScanMatchConfig, SlipConfig};
use crate::mapping::occupancy_grid::OccupancyGrid;

/// Encoder bookkeeping for one wheel
#[derive(Debug, Clone, Copy, Default)]
pub struct WheelState {
    previous: Option<f64>,
}

impl WheelState {
    /// Angular displacement since the last finite reading.
    ///
    /// The first reading only seeds the state. Non-finite readings give zero
    /// and keep the previous value.
    pub fn advance(&mut self, reading: f64, wrap: Option<f64>) -> f64 {
        if !reading.is_finite() {
            return 0.0;
        }
        let delta = match self.previous {
            Some(previous) => unwrap_delta(reading - previous, wrap),
            None => 0.0,
        };
        self.previous = Some(reading);
        delta
    }

    pub fn previous(&self) -> Option<f64> {
        self.previous
    }
}

/// Fold an encoder delta into (-period/2, period/2]
fn unwrap_delta(delta: f64, wrap: Option<f64>) -> f64 {
    match wrap {
        Some(period) if period > 0.0 => {
            let half = period / 2.0;
            let folded = (delta + half).rem_euclid(period) - half;
            if folded == -half {
                half
            } else {
                folded
            }
        }
        _ => delta,
    }
}

/// Estimates the robot pose once per tick
#[derive(Debug)]
pub struct PoseEstimator {
    config: PoseConfig,
    wheel_radius: f64,
    axle_length: f64,
    pose: Pose,
    left: WheelState,
    right: WheelState,
    slip: SlipGuard,
    matcher: ScanMatcher,
}

impl PoseEstimator {
    /// Create a new estimator at the origin
    pub fn new(
        robot: &RobotConfig,
        config: PoseConfig,
        slip: SlipConfig,
        scan_match: ScanMatchConfig,
    ) -> Self {
        PoseEstimator {
            config,
            wheel_radius: robot.wheel_radius,
            axle_length: robot.axle_length,
            pose: Pose::origin(),
            left: WheelState::default(),
            right: WheelState::default(),
            slip: SlipGuard::new(slip),
            matcher: ScanMatcher::new(scan_match),
        }
    }

    /// Get the current pose estimate
    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn slip_active(&self) -> bool {
        self.slip.is_active()
    }

    pub fn matcher(&self) -> &ScanMatcher {
        &self.matcher
    }

    /// Place the robot at `pose`, keeping encoder history
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = Pose::new(pose.x, pose.y, pose.theta);
    }

    /// Return to the origin and forget slip and matching history
    pub fn reset(&mut self) {
        self.pose = Pose::origin();
        self.slip.reset();
        self.matcher.reset();
    }

    /// Advance the estimate by one tick.
    ///
    /// `left` and `right` are cumulative wheel angles in radians. `map` is the
    /// grid as of the previous tick and is only used for scan matching.
    pub fn update(
        &mut self,
        left: f64,
        right: f64,
        heading: Option<f64>,
        scan: Option<&RangeScan>,
        map: Option<&OccupancyGrid>,
    ) -> Pose {
        let wrap = self.config.encoder_wrap;
        let d_left = self.left.advance(left, wrap) * self.wheel_radius;
        let d_right = self.right.advance(right, wrap) * self.wheel_radius;

        let mut distance = (d_left + d_right) / 2.0;
        let mut dtheta = (d_right - d_left) / self.axle_length;

        if let Some(scan) = scan {
            let travel = (d_left.abs() + d_right.abs()) / 2.0;
            if self.slip.observe(scan, travel) {
                distance = 0.0;
                dtheta = 0.0;
            }
        }

        let mid = self.pose.theta + dtheta / 2.0;
        let mut pose = Pose {
            x: self.pose.x + distance * mid.cos(),
            y: self.pose.y + distance * mid.sin(),
            theta: wrap_angle(self.pose.theta + dtheta),
        };

        if let Some(heading) = heading.filter(|h| h.is_finite()) {
            let heading = if self.config.invert_heading { -heading } else { heading };
            pose.theta = wrap_angle(heading);
        }

        if let (Some(scan), Some(map)) = (scan, map) {
            if self.matcher.tick(map) {
                let outcome = self.matcher.match_scan(&pose, scan, map);
                pose = self.matcher.apply(&pose, &outcome);
            }
        }

        if !pose.is_finite() {
            log::warn!("Pose estimate became non-finite, resetting to origin");
            self.reset();
            return self.pose;
        }

        self.pose = pose;
        self.pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    const R: f64 = 0.033;
    const L: f64 = 0.160;

    fn estimator() -> PoseEstimator {
        let mut scan_match = ScanMatchConfig::default();
        scan_match.enabled = false;
        PoseEstimator::new(
            &RobotConfig::default(),
            PoseConfig::default(),
            SlipConfig::default(),
            scan_match,
        )
    }

    #[test]
    fn first_reading_only_seeds() {
        let mut est = estimator();
        let pose = est.update(12.0, -4.0, None, None, None);
        assert_eq!(pose, Pose::origin());
    }

    #[test]
    fn straight_line() {
        let mut est = estimator();
        est.update(0.0, 0.0, None, None, None);
        // One metre of travel
        let angle = 1.0 / R;
        let pose = est.update(angle, angle, None, None, None);
        assert_relative_eq!(pose.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(pose.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(pose.theta, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn spin_in_place() {
        let mut est = estimator();
        est.update(0.0, 0.0, None, None, None);
        // Quarter turn: each wheel travels L * pi / 4
        let angle = L * PI / 4.0 / R;
        let pose = est.update(-angle, angle, None, None, None);
        assert_relative_eq!(pose.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(pose.theta, FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn unchanged_readings_are_idempotent() {
        let mut est = estimator();
        est.update(0.0, 0.0, None, None, None);
        let first = est.update(3.0, 5.0, None, None, None);
        for _ in 0..10 {
            assert_eq!(est.update(3.0, 5.0, None, None, None), first);
        }
    }

    #[test]
    fn theta_stays_wrapped() {
        let mut est = estimator();
        let mut left = 0.0;
        let mut right = 0.0;
        est.update(left, right, None, None, None);
        for _ in 0..500 {
            left -= 0.7;
            right += 0.7;
            let pose = est.update(left, right, None, None, None);
            assert!(pose.theta > -PI && pose.theta <= PI);
        }
    }

    #[test]
    fn heading_overrides_theta() {
        let mut est = estimator();
        est.update(0.0, 0.0, None, None, None);
        let pose = est.update(1.0, 1.0, Some(0.5), None, None);
        assert_relative_eq!(pose.theta, 0.5);

        // NaN heading falls back to integration
        let pose = est.update(1.0, 1.0, Some(f64::NAN), None, None);
        assert_relative_eq!(pose.theta, 0.5);
    }

    #[test]
    fn inverted_heading() {
        let config = PoseConfig {
            invert_heading: true,
            ..PoseConfig::default()
        };
        let mut est = PoseEstimator::new(
            &RobotConfig::default(),
            config,
            SlipConfig::default(),
            ScanMatchConfig::default(),
        );
        let pose = est.update(0.0, 0.0, Some(0.3), None, None);
        assert_relative_eq!(pose.theta, -0.3);
    }

    #[test]
    fn non_finite_encoder_is_ignored() {
        let mut est = estimator();
        est.update(0.0, 0.0, None, None, None);
        let pose = est.update(f64::NAN, 0.0, None, None, None);
        assert_eq!(pose, Pose::origin());
        // Left wheel keeps its last finite value
        let pose = est.update(1.0, 1.0, None, None, None);
        assert_relative_eq!(pose.x, R, epsilon = 1e-12);
    }

    #[test]
    fn encoder_wrap_is_unfolded() {
        assert_relative_eq!(unwrap_delta(TAU - 0.1, Some(TAU)), -0.1, epsilon = 1e-12);
        assert_relative_eq!(unwrap_delta(-TAU + 0.1, Some(TAU)), 0.1, epsilon = 1e-12);
        assert_relative_eq!(unwrap_delta(5.0, None), 5.0);
    }

    #[test]
    fn non_finite_pose_resets_to_origin() {
        let mut est = estimator();
        est.update(0.0, 0.0, None, None, None);
        est.update(10.0, 10.0, None, None, None);
        est.set_pose(Pose {
            x: f64::INFINITY,
            y: 0.0,
            theta: 0.0,
        });
        let pose = est.update(10.0, 10.0, None, None, None);
        assert_eq!(pose, Pose::origin());
    }

    #[test]
    fn slip_freezes_the_pose() {
        let mut est = estimator();
        let mut scan = RangeScan::uniform(360, TAU, 0.05, 3.5, 3.5);
        for r in &mut scan.ranges[120..=240] {
            *r = 0.08;
        }
        let mut angle = 0.0;
        est.update(angle, angle, None, Some(&scan), None);
        let mut poses = Vec::new();
        for _ in 0..8 {
            angle += 0.5;
            poses.push(est.update(angle, angle, None, Some(&scan), None));
        }
        assert!(est.slip_active());
        assert_eq!(poses[6], poses[7]);
    }
}
