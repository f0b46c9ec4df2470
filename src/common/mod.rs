//! Common utilities and types for the Seeker robot

/// Angle helpers shared by every component
pub mod math {
    use std::f64::consts::{PI, TAU};

    /// Wrap an angle into (-pi, pi].
    ///
    /// Non-finite input is returned unchanged so callers can detect it.
    #[inline]
    pub fn wrap_angle(angle: f64) -> f64 {
        if !angle.is_finite() {
            return angle;
        }
        let wrapped = angle.rem_euclid(TAU);
        if wrapped > PI {
            wrapped - TAU
        } else {
            wrapped
        }
    }

    /// Signed shortest rotation from `from` to `to`.
    #[inline]
    pub fn angle_diff(from: f64, to: f64) -> f64 {
        wrap_angle(to - from)
    }

    /// Logistic transform of a log-odds value.
    #[inline]
    pub fn logistic(log_odds: f64) -> f64 {
        1.0 / (1.0 + (-log_odds).exp())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use approx::assert_relative_eq;

        #[test]
        fn wrap_keeps_pi_and_maps_minus_pi() {
            assert_relative_eq!(wrap_angle(PI), PI);
            assert_relative_eq!(wrap_angle(-PI), PI);
            assert_relative_eq!(wrap_angle(0.0), 0.0);
        }

        #[test]
        fn wrap_folds_large_angles() {
            assert_relative_eq!(wrap_angle(5.0 * PI / 2.0), PI / 2.0, epsilon = 1e-9);
            assert_relative_eq!(wrap_angle(-3.0 * PI / 2.0), PI / 2.0, epsilon = 1e-9);
            assert_relative_eq!(wrap_angle(7.0 * TAU + 0.25), 0.25, epsilon = 1e-9);
        }

        #[test]
        fn wrap_result_is_half_open() {
            let mut a = -20.0;
            while a < 20.0 {
                let w = wrap_angle(a);
                assert!(w > -PI && w <= PI, "{} wrapped to {}", a, w);
                a += 0.037;
            }
        }

        #[test]
        fn angle_diff_takes_short_way() {
            assert_relative_eq!(angle_diff(PI - 0.1, -PI + 0.1), 0.2, epsilon = 1e-9);
            assert_relative_eq!(angle_diff(0.1, -0.1), -0.2, epsilon = 1e-9);
        }

        #[test]
        fn logistic_of_zero_is_half() {
            assert_relative_eq!(logistic(0.0), 0.5);
            assert!(logistic(8.0) > 0.99);
            assert!(logistic(-8.0) < 0.01);
        }
    }
}

/// Common types used across the codebase
pub mod types {
    use super::math::wrap_angle;
    use nalgebra::{Isometry2, Point2, Vector2};
    use serde::{Deserialize, Serialize};

    /// A point in the world frame, metres
    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct Point2D {
        pub x: f64,
        pub y: f64,
    }

    impl Point2D {
        pub fn new(x: f64, y: f64) -> Self {
            Point2D { x, y }
        }

        pub fn distance(&self, other: &Point2D) -> f64 {
            (self.x - other.x).hypot(self.y - other.y)
        }

        pub fn is_finite(&self) -> bool {
            self.x.is_finite() && self.y.is_finite()
        }
    }

    /// Robot pose in the world frame. `theta` is kept in (-pi, pi].
    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct Pose {
        pub x: f64,
        pub y: f64,
        pub theta: f64,
    }

    impl Pose {
        /// Create a pose, wrapping the heading.
        pub fn new(x: f64, y: f64, theta: f64) -> Self {
            Pose {
                x,
                y,
                theta: wrap_angle(theta),
            }
        }

        pub fn origin() -> Self {
            Pose::default()
        }

        pub fn position(&self) -> Point2D {
            Point2D::new(self.x, self.y)
        }

        pub fn distance_to(&self, point: &Point2D) -> f64 {
            self.position().distance(point)
        }

        /// Bearing from the robot to `point`, relative to the robot heading.
        pub fn relative_bearing(&self, point: &Point2D) -> f64 {
            wrap_angle((point.y - self.y).atan2(point.x - self.x) - self.theta)
        }

        pub fn is_finite(&self) -> bool {
            self.x.is_finite() && self.y.is_finite() && self.theta.is_finite()
        }

        /// Rigid transform robot frame -> world frame.
        pub fn isometry(&self) -> Isometry2<f64> {
            Isometry2::new(Vector2::new(self.x, self.y), self.theta)
        }

        /// World position of a range return at `bearing` (robot frame).
        pub fn project(&self, range: f64, bearing: f64) -> Point2D {
            let p = self.isometry() * Point2::new(range * bearing.cos(), range * bearing.sin());
            Point2D::new(p.x, p.y)
        }
    }

    /// Wheel angular velocity command, rad/s
    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct WheelCommand {
        pub left: f64,
        pub right: f64,
    }

    impl WheelCommand {
        pub fn new(left: f64, right: f64) -> Self {
            WheelCommand { left, right }
        }

        pub fn stop() -> Self {
            WheelCommand::default()
        }

        pub fn is_stopped(&self) -> bool {
            self.left == 0.0 && self.right == 0.0
        }
    }

}
