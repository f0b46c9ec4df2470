//! The Bug2 M-line

use crate::common::types::Point2D;

/// Line from the navigation start point to the goal, stored as
/// `a*x + b*y + c = 0` with `a^2 + b^2 = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MLine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub start: Point2D,
    pub goal: Point2D,
}

impl MLine {
    pub fn new(start: Point2D, goal: Point2D) -> Self {
        let dx = goal.x - start.x;
        let dy = goal.y - start.y;
        let length = dx.hypot(dy);
        if length < f64::EPSILON {
            // Degenerate: distance to the point itself
            return MLine {
                a: 0.0,
                b: 0.0,
                c: 0.0,
                start,
                goal,
            };
        }
        let a = dy / length;
        let b = -dx / length;
        let c = -(a * start.x + b * start.y);
        MLine { a, b, c, start, goal }
    }

    pub fn is_degenerate(&self) -> bool {
        self.a == 0.0 && self.b == 0.0
    }

    /// Signed perpendicular distance; positive on the right of start -> goal
    pub fn signed_distance(&self, point: &Point2D) -> f64 {
        if self.is_degenerate() {
            return point.distance(&self.start);
        }
        self.a * point.x + self.b * point.y + self.c
    }

    pub fn contains(&self, point: &Point2D, tolerance: f64) -> bool {
        self.signed_distance(point).abs() < tolerance
    }
}
