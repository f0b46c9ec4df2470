//! Static obstacle world for the simulator

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangular obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Rect {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Distance along the ray to the first boundary crossing, if any.
    /// A ray starting inside hits at zero.
    pub fn ray_intersect(&self, ox: f64, oy: f64, dx: f64, dy: f64) -> Option<f64> {
        if self.contains(ox, oy) {
            return Some(0.0);
        }
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;

        for (origin, dir, lo, hi) in [
            (ox, dx, self.min_x, self.max_x),
            (oy, dy, self.min_y, self.max_y),
        ] {
            if dir.abs() < 1e-12 {
                if origin < lo || origin > hi {
                    return None;
                }
            } else {
                let t1 = (lo - origin) / dir;
                let t2 = (hi - origin) / dir;
                t_min = t_min.max(t1.min(t2));
                t_max = t_max.min(t1.max(t2));
            }
        }

        if t_max >= t_min && t_min >= 0.0 {
            Some(t_min)
        } else {
            None
        }
    }
}

/// A set of obstacles in the world frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    pub obstacles: Vec<Rect>,
}

impl World {
    pub fn new() -> Self {
        World::default()
    }

    pub fn with_obstacle(mut self, rect: Rect) -> Self {
        self.obstacles.push(rect);
        self
    }

    pub fn is_occupied(&self, x: f64, y: f64) -> bool {
        self.obstacles.iter().any(|r| r.contains(x, y))
    }

    /// Distance to the nearest obstacle along `angle`, or `None` within `max_range`
    pub fn ray_cast(&self, x: f64, y: f64, angle: f64, max_range: f64) -> Option<f64> {
        let (dy, dx) = angle.sin_cos();
        self.obstacles
            .iter()
            .filter_map(|r| r.ray_intersect(x, y, dx, dy))
            .filter(|&d| d <= max_range)
            .fold(None, |best: Option<f64>, d| Some(best.map_or(d, |b| b.min(d))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn world() -> World {
        World::new().with_obstacle(Rect::new(1.0, -0.5, 1.5, 0.5))
    }

    #[test]
    fn ray_hits_near_face() {
        let d = world().ray_cast(0.0, 0.0, 0.0, 3.5).unwrap();
        assert_relative_eq!(d, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn ray_misses_behind_and_beside() {
        let w = world();
        assert!(w.ray_cast(0.0, 0.0, PI, 3.5).is_none());
        assert!(w.ray_cast(0.0, 0.0, FRAC_PI_2, 3.5).is_none());
        assert!(w.ray_cast(0.0, 0.0, 0.0, 0.8).is_none());
    }

    #[test]
    fn oblique_ray() {
        // 45 degrees from (0.5, -0.5) reaches the left face at (1.0, 0.0)
        let d = world().ray_cast(0.5, -0.5, PI / 4.0, 3.5).unwrap();
        assert_relative_eq!(d, 0.5 * 2.0_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn inside_reads_zero() {
        assert_eq!(world().ray_cast(1.2, 0.0, 1.0, 3.5), Some(0.0));
        assert!(world().is_occupied(1.2, 0.0));
    }
}
