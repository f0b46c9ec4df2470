//! Integer line traversal between grid cells

/// Integer grid coordinate. May lie outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCoord {
    pub x: i64,
    pub y: i64,
}

impl GridCoord {
    pub fn new(x: i64, y: i64) -> Self {
        GridCoord { x, y }
    }
}

/// Bresenham line iterator, inclusive of both endpoints.
///
/// ```text
/// From (0,0) to (5,2):
///
///     2 │         ● ●
///     1 │   ● ● ●
///     0 ● ●
///       └────────────
///        0 1 2 3 4 5
/// ```
pub struct BresenhamLine {
    x: i64,
    y: i64,
    dx: i64,
    dy: i64,
    step_x: i64,
    step_y: i64,
    error: i64,
    end: GridCoord,
    done: bool,
}

impl BresenhamLine {
    pub fn new(start: GridCoord, end: GridCoord) -> Self {
        let dx = (end.x - start.x).abs();
        let dy = -(end.y - start.y).abs();
        BresenhamLine {
            x: start.x,
            y: start.y,
            dx,
            dy,
            step_x: if start.x < end.x { 1 } else { -1 },
            step_y: if start.y < end.y { 1 } else { -1 },
            error: dx + dy,
            end,
            done: false,
        }
    }
}

impl Iterator for BresenhamLine {
    type Item = GridCoord;

    fn next(&mut self) -> Option<GridCoord> {
        if self.done {
            return None;
        }
        let current = GridCoord::new(self.x, self.y);
        if current == self.end {
            self.done = true;
            return Some(current);
        }

        let doubled = 2 * self.error;
        if doubled >= self.dy {
            self.error += self.dy;
            self.x += self.step_x;
        }
        if doubled <= self.dx {
            self.error += self.dx;
            self.y += self.step_y;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<GridCoord> {
        BresenhamLine::new(GridCoord::new(x0, y0), GridCoord::new(x1, y1)).collect()
    }

    #[test]
    fn single_cell() {
        assert_eq!(line(3, 3, 3, 3), vec![GridCoord::new(3, 3)]);
    }

    #[test]
    fn horizontal_and_vertical() {
        assert_eq!(line(0, 0, 4, 0).len(), 5);
        let down = line(2, 5, 2, 1);
        assert_eq!(down.len(), 5);
        assert_eq!(down.last(), Some(&GridCoord::new(2, 1)));
    }

    #[test]
    fn diagonal_visits_one_cell_per_step() {
        let cells = line(0, 0, -4, 4);
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[2], GridCoord::new(-2, 2));
    }

    #[test]
    fn shallow_line_is_gap_free() {
        let cells = line(0, 0, 7, 3);
        assert_eq!(cells.first(), Some(&GridCoord::new(0, 0)));
        assert_eq!(cells.last(), Some(&GridCoord::new(7, 3)));
        assert_eq!(cells.len(), 8);
        for pair in cells.windows(2) {
            assert!((pair[1].x - pair[0].x).abs() <= 1);
            assert!((pair[1].y - pair[0].y).abs() <= 1);
        }
    }
}
