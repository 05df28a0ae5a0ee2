//! Bresenham traversal of grid cells along a ray.

use crate::core::geometry::GridCell;

/// Iterator over the cells of the line from `from` to `to`, endpoints
/// included, using Bresenham's integer line algorithm.
pub fn ray_cells(from: GridCell, to: GridCell) -> RayCells {
    let dx = (to.x - from.x).abs();
    let dy = (to.y - from.y).abs();

    RayCells {
        x: from.x,
        y: from.y,
        end: to,
        dx,
        dy,
        sx: if from.x < to.x { 1 } else { -1 },
        sy: if from.y < to.y { 1 } else { -1 },
        err: dx - dy,
        finished: false,
    }
}

pub struct RayCells {
    x: i32,
    y: i32,
    end: GridCell,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    finished: bool,
}

impl Iterator for RayCells {
    type Item = GridCell;

    fn next(&mut self) -> Option<GridCell> {
        if self.finished {
            return None;
        }

        let cell = GridCell::new(self.x, self.y);

        if cell == self.end {
            self.finished = true;
            return Some(cell);
        }

        let e2 = 2 * self.err;
        if e2 > -self.dy {
            self.err -= self.dy;
            self.x += self.sx;
        }
        if e2 < self.dx {
            self.err += self.dx;
            self.y += self.sy;
        }

        Some(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_ray() {
        let cells: Vec<_> = ray_cells(GridCell::new(0, 0), GridCell::new(5, 0)).collect();
        assert_eq!(cells.len(), 6);
        assert!(cells.iter().all(|c| c.y == 0));
        assert_eq!(cells[5], GridCell::new(5, 0));
    }

    #[test]
    fn test_diagonal_ray_hits_endpoints() {
        let cells: Vec<_> = ray_cells(GridCell::new(2, 3), GridCell::new(7, 8)).collect();
        assert_eq!(cells.first(), Some(&GridCell::new(2, 3)));
        assert_eq!(cells.last(), Some(&GridCell::new(7, 8)));
    }

    #[test]
    fn test_negative_direction() {
        let cells: Vec<_> = ray_cells(GridCell::new(4, 4), GridCell::new(0, 0)).collect();
        assert_eq!(cells.first(), Some(&GridCell::new(4, 4)));
        assert_eq!(cells.last(), Some(&GridCell::new(0, 0)));
    }

    #[test]
    fn test_degenerate_ray() {
        let cells: Vec<_> = ray_cells(GridCell::new(3, 3), GridCell::new(3, 3)).collect();
        assert_eq!(cells, vec![GridCell::new(3, 3)]);
    }
}
