//! Occupancy grid with log-odds fusion and a thresholded obstacle map.
//!
//! Repeated noisy observations are fused by adding log-odds increments:
//! traversed cells move toward "free", ray endpoints toward "occupied"
//! (Thrun et al., "Probabilistic Robotics"). Alongside the log-odds array
//! the grid maintains a thresholded obstacle map: a cell is `Occupied` iff
//! its log-odds is strictly positive, `Free` once observed otherwise, and
//! `Unknown` until first touched.
//!
//! The grid has a fixed extent and a fixed world-to-cell transform with
//! the world origin at the grid center. Writing a log-odds cell outside
//! the extent is a broken contract, not a runtime condition, and panics.

use crate::config::GridConfig;
use crate::core::geometry::{Displacement, GridCell, Point, Pose};
use crate::mapping::ray::ray_cells;

/// Tri-valued obstacle cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Unknown,
    Free,
    Occupied,
}

/// Robot silhouette dimensions used for the per-pose free-space stamp.
#[derive(Debug, Clone, Copy)]
pub struct Footprint {
    pub width_mm: f64,
    pub length_mm: f64,
}

/// Bounded 2D log-odds map plus its derived obstacle map.
pub struct OccupancyGrid {
    config: GridConfig,
    footprint: Footprint,
    log_odds: Vec<f64>,
    obstacles: Vec<CellState>,
}

impl OccupancyGrid {
    pub fn new(config: GridConfig, footprint: Footprint) -> Self {
        let cells = config.extent_cells * config.extent_cells;
        Self {
            config,
            footprint,
            log_odds: vec![0.0; cells],
            obstacles: vec![CellState::Unknown; cells],
        }
    }

    /// Grid edge length in cells.
    pub fn extent(&self) -> usize {
        self.config.extent_cells
    }

    /// Map a world point to its cell. The transform is the same for every
    /// read and write path; the world origin lands on the center cell.
    pub fn to_grid(&self, p: Point) -> GridCell {
        let half = self.config.extent_cells as i32 / 2;
        GridCell::new(
            (p.x / self.config.cell_size_mm).floor() as i32 + half,
            (p.y / self.config.cell_size_mm).floor() as i32 + half,
        )
    }

    /// Map a cell back to the world position of its center.
    pub fn to_world(&self, cell: GridCell) -> Point {
        let half = self.config.extent_cells as i32 / 2;
        Point::new(
            (f64::from(cell.x - half) + 0.5) * self.config.cell_size_mm,
            (f64::from(cell.y - half) + 0.5) * self.config.cell_size_mm,
        )
    }

    pub fn in_bounds(&self, cell: GridCell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && (cell.x as usize) < self.config.extent_cells
            && (cell.y as usize) < self.config.extent_cells
    }

    /// Fuse one polar observation taken from `pose`: `angle` is the
    /// bearing relative to the robot heading in radians, `distance` the
    /// range in millimetres. Cells along the ray are marked free, the
    /// endpoint occupied. The endpoint must map inside the grid.
    pub fn update_polar(&mut self, pose: &Pose, angle: f64, distance: f64) {
        let obstacle =
            pose.position + Displacement::from_angle_and_distance(pose.heading + angle, distance);
        self.update_ray(pose.position, obstacle);
    }

    /// Fuse a batch of world-space obstacle points observed from `pose`.
    /// The per-pose free-space sweep (the robot's own silhouette) is
    /// stamped once, then each point gets the usual ray-cast update.
    pub fn update_from_points(&mut self, pose: &Pose, points: &[Point]) {
        let silhouette = self.footprint_cells(pose);
        self.update_from_polygon(&silhouette, false);

        for &point in points {
            self.update_ray(pose.position, point);
        }
    }

    /// Fill a convex polygon of cells directly in the obstacle map,
    /// bypassing log-odds. Cells outside the grid are clipped. This write
    /// path is not recoverable into the probabilistic model; it exists
    /// for stamping known shapes such as the robot silhouette.
    pub fn update_from_polygon(&mut self, corners: &[GridCell], occupied: bool) {
        if corners.is_empty() {
            return;
        }
        let value = if occupied {
            CellState::Occupied
        } else {
            CellState::Free
        };

        let min_y = corners.iter().map(|c| c.y).min().unwrap();
        let max_y = corners.iter().map(|c| c.y).max().unwrap();

        for y in min_y..=max_y {
            let mut span: Option<(i32, i32)> = None;

            // Intersect the scanline with every polygon edge.
            for i in 0..corners.len() {
                let a = corners[i];
                let b = corners[(i + 1) % corners.len()];
                if a.y == b.y {
                    if a.y == y {
                        span = widen(span, a.x.min(b.x), a.x.max(b.x));
                    }
                    continue;
                }
                if y < a.y.min(b.y) || y > a.y.max(b.y) {
                    continue;
                }
                let t = f64::from(y - a.y) / f64::from(b.y - a.y);
                let x = (f64::from(a.x) + t * f64::from(b.x - a.x)).round() as i32;
                span = widen(span, x, x);
            }

            if let Some((x0, x1)) = span {
                for x in x0..=x1 {
                    let cell = GridCell::new(x, y);
                    if self.in_bounds(cell) {
                        let idx = self.index(cell);
                        self.obstacles[idx] = value;
                    }
                }
            }
        }
    }

    /// Snapshot accessor: thresholded obstacle map, row-major.
    pub fn obstacle_map(&self) -> &[CellState] {
        &self.obstacles
    }

    /// Snapshot accessor: raw log-odds values, row-major.
    pub fn log_odds_map(&self) -> &[f64] {
        &self.log_odds
    }

    pub fn state_at(&self, cell: GridCell) -> CellState {
        assert!(self.in_bounds(cell), "cell {:?} outside grid", cell);
        self.obstacles[self.index(cell)]
    }

    pub fn log_odds_at(&self, cell: GridCell) -> f64 {
        assert!(self.in_bounds(cell), "cell {:?} outside grid", cell);
        self.log_odds[self.index(cell)]
    }

    fn index(&self, cell: GridCell) -> usize {
        cell.y as usize * self.config.extent_cells + cell.x as usize
    }

    fn update_ray(&mut self, from: Point, to: Point) {
        let start = self.to_grid(from);
        let end = self.to_grid(to);
        assert!(
            self.in_bounds(end),
            "obstacle cell {:?} outside grid (world {:?})",
            end,
            to
        );

        for cell in ray_cells(start, end) {
            if cell == end {
                self.apply_log_odds(cell, self.config.log_odds_occupied);
            } else {
                self.apply_log_odds(cell, self.config.log_odds_free);
            }
        }
    }

    /// Every log-odds write refreshes the thresholded cell: strictly
    /// positive log-odds is occupied, zero resolves to free.
    fn apply_log_odds(&mut self, cell: GridCell, delta: f64) {
        assert!(self.in_bounds(cell), "cell {:?} outside grid", cell);
        let clamp = self.config.log_odds_clamp;
        let idx = self.index(cell);

        self.log_odds[idx] = (self.log_odds[idx] + delta).clamp(-clamp, clamp);
        self.obstacles[idx] = if self.log_odds[idx] > 0.0 {
            CellState::Occupied
        } else {
            CellState::Free
        };
    }

    /// Corner cells of the robot silhouette at `pose`, counter-clockwise.
    fn footprint_cells(&self, pose: &Pose) -> [GridCell; 4] {
        let hl = self.footprint.length_mm / 2.0;
        let hw = self.footprint.width_mm / 2.0;

        let corner = |dx: f64, dy: f64| {
            self.to_grid(pose.position + Displacement::new(dx, dy).rotated(pose.heading))
        };

        [
            corner(-hl, -hw),
            corner(hl, -hw),
            corner(hl, hw),
            corner(-hl, hw),
        ]
    }
}

/// Grow a scanline span to cover `lo..=hi`.
fn widen(span: Option<(i32, i32)>, lo: i32, hi: i32) -> Option<(i32, i32)> {
    match span {
        None => Some((lo, hi)),
        Some((a, b)) => Some((a.min(lo), b.max(hi))),
    }
}
