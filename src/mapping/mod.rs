//! Probabilistic occupancy mapping.

pub mod export;
mod occupancy_grid;
mod ray;

pub use occupancy_grid::{CellState, Footprint, OccupancyGrid};
pub use ray::ray_cells;
