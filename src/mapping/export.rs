//! Map snapshot export.
//!
//! Writes the thresholded obstacle map as a binary PGM (P5) image:
//! occupied cells are black, free cells white, unknown cells mid-gray.
//! Row order is flipped so that +y in the world points up in the image.

use crate::mapping::{CellState, OccupancyGrid};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const PIXEL_OCCUPIED: u8 = 0;
const PIXEL_UNKNOWN: u8 = 128;
const PIXEL_FREE: u8 = 255;

/// Write the obstacle map to `path` as a binary PGM image.
pub fn write_pgm<P: AsRef<Path>>(grid: &OccupancyGrid, path: P) -> std::io::Result<()> {
    let extent = grid.extent();
    let mut writer = BufWriter::new(File::create(path)?);

    write!(writer, "P5\n{} {}\n255\n", extent, extent)?;

    let cells = grid.obstacle_map();
    for row in (0..extent).rev() {
        for col in 0..extent {
            let pixel = match cells[row * extent + col] {
                CellState::Occupied => PIXEL_OCCUPIED,
                CellState::Unknown => PIXEL_UNKNOWN,
                CellState::Free => PIXEL_FREE,
            };
            writer.write_all(&[pixel])?;
        }
    }

    writer.flush()
}
