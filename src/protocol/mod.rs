//! Serial wire formats.
//!
//! All records are fixed-size little-endian with no padding: the 8-byte
//! odometry record, the 6-byte command record, and the 22-byte lidar frame.

pub mod command;
pub mod lidar;
pub mod odometry;
