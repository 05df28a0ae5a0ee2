//! Sarathi - sensor fusion and mapping pipeline for a differential-drive
//! ground robot.
//!
//! The robot exposes two serial links: a microcontroller reporting wheel
//! odometry and accepting drive commands, and a spinning lidar streaming
//! range frames. This crate fuses both into an incremental pose estimate
//! and a probabilistic occupancy grid, and closes the loop by sending
//! commands chosen by a pluggable driving strategy.

pub mod config;
pub mod core;
pub mod error;
pub mod http;
pub mod mapping;
pub mod pipeline;
pub mod protocol;
pub mod sensor_log;
pub mod strategy;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
