//! Configuration for the Sarathi daemon
//!
//! Loads configuration from a TOML file. All geometry is in millimetres,
//! matching the units the lidar reports distances in.

use crate::core::scan::Kinematics;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub hardware: HardwareConfig,
    pub robot: RobotConfig,
    pub grid: GridConfig,
    pub pipeline: PipelineConfig,
}

/// Hardware configuration (serial ports)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HardwareConfig {
    /// Microcontroller serial port (odometry in, commands out)
    pub odometry_port: String,
    /// Lidar serial port
    pub lidar_port: String,
    /// Baud rate for both links
    pub baud_rate: u32,
}

/// Robot geometry and drive constants
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RobotConfig {
    /// Wheel travel per encoder tick, in millimetres
    pub mm_per_tick: f64,
    /// Distance between the left and right wheel centers, in millimetres
    pub wheel_base_mm: f64,
    /// Robot footprint width, in millimetres (used to stamp the silhouette)
    pub width_mm: f64,
    /// Robot footprint length, in millimetres
    pub length_mm: f64,
    /// Maximum forward speed in controller units; command speeds are
    /// clamped to this magnitude
    pub max_forward_speed: i16,
}

impl RobotConfig {
    /// Kinematics constants used by the scan-line accumulator
    pub fn kinematics(&self) -> Kinematics {
        Kinematics {
            mm_per_tick: self.mm_per_tick,
            wheel_base_mm: self.wheel_base_mm,
        }
    }
}

/// Occupancy grid geometry and update weights
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GridConfig {
    /// Grid edge length in cells (the map is square)
    pub extent_cells: usize,
    /// Cell edge length in millimetres
    pub cell_size_mm: f64,
    /// Log-odds increment for an observed obstacle cell
    pub log_odds_occupied: f64,
    /// Log-odds increment for a traversed free cell (negative)
    pub log_odds_free: f64,
    /// Symmetric clamp for accumulated log-odds values
    pub log_odds_clamp: f64,
}

/// Pipeline timing and optional outputs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Watchdog timeout: silence on the odometry link longer than this
    /// forces a safe shutdown
    pub watchdog_timeout_secs: u64,
    /// Pause between the startup reset and connect commands
    pub startup_pause_ms: u64,
    /// Manual control: drive with keyboard/HTTP instead of the strategy
    pub manual: bool,
    /// HTTP control port (only served in manual mode)
    pub http_port: Option<u16>,
    /// Append the sensor log (`o;`/`l;` lines) to this file
    pub sensor_log_path: Option<String>,
    /// Write the obstacle map to this file (PGM) after each update
    pub map_output_path: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hardware: HardwareConfig {
                odometry_port: "/dev/ttyACM0".to_string(),
                lidar_port: "/dev/ttyUSB0".to_string(),
                baud_rate: 115_200,
            },
            robot: RobotConfig {
                mm_per_tick: 0.384,
                wheel_base_mm: 240.0,
                width_mm: 300.0,
                length_mm: 300.0,
                max_forward_speed: 200,
            },
            grid: GridConfig {
                extent_cells: 400,
                cell_size_mm: 50.0,
                log_odds_occupied: 0.85,
                log_odds_free: -0.4,
                log_odds_clamp: 50.0,
            },
            pipeline: PipelineConfig {
                watchdog_timeout_secs: 60,
                startup_pause_ms: 1000,
                manual: false,
                http_port: Some(8088),
                sensor_log_path: None,
                map_output_path: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hardware.baud_rate, 115_200);
        assert_eq!(config.grid.extent_cells, 400);
        assert_eq!(config.pipeline.watchdog_timeout_secs, 60);
        assert!(!config.pipeline.manual);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[hardware]"));
        assert!(toml_string.contains("[robot]"));
        assert!(toml_string.contains("[grid]"));
        assert!(toml_string.contains("[pipeline]"));

        let parsed: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.robot.max_forward_speed, 200);
        assert_eq!(parsed.grid.cell_size_mm, 50.0);
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[hardware]
odometry_port = "/dev/ttyACM1"
lidar_port = "/dev/ttyUSB1"
baud_rate = 230400

[robot]
mm_per_tick = 0.5
wheel_base_mm = 200.0
width_mm = 250.0
length_mm = 250.0
max_forward_speed = 150

[grid]
extent_cells = 200
cell_size_mm = 100.0
log_odds_occupied = 0.9
log_odds_free = -0.5
log_odds_clamp = 20.0

[pipeline]
watchdog_timeout_secs = 30
startup_pause_ms = 500
manual = true
http_port = 8090
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.hardware.odometry_port, "/dev/ttyACM1");
        assert_eq!(config.robot.mm_per_tick, 0.5);
        assert_eq!(config.grid.extent_cells, 200);
        assert!(config.pipeline.manual);
        assert_eq!(config.pipeline.http_port, Some(8090));
        assert!(config.pipeline.sensor_log_path.is_none());
    }
}
