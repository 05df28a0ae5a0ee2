//! Sensor log artifact.
//!
//! A line-oriented record of everything the sensors reported, replayable
//! by offline tooling. One line per odometry record and one per lidar
//! batch, timestamped in fractional seconds since pipeline start:
//!
//! ```text
//! o;<secs>;<front-left>;<front-right>;<back-left>;<back-right>
//! l;<secs>;<angle>/<distance>;<angle>/<distance>;...;
//! ```

use crate::core::scan::LidarSample;
use crate::protocol::odometry::OdometrySample;
use std::io::Write;

pub struct SensorLog<W: Write> {
    writer: W,
}

impl<W: Write> SensorLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn odometry(&mut self, secs: f64, sample: &OdometrySample) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "o;{};{};{};{};{}",
            secs, sample.front_left, sample.front_right, sample.back_left, sample.back_right
        )
    }

    pub fn lidar(&mut self, secs: f64, samples: &[LidarSample]) -> std::io::Result<()> {
        write!(self.writer, "l;{};", secs)?;
        for sample in samples {
            write!(self.writer, "{}/{};", sample.angle, sample.distance)?;
        }
        writeln!(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odometry_line_format() {
        let mut log = SensorLog::new(Vec::new());
        log.odometry(
            42.125,
            &OdometrySample {
                front_left: 1,
                front_right: -2,
                back_left: 3,
                back_right: -4,
            },
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(log.writer).unwrap(),
            "o;42.125;1;-2;3;-4\n"
        );
    }

    #[test]
    fn test_timestamps_keep_subsecond_resolution() {
        let mut log = SensorLog::new(Vec::new());
        log.odometry(0.25, &OdometrySample::default()).unwrap();
        log.odometry(0.5, &OdometrySample::default()).unwrap();

        let text = String::from_utf8(log.writer).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("o;0.25;"));
        assert!(lines.next().unwrap().starts_with("o;0.5;"));
    }

    #[test]
    fn test_lidar_line_format() {
        let mut log = SensorLog::new(Vec::new());
        log.lidar(
            7.5,
            &[
                LidarSample {
                    angle: 0,
                    distance: 1200,
                },
                LidarSample {
                    angle: 1,
                    distance: 1180,
                },
            ],
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(log.writer).unwrap(),
            "l;7.5;0/1200;1/1180;\n"
        );
    }

    #[test]
    fn test_empty_lidar_batch_still_logs_timestamp() {
        let mut log = SensorLog::new(Vec::new());
        log.lidar(3.0, &[]).unwrap();
        assert_eq!(String::from_utf8(log.writer).unwrap(), "l;3;\n");
    }
}
