//! Driving policy seam.
//!
//! The pipeline integrates sensors and maintains the map; deciding where
//! to go next is a separate concern behind this trait. The worker thread
//! calls [`DriveStrategy::on_sensor_data`] once per scan-line hand-off and
//! forwards unclaimed keyboard characters to [`DriveStrategy::on_char`].

use crate::core::scan::ScanLine;
use crate::mapping::OccupancyGrid;
use crate::protocol::command::RobotCommand;

pub trait DriveStrategy: Send {
    /// Decide the next command from the latest accumulated motion and the
    /// updated grid. The grid is mutable so a policy may stamp its own
    /// annotations (e.g. mark an unreachable region).
    fn on_sensor_data(&mut self, scan: &ScanLine, grid: &mut OccupancyGrid) -> RobotCommand;

    /// A keyboard character not handled by the pipeline itself.
    fn on_char(&mut self, _ch: u8) {}
}

/// Placeholder policy: always commands a stop. Keeps the pipeline
/// runnable while the real policy lives out of tree.
#[derive(Default)]
pub struct StopStrategy;

impl DriveStrategy for StopStrategy {
    fn on_sensor_data(&mut self, _scan: &ScanLine, _grid: &mut OccupancyGrid) -> RobotCommand {
        RobotCommand::move_speeds(0, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::mapping::Footprint;
    use crate::protocol::command::Opcode;

    #[test]
    fn test_stop_strategy_commands_zero_speed() {
        let mut strategy = StopStrategy;
        let mut grid = OccupancyGrid::new(
            GridConfig {
                extent_cells: 10,
                cell_size_mm: 50.0,
                log_odds_occupied: 0.85,
                log_odds_free: -0.4,
                log_odds_clamp: 50.0,
            },
            Footprint {
                width_mm: 100.0,
                length_mm: 100.0,
            },
        );

        let cmd = strategy.on_sensor_data(&ScanLine::new(), &mut grid);
        assert_eq!(cmd.opcode, Opcode::Move);
        assert_eq!((cmd.left, cmd.right), (0, 0));
    }
}
