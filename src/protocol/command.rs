//! Outbound command wire record.
//!
//! Fixed 6-byte little-endian layout: opcode, left speed, right speed, all
//! signed 16-bit. Speeds are in controller units and are clamped to the
//! configured maximum forward speed at construction.

/// Encoded size of one command record
pub const RECORD_LEN: usize = 6;

/// Command opcodes understood by the microcontroller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum Opcode {
    /// Reset the controller to its power-on state
    Reset = 0,
    /// Begin the telemetry session
    Connect = 1,
    /// Set wheel speeds
    Move = 2,
}

/// One outbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotCommand {
    pub opcode: Opcode,
    pub left: i16,
    pub right: i16,
}

impl RobotCommand {
    pub fn reset() -> Self {
        Self {
            opcode: Opcode::Reset,
            left: 0,
            right: 0,
        }
    }

    pub fn connect() -> Self {
        Self {
            opcode: Opcode::Connect,
            left: 0,
            right: 0,
        }
    }

    /// Move command with both speeds clamped to `±max_speed`.
    pub fn move_speeds(left: i16, right: i16, max_speed: i16) -> Self {
        Self {
            opcode: Opcode::Move,
            left: left.clamp(-max_speed, max_speed),
            right: right.clamp(-max_speed, max_speed),
        }
    }

    // Manual-drive commands, used by the keyboard handler.

    pub fn forward(max_speed: i16) -> Self {
        Self::move_speeds(max_speed, max_speed, max_speed)
    }

    pub fn forward_left(max_speed: i16) -> Self {
        Self::move_speeds(max_speed / 2, max_speed, max_speed)
    }

    pub fn forward_right(max_speed: i16) -> Self {
        Self::move_speeds(max_speed, max_speed / 2, max_speed)
    }

    pub fn left_turn(max_speed: i16) -> Self {
        Self::move_speeds(-max_speed, max_speed, max_speed)
    }

    pub fn right_turn(max_speed: i16) -> Self {
        Self::move_speeds(max_speed, -max_speed, max_speed)
    }

    pub fn backward(max_speed: i16) -> Self {
        Self::move_speeds(-max_speed, -max_speed, max_speed)
    }

    pub fn backward_left(max_speed: i16) -> Self {
        Self::move_speeds(-max_speed / 2, -max_speed, max_speed)
    }

    pub fn backward_right(max_speed: i16) -> Self {
        Self::move_speeds(-max_speed, -max_speed / 2, max_speed)
    }

    /// Encode to the wire layout.
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0..2].copy_from_slice(&(self.opcode as i16).to_le_bytes());
        buf[2..4].copy_from_slice(&self.left.to_le_bytes());
        buf[4..6].copy_from_slice(&self.right.to_le_bytes());
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let cmd = RobotCommand::move_speeds(100, -100, 200);
        let buf = cmd.encode();

        assert_eq!(i16::from_le_bytes([buf[0], buf[1]]), Opcode::Move as i16);
        assert_eq!(i16::from_le_bytes([buf[2], buf[3]]), 100);
        assert_eq!(i16::from_le_bytes([buf[4], buf[5]]), -100);
    }

    #[test]
    fn test_move_clamps_to_max_speed() {
        let cmd = RobotCommand::move_speeds(500, -500, 200);
        assert_eq!(cmd.left, 200);
        assert_eq!(cmd.right, -200);
    }

    #[test]
    fn test_reset_and_connect_carry_no_speed() {
        assert_eq!(RobotCommand::reset().encode()[2..], [0, 0, 0, 0]);
        assert_eq!(RobotCommand::connect().left, 0);
    }

    #[test]
    fn test_turn_commands_are_opposed() {
        let left = RobotCommand::left_turn(150);
        assert_eq!((left.left, left.right), (-150, 150));

        let right = RobotCommand::right_turn(150);
        assert_eq!((right.left, right.right), (150, -150));
    }
}
