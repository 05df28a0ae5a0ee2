//! Odometry wire record.
//!
//! The microcontroller reports four signed 16-bit wheel-tick counters per
//! record, little-endian, in fixed order: front-left, front-right,
//! back-left, back-right.

/// Encoded size of one odometry record
pub const RECORD_LEN: usize = 8;

/// Raw wheel-tick deltas for one reporting interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OdometrySample {
    pub front_left: i16,
    pub front_right: i16,
    pub back_left: i16,
    pub back_right: i16,
}

impl OdometrySample {
    /// Decode one record from exactly [`RECORD_LEN`] bytes.
    pub fn decode(buf: &[u8; RECORD_LEN]) -> Self {
        Self {
            front_left: i16::from_le_bytes([buf[0], buf[1]]),
            front_right: i16::from_le_bytes([buf[2], buf[3]]),
            back_left: i16::from_le_bytes([buf[4], buf[5]]),
            back_right: i16::from_le_bytes([buf[6], buf[7]]),
        }
    }

    /// Encode to the wire layout. Used by the simulator side of tests.
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0..2].copy_from_slice(&self.front_left.to_le_bytes());
        buf[2..4].copy_from_slice(&self.front_right.to_le_bytes());
        buf[4..6].copy_from_slice(&self.back_left.to_le_bytes());
        buf[6..8].copy_from_slice(&self.back_right.to_le_bytes());
        buf
    }
}
