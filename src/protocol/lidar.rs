//! Spinning-lidar frame framer and decoder.
//!
//! Frame format (22 bytes, little-endian):
//! - Sync marker (1 byte): 0xFA
//! - Index (1 byte): 0xA0..=0xF9, frame's base angle = (index − 0xA0) × 4°
//! - Motor speed (2 bytes)
//! - 4 samples × 4 bytes: distance low, distance high + flags, signal low,
//!   signal high. Distance is 14 bits in millimetres; bit 7 of the second
//!   byte flags an invalid reading, bit 6 a weak signal.
//! - Checksum (2 bytes)
//!
//! The serial stream is known-lossy. A full physical rotation is read as
//! one fixed-size chunk and re-framed from scratch: every sync marker
//! starts a candidate frame, and a candidate is decoded only when the span
//! to the next marker has exactly the frame length and the checksum
//! matches. Everything else is dropped silently. No state is carried
//! between chunks, so a frame split across two chunks is lost by design.

use crate::core::scan::LidarSample;

/// Frame sync marker
pub const SYNC: u8 = 0xFA;
/// Encoded frame length including sync, payload and checksum
pub const FRAME_LEN: usize = 22;
/// Decoded samples per valid frame
pub const SAMPLES_PER_FRAME: usize = 4;
/// Frames per physical rotation (360° / 4° per frame)
pub const FRAMES_PER_ROTATION: usize = 90;
/// Read-chunk size covering one full rotation
pub const FULL_ROTATION_LEN: usize = FRAME_LEN * FRAMES_PER_ROTATION;

const INDEX_BASE: u8 = 0xA0;
const SAMPLE_OFFSET: usize = 4;
const CHECKSUM_OFFSET: usize = 20;

/// Decode every valid frame in one rotation's worth of raw bytes.
///
/// Invalid candidates (wrong span length, bad index, failed checksum) are
/// skipped; samples flagged invalid by the sensor are omitted from valid
/// frames.
pub fn decode_rotation(buf: &[u8]) -> Vec<LidarSample> {
    let mut samples = Vec::new();

    let marks: Vec<usize> = buf
        .iter()
        .enumerate()
        .filter_map(|(i, &b)| (b == SYNC).then_some(i))
        .collect();

    for (i, &start) in marks.iter().enumerate() {
        let end = marks.get(i + 1).copied().unwrap_or(buf.len());
        if end - start != FRAME_LEN {
            continue;
        }
        let frame = &buf[start..end];
        if validate_frame(frame) {
            decode_frame(frame, &mut samples);
        }
    }

    samples
}

/// True iff the candidate has a plausible index byte and a valid checksum.
fn validate_frame(frame: &[u8]) -> bool {
    debug_assert_eq!(frame.len(), FRAME_LEN);

    if !(INDEX_BASE..INDEX_BASE + FRAMES_PER_ROTATION as u8).contains(&frame[1]) {
        return false;
    }

    let expected = u16::from_le_bytes([frame[CHECKSUM_OFFSET], frame[CHECKSUM_OFFSET + 1]]);
    frame_checksum(frame) == expected
}

/// Checksum over the first 20 bytes of a frame: fold the ten little-endian
/// words with a shift-and-add, then wrap the carry back into 15 bits.
pub fn frame_checksum(frame: &[u8]) -> u16 {
    let mut chk32: u32 = 0;
    for word in frame[..CHECKSUM_OFFSET].chunks_exact(2) {
        chk32 = (chk32 << 1) + u32::from(u16::from_le_bytes([word[0], word[1]]));
    }
    (((chk32 & 0x7FFF) + (chk32 >> 15)) & 0x7FFF) as u16
}

fn decode_frame(frame: &[u8], out: &mut Vec<LidarSample>) {
    let base_angle = i32::from(frame[1] - INDEX_BASE) * SAMPLES_PER_FRAME as i32;

    for i in 0..SAMPLES_PER_FRAME {
        let offset = SAMPLE_OFFSET + i * 4;
        let lo = frame[offset];
        let hi = frame[offset + 1];

        // Bit 7: sensor could not measure this bearing
        if hi & 0x80 != 0 {
            continue;
        }

        out.push(LidarSample {
            angle: base_angle + i as i32,
            distance: i32::from(lo) | (i32::from(hi & 0x3F) << 8),
        });
    }
}

/// Encode one well-formed frame. Used by the mock lidar in tests.
pub fn encode_frame(index: u8, distances: [u16; SAMPLES_PER_FRAME]) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[0] = SYNC;
    frame[1] = index;
    frame[2..4].copy_from_slice(&1800u16.to_le_bytes()); // nominal motor speed

    for (i, &dist) in distances.iter().enumerate() {
        let offset = SAMPLE_OFFSET + i * 4;
        frame[offset] = (dist & 0xFF) as u8;
        frame[offset + 1] = ((dist >> 8) & 0x3F) as u8;
        frame[offset + 2..offset + 4].copy_from_slice(&100u16.to_le_bytes());
    }

    let checksum = frame_checksum(&frame);
    frame[CHECKSUM_OFFSET..].copy_from_slice(&checksum.to_le_bytes());
    frame
}
