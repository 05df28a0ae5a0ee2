//! Scan-line accumulation.
//!
//! A [`ScanLine`] collects everything that happened since the last hand-off
//! to the mapping thread: the net displacement and rotation from zero or
//! more odometry samples, and the decoded lidar samples of zero or more
//! rotations. It is written by the acquisition side and moved, not copied,
//! to the consumer.

use crate::core::geometry::Displacement;
use crate::protocol::odometry::OdometrySample;

/// One decoded lidar measurement: bearing in degrees relative to the robot
/// heading, range in millimetres. Kept as the integers the wire carries so
/// the sensor log reproduces them exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LidarSample {
    pub angle: i32,
    pub distance: i32,
}

/// Differential-drive kinematics constants.
#[derive(Debug, Clone, Copy)]
pub struct Kinematics {
    /// Wheel travel per encoder tick, millimetres
    pub mm_per_tick: f64,
    /// Distance between left and right wheel centers, millimetres
    pub wheel_base_mm: f64,
}

/// Accumulated motion and lidar observations for one pipeline cycle.
#[derive(Debug, Clone, Default)]
pub struct ScanLine {
    /// Net displacement in the robot's local frame at the start of the
    /// accumulation window
    pub translation: Displacement,
    /// Net heading change, radians
    pub rotation: f64,
    /// Decoded lidar samples, in arrival order
    pub scans: Vec<LidarSample>,
}

impl ScanLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one odometry sample into the running translation and rotation.
    ///
    /// The four tick counters are reduced to per-side travel (mean of the
    /// front and back wheel on each side), converted to millimetres, and
    /// integrated with the differential-drive arc model. The incremental
    /// displacement composes onto the rotation accumulated so far rather
    /// than replacing it.
    pub fn add(&mut self, sample: &OdometrySample, kin: &Kinematics) {
        let left_ticks = f64::from(sample.front_left) + f64::from(sample.back_left);
        let right_ticks = f64::from(sample.front_right) + f64::from(sample.back_right);

        let left = left_ticks / 2.0 * kin.mm_per_tick;
        let right = right_ticks / 2.0 * kin.mm_per_tick;

        let delta_theta = (right - left) / kin.wheel_base_mm;
        let local = differential_drive_delta(left, right, delta_theta);

        self.translation += local.rotated(self.rotation);
        self.rotation += delta_theta;
    }

    /// Append decoded lidar samples without touching prior ones.
    pub fn append_scans<I: IntoIterator<Item = LidarSample>>(&mut self, scans: I) {
        self.scans.extend(scans);
    }

    /// True iff the accumulated translation is exactly zero and the
    /// accumulated rotation is exactly zero.
    pub fn is_zero_movement(&self) -> bool {
        self.translation == Displacement::ZERO && self.rotation == 0.0
    }

    /// Move the current contents out and reset to the empty state.
    pub fn take_and_clear(&mut self) -> ScanLine {
        std::mem::take(self)
    }
}

/// Displacement in the local frame for per-side wheel travel `left`/`right`
/// millimetres and heading change `delta_theta`.
fn differential_drive_delta(left: f64, right: f64, delta_theta: f64) -> Displacement {
    const STRAIGHT_THRESHOLD: f64 = 1e-9;

    if delta_theta.abs() < STRAIGHT_THRESHOLD {
        Displacement::new((left + right) / 2.0, 0.0)
    } else {
        // Arc around the instantaneous center of curvature
        let radius = (left + right) / (2.0 * delta_theta);
        Displacement::new(radius * delta_theta.sin(), radius * (1.0 - delta_theta.cos()))
    }
}
