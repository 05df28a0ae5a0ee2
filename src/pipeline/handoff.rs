//! Scan-line hand-off between the reader threads and the worker.
//!
//! Both reader threads fold into a single shared [`ScanLine`] under a
//! mutex; the worker blocks on a condvar until the line carries at least
//! one lidar sample, then takes the whole accumulation in one move.
//! Odometry alone never wakes the worker: motion without a scan produces
//! nothing to map.

use crate::core::scan::{Kinematics, LidarSample, ScanLine};
use parking_lot::{Condvar, Mutex};

#[derive(Default)]
pub struct ScanLineSlot {
    line: Mutex<ScanLine>,
    scans_ready: Condvar,
}

impl ScanLineSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one odometry sample into the pending scan line.
    pub fn add_odometry(&self, sample: &crate::protocol::odometry::OdometrySample, kin: &Kinematics) {
        self.line.lock().add(sample, kin);
    }

    /// Append decoded lidar samples and wake the worker.
    pub fn append_scans(&self, scans: Vec<LidarSample>) {
        if scans.is_empty() {
            return;
        }
        let mut line = self.line.lock();
        line.append_scans(scans);
        self.scans_ready.notify_one();
    }

    /// Block until the pending line has scans, then take it. Returns
    /// `None` once `cancelled` reports true, which is how the worker
    /// learns about shutdown.
    pub fn wait_for_scans<F: Fn() -> bool>(&self, cancelled: F) -> Option<ScanLine> {
        let mut line = self.line.lock();
        while line.scans.is_empty() {
            if cancelled() {
                return None;
            }
            self.scans_ready.wait(&mut line);
        }
        if cancelled() {
            return None;
        }
        Some(line.take_and_clear())
    }

    /// Wake the worker so it can observe a cancellation.
    pub fn notify(&self) {
        self.scans_ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::odometry::OdometrySample;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn kin() -> Kinematics {
        Kinematics {
            mm_per_tick: 1.0,
            wheel_base_mm: 200.0,
        }
    }

    #[test]
    fn test_handoff_carries_motion_and_scans() {
        let slot = Arc::new(ScanLineSlot::new());

        let producer = {
            let slot = slot.clone();
            thread::spawn(move || {
                let sample = OdometrySample {
                    front_left: 50,
                    front_right: 50,
                    back_left: 50,
                    back_right: 50,
                };
                slot.add_odometry(&sample, &kin());
                slot.add_odometry(&sample, &kin());
                slot.append_scans(vec![LidarSample {
                    angle: 10,
                    distance: 800,
                }]);
            })
        };

        let line = slot.wait_for_scans(|| false).unwrap();
        producer.join().unwrap();

        assert_eq!(line.scans.len(), 1);
        assert!((line.translation.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_take_resets_the_slot() {
        let slot = ScanLineSlot::new();
        slot.append_scans(vec![LidarSample {
            angle: 0,
            distance: 100,
        }]);

        let first = slot.wait_for_scans(|| false).unwrap();
        assert_eq!(first.scans.len(), 1);

        // The slot is empty again; a cancelled wait returns None.
        assert!(slot.wait_for_scans(|| true).is_none());
    }

    #[test]
    fn test_cancellation_wakes_blocked_worker() {
        let slot = Arc::new(ScanLineSlot::new());
        let cancelled = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let worker = {
            let slot = slot.clone();
            let cancelled = cancelled.clone();
            thread::spawn(move || {
                slot.wait_for_scans(|| cancelled.load(std::sync::atomic::Ordering::SeqCst))
            })
        };

        thread::sleep(Duration::from_millis(30));
        cancelled.store(true, std::sync::atomic::Ordering::SeqCst);
        slot.notify();

        assert!(worker.join().unwrap().is_none());
    }

    #[test]
    fn test_empty_scan_batch_does_not_wake() {
        let slot = ScanLineSlot::new();
        slot.append_scans(Vec::new());
        assert!(slot.wait_for_scans(|| true).is_none());
    }
}
