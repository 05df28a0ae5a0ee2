//! Telemetry watchdog.
//!
//! The robot must not keep its last commanded speed if the control program
//! stops hearing from it. A dedicated thread waits on a reset channel with
//! a timeout; every processed odometry record sends a reset. If the
//! timeout elapses with no reset the expiry action fires exactly once and
//! the thread exits. Dropping the [`Watchdog`] disconnects the channel and
//! ends the thread quietly.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct Watchdog {
    resets: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Watchdog {
    /// Spawn the watchdog thread. `on_expire` runs on that thread, once,
    /// if `timeout` passes without a reset.
    pub fn spawn<F>(timeout: Duration, on_expire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (tx, rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("watchdog".to_string())
            .spawn(move || loop {
                match rx.recv_timeout(timeout) {
                    Ok(()) => continue,
                    Err(RecvTimeoutError::Timeout) => {
                        log::warn!(
                            "Watchdog expired after {:?} without telemetry",
                            timeout
                        );
                        on_expire();
                        return;
                    }
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            })
            .expect("failed to spawn watchdog thread");

        Self {
            resets: tx,
            handle: Some(handle),
        }
    }

    /// Push the deadline out by another full timeout. Cheap enough for the
    /// odometry hot path; a full channel just means a reset is already
    /// pending.
    pub fn reset(&self) {
        let _ = self.resets.try_send(());
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        // Disconnect first so the thread is not left waiting out a long
        // timeout during shutdown.
        drop(std::mem::replace(&mut self.resets, bounded(1).0));
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
