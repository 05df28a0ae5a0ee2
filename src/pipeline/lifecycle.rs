//! Pipeline lifecycle state machine.
//!
//! States advance in one direction only:
//! `Initializing` → `Running` → `ShuttingDown` → `Stopped`.
//! Shutdown can be requested from several places at once (keyboard,
//! watchdog, signal handler); the compare-exchange in
//! [`Lifecycle::request_shutdown`] lets exactly one requester win, which
//! keeps the drain sequence from running twice.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const INITIALIZING: u8 = 0;
const RUNNING: u8 = 1;
const SHUTTING_DOWN: u8 = 2;
const STOPPED: u8 = 3;

/// Shared lifecycle state. Clones observe the same state.
#[derive(Clone, Default)]
pub struct Lifecycle {
    state: Arc<AtomicU8>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Startup complete; reader loops may run.
    pub fn set_running(&self) {
        self.state.store(RUNNING, Ordering::SeqCst);
    }

    /// Request shutdown. Returns true for the caller that actually
    /// performed the transition into `ShuttingDown`; every later or
    /// concurrent call is a no-op returning false. Shutdown can also be
    /// requested while still `Initializing`, for failures during the
    /// startup handshake.
    pub fn request_shutdown(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, SHUTTING_DOWN, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
            || self
                .state
                .compare_exchange(INITIALIZING, SHUTTING_DOWN, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
    }

    /// Drain complete, all threads joined.
    pub fn set_stopped(&self) {
        self.state.store(STOPPED, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::SeqCst) == RUNNING
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state.load(Ordering::SeqCst) >= SHUTTING_DOWN
    }

    pub fn is_stopped(&self) -> bool {
        self.state.load(Ordering::SeqCst) == STOPPED
    }

    pub fn is_initializing(&self) -> bool {
        self.state.load(Ordering::SeqCst) == INITIALIZING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let lc = Lifecycle::new();
        assert!(lc.is_initializing());
        assert!(!lc.is_running());
        assert!(!lc.is_shutting_down());
    }

    #[test]
    fn test_shutdown_from_running() {
        let lc = Lifecycle::new();
        lc.set_running();
        assert!(lc.request_shutdown());
        assert!(lc.is_shutting_down());
    }

    #[test]
    fn test_shutdown_during_startup() {
        let lc = Lifecycle::new();
        assert!(lc.request_shutdown());
        assert!(lc.is_shutting_down());
        assert!(!lc.request_shutdown());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let lc = Lifecycle::new();
        lc.set_running();

        assert!(lc.request_shutdown());
        assert!(!lc.request_shutdown());
        assert!(!lc.request_shutdown());
    }

    #[test]
    fn test_clones_share_state() {
        let lc = Lifecycle::new();
        let other = lc.clone();

        lc.set_running();
        assert!(other.is_running());

        other.set_running();
        lc.request_shutdown();
        assert!(other.is_shutting_down());
    }

    #[test]
    fn test_stopped_counts_as_shutting_down() {
        let lc = Lifecycle::new();
        lc.set_running();
        lc.request_shutdown();
        lc.set_stopped();

        assert!(lc.is_stopped());
        assert!(lc.is_shutting_down());
    }

    #[test]
    fn test_concurrent_requests_elect_one_winner() {
        let lc = Lifecycle::new();
        lc.set_running();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lc = lc.clone();
                std::thread::spawn(move || lc.request_shutdown())
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();

        assert_eq!(wins, 1);
        assert!(lc.is_shutting_down());
    }
}
