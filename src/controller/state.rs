//! Controller state and counters.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Outcome of session setup. Terminal once not `Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupState {
    Success,
    NotAuthorized,
    ConfigurationFailed,
}

/// Lifecycle of the running session, owned by the worker queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    #[default]
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl RunState {
    /// True while the session is running or about to run.
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Starting | RunState::Running)
    }
}

/// Point-in-time copy of [`ControllerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub captures_requested: u64,
    pub captures_delivered: u64,
    pub capture_errors: u64,
    pub captures_rejected: u64,
    pub restarts: u64,
    pub interruptions: u64,
    pub is_running: bool,
}

/// Counters updated from the worker queue and capture callbacks.
#[derive(Debug, Default)]
pub(crate) struct ControllerStats {
    captures_requested: AtomicU64,
    captures_delivered: AtomicU64,
    capture_errors: AtomicU64,
    captures_rejected: AtomicU64,
    restarts: AtomicU64,
    interruptions: AtomicU64,
    running: AtomicBool,
}

impl ControllerStats {
    pub(crate) fn capture_requested(&self) {
        self.captures_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn capture_delivered(&self) {
        self.captures_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn capture_failed(&self) {
        self.capture_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn capture_rejected(&self) {
        self.captures_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn restarted(&self) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn interrupted(&self) {
        self.interruptions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            captures_requested: self.captures_requested.load(Ordering::Relaxed),
            captures_delivered: self.captures_delivered.load(Ordering::Relaxed),
            capture_errors: self.capture_errors.load(Ordering::Relaxed),
            captures_rejected: self.captures_rejected.load(Ordering::Relaxed),
            restarts: self.restarts.load(Ordering::Relaxed),
            interruptions: self.interruptions.load(Ordering::Relaxed),
            is_running: self.running.load(Ordering::Relaxed),
        }
    }
}
