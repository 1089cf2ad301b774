//! Fault and interruption policy.
//!
//! Events reach the monitor only after being bounced onto the worker
//! queue, so the run state it sees is current. The only automatic action
//! is restarting after a media services reset; interruptions are passed
//! on for the host to act upon.

use super::RunState;
use crate::capture::FaultEvent;

/// What the controller should do about a fault event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorAction {
    /// Start the session again.
    Restart,
    NotifyInterrupted,
    NotifyInterruptionEnded,
    /// Forward the session's running flag.
    ReflectRunning(bool),
    /// Surface a runtime fault through `log_error`.
    Report(String),
    Ignore,
}

/// Decides how to react to fault events.
#[derive(Debug, Clone, Copy)]
pub struct InterruptionMonitor {
    auto_restart: bool,
}

impl InterruptionMonitor {
    pub fn new(auto_restart: bool) -> Self {
        Self { auto_restart }
    }

    pub fn decide(&self, event: &FaultEvent, run_state: RunState) -> MonitorAction {
        let action = match event {
            FaultEvent::RuntimeMediaReset
                if self.auto_restart && run_state == RunState::Running =>
            {
                MonitorAction::Restart
            }
            FaultEvent::RuntimeMediaReset => MonitorAction::Ignore,
            FaultEvent::RuntimeError(reason) => MonitorAction::Report(reason.clone()),
            FaultEvent::Interrupted => MonitorAction::NotifyInterrupted,
            FaultEvent::InterruptionEnded => MonitorAction::NotifyInterruptionEnded,
            FaultEvent::RunningStateChanged(running) => MonitorAction::ReflectRunning(*running),
        };

        tracing::debug!(?event, ?run_state, ?action, "Fault event");
        action
    }
}

impl Default for InterruptionMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_reset_restarts_only_when_running() {
        let monitor = InterruptionMonitor::default();

        assert_eq!(
            monitor.decide(&FaultEvent::RuntimeMediaReset, RunState::Running),
            MonitorAction::Restart
        );
        for state in [
            RunState::Idle,
            RunState::Starting,
            RunState::Stopping,
            RunState::Stopped,
        ] {
            assert_eq!(
                monitor.decide(&FaultEvent::RuntimeMediaReset, state),
                MonitorAction::Ignore
            );
        }
    }

    #[test]
    fn test_auto_restart_disabled() {
        let monitor = InterruptionMonitor::new(false);
        assert_eq!(
            monitor.decide(&FaultEvent::RuntimeMediaReset, RunState::Running),
            MonitorAction::Ignore
        );
    }

    #[test]
    fn test_interruptions_only_notify() {
        let monitor = InterruptionMonitor::default();

        assert_eq!(
            monitor.decide(&FaultEvent::Interrupted, RunState::Running),
            MonitorAction::NotifyInterrupted
        );
        assert_eq!(
            monitor.decide(&FaultEvent::InterruptionEnded, RunState::Running),
            MonitorAction::NotifyInterruptionEnded
        );
    }

    #[test]
    fn test_running_flag_and_errors_forwarded() {
        let monitor = InterruptionMonitor::default();

        assert_eq!(
            monitor.decide(&FaultEvent::RunningStateChanged(false), RunState::Running),
            MonitorAction::ReflectRunning(false)
        );
        assert_eq!(
            monitor.decide(
                &FaultEvent::RuntimeError("sensor overheated".to_string()),
                RunState::Running
            ),
            MonitorAction::Report("sensor overheated".to_string())
        );
    }
}
