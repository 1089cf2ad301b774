//! Metrics collection and registry.

use crate::controller::StatsSnapshot;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of controller state for metrics update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Capture requests accepted by the controller.
    pub captures_requested: u64,
    /// Photos decoded and handed to the delegate.
    pub captures_delivered: u64,
    /// Captures that ended in an error.
    pub capture_errors: u64,
    /// Requests refused because a capture was already in flight.
    pub captures_rejected: u64,
    /// Automatic restarts after a media services reset.
    pub session_restarts: u64,
    /// Session interruptions observed.
    pub interruptions: u64,
    /// Whether the session is currently running.
    pub session_running: bool,
}

impl MetricsSnapshot {
    /// Creates a snapshot from the controller's counters.
    pub fn from_stats(stats: &StatsSnapshot) -> Self {
        Self {
            captures_requested: stats.captures_requested,
            captures_delivered: stats.captures_delivered,
            capture_errors: stats.capture_errors,
            captures_rejected: stats.captures_rejected,
            session_restarts: stats.restarts,
            interruptions: stats.interruptions,
            session_running: stats.is_running,
        }
    }
}

/// Prometheus metrics registry for the capture controller.
pub struct MetricsRegistry {
    registry: Registry,

    // Capture metrics
    captures_requested: IntCounter,
    captures_delivered: IntCounter,
    capture_errors: IntCounter,
    captures_rejected: IntCounter,

    // Session metrics
    session_restarts: IntCounter,
    interruptions: IntCounter,
    session_running: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all controller metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let captures_requested = IntCounter::new(
            "doc_camera_captures_requested_total",
            "Total capture requests accepted",
        )?;
        let captures_delivered = IntCounter::new(
            "doc_camera_captures_delivered_total",
            "Total photos decoded and delivered",
        )?;
        let capture_errors = IntCounter::new(
            "doc_camera_capture_errors_total",
            "Total captures that failed",
        )?;
        let captures_rejected = IntCounter::new(
            "doc_camera_captures_rejected_total",
            "Total capture requests rejected while another was in flight",
        )?;

        let session_restarts = IntCounter::new(
            "doc_camera_session_restarts_total",
            "Total automatic session restarts after media services resets",
        )?;
        let interruptions = IntCounter::new(
            "doc_camera_interruptions_total",
            "Total session interruptions",
        )?;
        let session_running = IntGauge::new(
            "doc_camera_session_running",
            "Whether the capture session is running (1=running, 0=stopped)",
        )?;

        registry.register(Box::new(captures_requested.clone()))?;
        registry.register(Box::new(captures_delivered.clone()))?;
        registry.register(Box::new(capture_errors.clone()))?;
        registry.register(Box::new(captures_rejected.clone()))?;
        registry.register(Box::new(session_restarts.clone()))?;
        registry.register(Box::new(interruptions.clone()))?;
        registry.register(Box::new(session_running.clone()))?;

        Ok(Self {
            registry,
            captures_requested,
            captures_delivered,
            capture_errors,
            captures_rejected,
            session_restarts,
            interruptions,
            session_running,
        })
    }

    /// Updates all metrics from a snapshot of controller state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward, by the difference
        advance(&self.captures_requested, snapshot.captures_requested);
        advance(&self.captures_delivered, snapshot.captures_delivered);
        advance(&self.capture_errors, snapshot.capture_errors);
        advance(&self.captures_rejected, snapshot.captures_rejected);
        advance(&self.session_restarts, snapshot.session_restarts);
        advance(&self.interruptions, snapshot.interruptions);

        self.session_running
            .set(if snapshot.session_running { 1 } else { 0 });
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            captures_requested: 4,
            captures_delivered: 3,
            capture_errors: 1,
            captures_rejected: 2,
            session_restarts: 1,
            interruptions: 0,
            session_running: true,
        };

        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("doc_camera_captures_requested_total 4"));
        assert!(output.contains("doc_camera_captures_delivered_total 3"));
        assert!(output.contains("doc_camera_session_restarts_total 1"));
        assert!(output.contains("doc_camera_session_running 1"));
    }

    #[test]
    fn test_counters_never_decrease() {
        let registry = MetricsRegistry::new().unwrap();

        registry.update(&MetricsSnapshot {
            captures_requested: 5,
            ..Default::default()
        });
        registry.update(&MetricsSnapshot {
            captures_requested: 2,
            ..Default::default()
        });

        let output = registry.encode().unwrap();
        assert!(output.contains("doc_camera_captures_requested_total 5"));
        assert!(output.contains("doc_camera_session_running 0"));
    }

    #[test]
    fn test_snapshot_from_stats() {
        let stats = StatsSnapshot {
            captures_requested: 7,
            captures_delivered: 6,
            capture_errors: 1,
            captures_rejected: 0,
            restarts: 2,
            interruptions: 3,
            is_running: true,
        };

        let snapshot = MetricsSnapshot::from_stats(&stats);
        assert_eq!(snapshot.session_restarts, 2);
        assert_eq!(snapshot.interruptions, 3);
        assert!(snapshot.session_running);
    }
}
