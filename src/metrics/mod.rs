//! Prometheus metrics exporter for the capture controller.
//!
//! Controller counters are copied into a Prometheus registry and, with the
//! `metrics` feature, served over HTTP.
//!
//! # Metrics Exposed
//!
//! ## Capture Metrics
//! - `doc_camera_captures_requested_total` - Capture requests accepted
//! - `doc_camera_captures_delivered_total` - Photos decoded and delivered
//! - `doc_camera_capture_errors_total` - Captures that failed
//! - `doc_camera_captures_rejected_total` - Requests refused while a capture was in flight
//!
//! ## Session Metrics
//! - `doc_camera_session_restarts_total` - Automatic restarts after media services resets
//! - `doc_camera_interruptions_total` - Session interruptions
//! - `doc_camera_session_running` - Running flag (1=running, 0=stopped)
//!
//! # Example
//!
//! ```no_run
//! use doc_camera::metrics::{MetricsRegistry, MetricsSnapshot};
//! use doc_camera::controller::StatsSnapshot;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let stats = StatsSnapshot {
//!     captures_requested: 3,
//!     captures_delivered: 3,
//!     is_running: true,
//!     ..Default::default()
//! };
//!
//! registry.update(&MetricsSnapshot::from_stats(&stats));
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
