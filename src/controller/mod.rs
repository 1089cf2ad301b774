//! Session orchestration.
//!
//! [`SessionController`] owns the capture session and drives it from a
//! private serial [`WorkerQueue`]. The queue starts suspended behind the
//! permission check so that no session call can happen before access is
//! granted. Results and notifications go to a [`CameraDelegate`] on the
//! host's [`UiContext`].

mod delegate;
mod error;
mod monitor;
mod permission;
mod queue;
mod session_controller;
mod state;

pub use delegate::{CameraDelegate, PreviewTarget};
pub use error::{CameraError, ConfigurationFailure, ControllerError, ErrorKind};
pub use monitor::{InterruptionMonitor, MonitorAction};
pub use permission::{AccessCompletion, PermissionGate};
pub use queue::{Job, UiContext, WorkerQueue};
pub use session_controller::SessionController;
pub use state::{RunState, SetupState, StatsSnapshot};
