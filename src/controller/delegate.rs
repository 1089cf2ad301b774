//! Outbound contract with the hosting UI.

use super::permission::AccessCompletion;
use super::CameraError;
use crate::orientation::{DeviceOrientation, InterfaceOrientation, PreviewRotation};
use crate::pipeline::CapturedImage;

/// Receives results and notifications from a session controller.
///
/// Every method except `check_access` runs on the UI context.
/// `check_access` runs on whichever thread called `setup`.
pub trait CameraDelegate: Send + Sync {
    /// Decides camera access. `completion` must be resolved exactly once;
    /// dropping it unresolved counts as a denial.
    fn check_access(&self, completion: AccessCompletion);

    /// A capture finished and decoded successfully.
    fn did_capture(&self, image: CapturedImage);

    /// Access was denied. Fires once; the controller is inert afterwards.
    fn access_denied(&self) {}

    /// The session could not be configured. Fires once.
    fn configuration_failed(&self) {}

    /// Non-fatal diagnostics; may fire any number of times.
    fn log_error(&self, error: &CameraError) {
        tracing::warn!(kind = ?error.kind(), %error, "Document camera error");
    }

    fn running_state_changed(&self, _is_running: bool) {}

    fn session_interrupted(&self) {}

    fn session_interruption_ended(&self) {}
}

/// The live preview surface. Held weakly by the controller.
pub trait PreviewTarget: Send + Sync {
    /// Current orientation of the hosting interface.
    fn interface_orientation(&self) -> InterfaceOrientation;

    /// Current physical orientation of the device.
    fn device_orientation(&self) -> DeviceOrientation {
        DeviceOrientation::Unknown
    }

    /// Rotation currently applied to the preview feed.
    fn preview_rotation(&self) -> PreviewRotation;

    fn set_preview_rotation(&self, rotation: PreviewRotation);

    /// The configured session is ready to feed the preview.
    fn session_attached(&self) {}

    /// The shutter is about to fire.
    fn play_capture_animation(&self) {}
}
