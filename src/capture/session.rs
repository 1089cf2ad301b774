//! Capture session abstraction.
//!
//! This trait is the boundary to the camera hardware. Implementations
//! coordinate one device input and one still-image output. Inputs and
//! outputs may only be changed between `begin_configuration` and
//! `commit_configuration`, and never while the session is running.

use super::{Device, DeviceInventory, EncodedPhoto};
use crate::orientation::PreviewRotation;
use crate::pipeline::{PhotoSettings, PixelFormat};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by the capture hardware.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("failed to open device {device}: {reason}")]
    DeviceOpenFailed { device: String, reason: String },
    #[error("{0} outside of a configuration bracket")]
    NotConfiguring(&'static str),
    #[error("photo output not configured")]
    OutputNotConfigured,
    #[error("capture submission failed: {0}")]
    SubmissionFailed(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
}

/// Quality preset applied to the session as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPreset {
    /// Full-resolution stills.
    #[default]
    Photo,
    High,
    Medium,
}

/// An opened input bound to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInput {
    device: Device,
}

impl DeviceInput {
    pub fn new(device: Device) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

/// Options applied to the photo output when it is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    pub high_resolution_capture: bool,
    pub live_photo_capture: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            high_resolution_capture: true,
            live_photo_capture: false,
        }
    }
}

/// Asynchronous notification raised by a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultEvent {
    /// The media services backing the session were reset.
    RuntimeMediaReset,
    /// Any other runtime error.
    RuntimeError(String),
    /// The session was interrupted (e.g. another client took the camera).
    Interrupted,
    InterruptionEnded,
    /// The session's running flag flipped.
    RunningStateChanged(bool),
}

/// Receiver for fault events. Called on an unspecified thread.
pub type FaultSink = Arc<dyn Fn(FaultEvent) + Send + Sync>;

/// Completion target for one capture request.
///
/// Both methods may be called on any thread; implementations must not
/// touch session or UI state in place.
pub trait PhotoCaptureHandler: Send + Sync {
    /// The sensor is about to expose the photo.
    fn will_begin_capture(&self);

    /// The photo finished processing, successfully or not.
    fn did_finish_capture(&self, result: Result<EncodedPhoto, SessionError>);
}

/// A hardware capture session.
pub trait CaptureSession: Send {
    /// Opens a configuration bracket.
    fn begin_configuration(&mut self);

    /// Closes the configuration bracket and applies the changes.
    fn commit_configuration(&mut self);

    fn set_preset(&mut self, preset: SessionPreset) -> Result<(), SessionError>;

    /// Devices the platform currently advertises.
    fn devices(&self) -> DeviceInventory;

    /// Creates an input for `device`.
    fn open_input(&mut self, device: &Device) -> Result<DeviceInput, SessionError>;

    fn can_add_input(&self, input: &DeviceInput) -> bool;

    fn add_input(&mut self, input: DeviceInput) -> Result<(), SessionError>;

    fn can_add_photo_output(&self) -> bool;

    fn add_photo_output(&mut self, options: OutputOptions) -> Result<(), SessionError>;

    /// Starts the data flow. Check `is_running` for the outcome.
    fn start_running(&mut self);

    fn stop_running(&mut self);

    fn is_running(&self) -> bool;

    /// Pixel formats available for the embedded preview image.
    fn available_preview_formats(&self) -> Vec<PixelFormat>;

    /// Rotation of the photo output connection.
    fn set_output_rotation(&mut self, rotation: PreviewRotation);

    /// Submits a still capture. The handler is called asynchronously.
    fn capture_photo(
        &mut self,
        settings: PhotoSettings,
        handler: Arc<dyn PhotoCaptureHandler>,
    ) -> Result<(), SessionError>;

    /// Routes fault events to `sink` until `stop_observing_faults`.
    fn observe_faults(&mut self, sink: FaultSink);

    fn stop_observing_faults(&mut self);
}
