//! Hardware-facing capture abstractions.
//!
//! This module describes the capture session the controller drives: the
//! device inventory and back-camera selection, the session trait with its
//! configuration bracket, and a synthetic session for tests and demos.
//! Nothing here schedules work; the controller owns all sequencing.

mod config;
mod device;
pub mod mock;
mod photo;
mod session;

pub use config::{ConfigError, ControllerConfig, DemoConfig, FileConfig};
pub use device::{Device, DeviceInventory, DeviceKind, DevicePosition, DeviceResolver};
pub use mock::{CallLog, MockBehavior, MockHandle, MockPayload, MockSession};
pub use photo::EncodedPhoto;
pub use session::{
    CaptureSession, DeviceInput, FaultEvent, FaultSink, OutputOptions, PhotoCaptureHandler,
    SessionError, SessionPreset,
};
