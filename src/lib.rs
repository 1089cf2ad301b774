//! Document Camera Capture Library
//!
//! Turns a raw camera capture session into an asynchronous photo-taking
//! service: permission-gated setup, back-camera selection, start/stop,
//! still capture with orientation correction, and recovery from media
//! services resets.
//!
//! # Architecture
//!
//! ```text
//!  host UI ──► SessionController ──► worker queue ──► CaptureSession
//!     ▲              │                    ▲                 │
//!     │         PermissionGate            │            fault events
//!     │                                   └── InterruptionMonitor
//!     └──── UiContext ◄── PhotoPipeline ◄── capture completion
//! ```
//!
//! Every session call runs on one serial worker queue, which stays
//! suspended until camera access is granted. Decoded photos and all other
//! notifications reach the host's [`CameraDelegate`] on its [`UiContext`].
//!
//! # Example
//!
//! ```no_run
//! use doc_camera::{
//!     AccessCompletion, CameraDelegate, CapturedImage, InterfaceOrientation, MockSession,
//!     PreviewRotation, PreviewTarget, SessionController, WorkerQueue,
//! };
//! use std::sync::{Arc, Mutex};
//!
//! struct Screen {
//!     rotation: Mutex<PreviewRotation>,
//! }
//!
//! impl PreviewTarget for Screen {
//!     fn interface_orientation(&self) -> InterfaceOrientation {
//!         InterfaceOrientation::Portrait
//!     }
//!     fn preview_rotation(&self) -> PreviewRotation {
//!         *self.rotation.lock().unwrap()
//!     }
//!     fn set_preview_rotation(&self, rotation: PreviewRotation) {
//!         *self.rotation.lock().unwrap() = rotation;
//!     }
//! }
//!
//! impl CameraDelegate for Screen {
//!     fn check_access(&self, completion: AccessCompletion) {
//!         completion.resolve(true);
//!     }
//!     fn did_capture(&self, image: CapturedImage) {
//!         println!("captured {}x{}", image.width(), image.height());
//!     }
//! }
//!
//! let ui = Arc::new(WorkerQueue::new("ui").unwrap());
//! let controller = SessionController::new(MockSession::default(), ui).unwrap();
//! let screen = Arc::new(Screen {
//!     rotation: Mutex::new(PreviewRotation::Portrait),
//! });
//!
//! controller.setup(&screen, &screen);
//! controller.start();
//! controller.capture_photo().unwrap();
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod controller;
pub mod metrics;
pub mod orientation;
pub mod pipeline;

// Re-export commonly used types at crate root
pub use capture::{CaptureSession, ControllerConfig, FaultEvent, MockSession};
pub use controller::{
    AccessCompletion, CameraDelegate, CameraError, PreviewTarget, SessionController, SetupState,
    UiContext, WorkerQueue,
};
pub use orientation::{DeviceOrientation, ImageOrientation, InterfaceOrientation, PreviewRotation};
pub use pipeline::{CapturedImage, PhotoPipeline};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
