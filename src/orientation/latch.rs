//! Last-known-good device orientation.

use super::mapping::{image_orientation, DeviceOrientation, ImageOrientation};
use std::sync::{Mutex, PoisonError};

/// Holds the last non-flat orientation reported by the rotation feed.
///
/// Written from whatever thread the host delivers rotation updates on and
/// read when a capture is requested.
#[derive(Debug, Default)]
pub struct OrientationLatch {
    sample: Mutex<Option<DeviceOrientation>>,
}

impl OrientationLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a rotation sample.
    ///
    /// Returns false, leaving the latch untouched, when the sample is flat.
    pub fn update(&self, orientation: DeviceOrientation) -> bool {
        if orientation.is_flat() {
            tracing::trace!(?orientation, "Ignoring flat orientation sample");
            return false;
        }

        let mut sample = self.sample.lock().unwrap_or_else(PoisonError::into_inner);
        *sample = Some(orientation);
        true
    }

    /// Returns the latched sample, if any has been recorded.
    pub fn current(&self) -> Option<DeviceOrientation> {
        *self.sample.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the image orientation for the latched sample.
    pub fn image_orientation(&self) -> ImageOrientation {
        image_orientation(self.current())
    }
}
