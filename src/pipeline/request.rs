//! Per-capture request state.

use crate::orientation::{ImageOrientation, PreviewRotation};
use chrono::{DateTime, Utc};

/// Orientation snapshot for one in-flight capture.
///
/// Created when the capture is requested and consumed when its result is
/// decoded, so later rotation updates cannot affect an image already on
/// its way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    id: u64,
    image_orientation: ImageOrientation,
    output_rotation: PreviewRotation,
    requested_at: DateTime<Utc>,
}

impl CaptureRequest {
    pub fn new(
        id: u64,
        image_orientation: ImageOrientation,
        output_rotation: PreviewRotation,
    ) -> Self {
        Self {
            id,
            image_orientation,
            output_rotation,
            requested_at: Utc::now(),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Tag stamped on the decoded image.
    #[inline]
    pub fn image_orientation(&self) -> ImageOrientation {
        self.image_orientation
    }

    /// Rotation applied to the photo output connection.
    #[inline]
    pub fn output_rotation(&self) -> PreviewRotation {
        self.output_rotation
    }

    #[inline]
    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }
}
