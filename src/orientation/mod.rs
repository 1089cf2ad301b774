//! Orientation handling for preview and still capture.
//!
//! Two independent mappings live here: raw device rotation to the tag
//! stamped on decoded images, and interface orientation to the rotation
//! applied to the live preview. The latch keeps the last non-flat device
//! rotation reported by the host's rotation feed.

mod latch;
mod mapping;

pub use latch::OrientationLatch;
pub use mapping::{
    image_orientation, preview_rotation, DeviceOrientation, ImageOrientation,
    InterfaceOrientation, PreviewRotation,
};
