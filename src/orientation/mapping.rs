//! Pure orientation mappings.
//!
//! The image mapping is cross-wired relative to the preview mapping: the
//! sensor is mounted rotated against the interface, so a device held in
//! portrait produces a buffer that must be tagged `Right` to display upright.

use serde::{Deserialize, Serialize};

/// Physical orientation reported by the device's rotation sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceOrientation {
    #[default]
    Unknown,
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    FaceUp,
    FaceDown,
}

impl DeviceOrientation {
    /// Every reading the rotation sensor can produce.
    pub const ALL: [DeviceOrientation; 7] = [
        DeviceOrientation::Unknown,
        DeviceOrientation::Portrait,
        DeviceOrientation::PortraitUpsideDown,
        DeviceOrientation::LandscapeLeft,
        DeviceOrientation::LandscapeRight,
        DeviceOrientation::FaceUp,
        DeviceOrientation::FaceDown,
    ];

    /// Returns true when the device is lying flat.
    ///
    /// Flat readings carry no information about how the user frames the
    /// shot and must never replace a previously latched sample.
    #[inline]
    pub fn is_flat(self) -> bool {
        matches!(self, DeviceOrientation::FaceUp | DeviceOrientation::FaceDown)
    }
}

/// Orientation of the hosting user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceOrientation {
    #[default]
    Unknown,
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// Orientation tag stamped on a decoded bitmap.
///
/// Names the rotation already present in the pixel data, following the
/// EXIF convention: `Right` means the stored image is rotated 90° and must
/// be turned clockwise to display upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrientation {
    Up,
    Down,
    Left,
    Right,
}

/// Rotation applied to the live preview feed and to the photo output
/// connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewRotation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// Maps a raw device rotation sample to the image orientation tag.
///
/// A missing sample, `Unknown`, `Portrait` and the flat readings all fall
/// back to `Right`, the natural orientation of a portrait-held device.
pub fn image_orientation(sample: Option<DeviceOrientation>) -> ImageOrientation {
    match sample {
        Some(DeviceOrientation::LandscapeLeft) => ImageOrientation::Up,
        Some(DeviceOrientation::LandscapeRight) => ImageOrientation::Down,
        Some(DeviceOrientation::PortraitUpsideDown) => ImageOrientation::Left,
        _ => ImageOrientation::Right,
    }
}

/// Maps the interface orientation to the preview rotation (identity, with
/// `Unknown` treated as portrait).
pub fn preview_rotation(interface: InterfaceOrientation) -> PreviewRotation {
    match interface {
        InterfaceOrientation::Portrait | InterfaceOrientation::Unknown => PreviewRotation::Portrait,
        InterfaceOrientation::LandscapeLeft => PreviewRotation::LandscapeLeft,
        InterfaceOrientation::LandscapeRight => PreviewRotation::LandscapeRight,
        InterfaceOrientation::PortraitUpsideDown => PreviewRotation::PortraitUpsideDown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_orientation_table() {
        use DeviceOrientation::*;

        let expected = [
            (Unknown, ImageOrientation::Right),
            (Portrait, ImageOrientation::Right),
            (PortraitUpsideDown, ImageOrientation::Left),
            (LandscapeLeft, ImageOrientation::Up),
            (LandscapeRight, ImageOrientation::Down),
            (FaceUp, ImageOrientation::Right),
            (FaceDown, ImageOrientation::Right),
        ];

        for (sample, tag) in expected {
            assert_eq!(image_orientation(Some(sample)), tag, "sample {:?}", sample);
        }
    }

    #[test]
    fn test_missing_sample_defaults_to_right() {
        assert_eq!(image_orientation(None), ImageOrientation::Right);
    }

    #[test]
    fn test_preview_rotation_is_identity() {
        assert_eq!(
            preview_rotation(InterfaceOrientation::Unknown),
            PreviewRotation::Portrait
        );
        assert_eq!(
            preview_rotation(InterfaceOrientation::Portrait),
            PreviewRotation::Portrait
        );
        assert_eq!(
            preview_rotation(InterfaceOrientation::LandscapeLeft),
            PreviewRotation::LandscapeLeft
        );
        assert_eq!(
            preview_rotation(InterfaceOrientation::LandscapeRight),
            PreviewRotation::LandscapeRight
        );
        assert_eq!(
            preview_rotation(InterfaceOrientation::PortraitUpsideDown),
            PreviewRotation::PortraitUpsideDown
        );
    }

    #[test]
    fn test_only_face_readings_are_flat() {
        let flat: Vec<_> = DeviceOrientation::ALL
            .iter()
            .filter(|o| o.is_flat())
            .collect();
        assert_eq!(
            flat,
            vec![&DeviceOrientation::FaceUp, &DeviceOrientation::FaceDown]
        );
    }
}
