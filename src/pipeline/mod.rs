//! Still-photo pipeline.
//!
//! Builds the settings for a capture request and turns the encoded
//! buffer the hardware returns into an oriented bitmap. The orientation
//! applied at decode time is the one snapshotted when the capture was
//! requested, carried by [`CaptureRequest`].

mod decode;
mod request;
mod settings;

pub use decode::{CapturedImage, DecodeError};
pub use request::CaptureRequest;
pub use settings::{PhotoSettings, PixelFormat};

use crate::capture::EncodedPhoto;

/// Settings construction and decoding for still captures.
pub struct PhotoPipeline;

impl PhotoPipeline {
    /// Builds capture settings: highest resolution, and the first
    /// advertised preview pixel format for the embedded preview image.
    pub fn build_settings(available_preview_formats: &[PixelFormat]) -> PhotoSettings {
        let settings = PhotoSettings {
            high_resolution: true,
            preview_format: available_preview_formats.first().copied(),
        };
        tracing::trace!(?settings, "Built photo settings");
        settings
    }

    /// Decodes `photo` and stamps it with the request's orientation.
    pub fn decode(
        photo: &EncodedPhoto,
        request: &CaptureRequest,
    ) -> Result<CapturedImage, DecodeError> {
        decode::decode(photo, request.image_orientation(), request.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::{ImageOrientation, PreviewRotation};

    #[test]
    fn test_settings_pick_first_preview_format() {
        let settings = PhotoPipeline::build_settings(&[
            PixelFormat::Yuv420BiPlanarVideoRange,
            PixelFormat::Bgra32,
        ]);

        assert!(settings.high_resolution);
        assert_eq!(
            settings.preview_format,
            Some(PixelFormat::Yuv420BiPlanarVideoRange)
        );
    }

    #[test]
    fn test_settings_without_preview_formats() {
        let settings = PhotoPipeline::build_settings(&[]);

        assert!(settings.high_resolution);
        assert_eq!(settings.preview_format, None);
    }

    #[test]
    fn test_decode_uses_request_orientation() {
        let request = CaptureRequest::new(1, ImageOrientation::Down, PreviewRotation::Portrait);
        let photo = EncodedPhoto::new(decode::tests::png_bytes(8, 4), 1);

        let image = PhotoPipeline::decode(&photo, &request).unwrap();
        assert_eq!(image.orientation(), ImageOrientation::Down);
        assert_eq!(image.request_id(), 1);
    }
}
