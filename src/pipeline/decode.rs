//! Decoding encoded photo buffers into oriented bitmaps.

use crate::capture::EncodedPhoto;
use crate::orientation::ImageOrientation;
use chrono::{DateTime, Utc};
use image::DynamicImage;
use thiserror::Error;

/// Errors raised while decoding a photo buffer.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("photo buffer is empty")]
    EmptyBuffer,
    #[error("failed to decode photo: {0}")]
    Malformed(#[from] image::ImageError),
}

/// A decoded photo with its orientation tag.
#[derive(Clone)]
pub struct CapturedImage {
    bitmap: DynamicImage,
    orientation: ImageOrientation,
    request_id: u64,
    captured_at: DateTime<Utc>,
}

impl CapturedImage {
    /// The decoded pixels, as stored by the sensor.
    #[inline]
    pub fn bitmap(&self) -> &DynamicImage {
        &self.bitmap
    }

    #[inline]
    pub fn orientation(&self) -> ImageOrientation {
        self.orientation
    }

    /// Identifier of the capture request this image answers.
    #[inline]
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    /// Returns the bitmap rotated so that it displays upright.
    pub fn upright(&self) -> DynamicImage {
        match self.orientation {
            ImageOrientation::Up => self.bitmap.clone(),
            ImageOrientation::Right => self.bitmap.rotate90(),
            ImageOrientation::Down => self.bitmap.rotate180(),
            ImageOrientation::Left => self.bitmap.rotate270(),
        }
    }

    pub fn into_bitmap(self) -> DynamicImage {
        self.bitmap
    }
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("width", &self.bitmap.width())
            .field("height", &self.bitmap.height())
            .field("orientation", &self.orientation)
            .field("request_id", &self.request_id)
            .finish()
    }
}

pub(super) fn decode(
    photo: &EncodedPhoto,
    orientation: ImageOrientation,
    request_id: u64,
) -> Result<CapturedImage, DecodeError> {
    if photo.is_empty() {
        return Err(DecodeError::EmptyBuffer);
    }

    let bitmap = image::load_from_memory(photo.data())?;

    tracing::debug!(
        sequence = photo.sequence(),
        width = bitmap.width(),
        height = bitmap.height(),
        ?orientation,
        request_id,
        "Decoded photo"
    );

    Ok(CapturedImage {
        bitmap,
        orientation,
        request_id,
        captured_at: Utc::now(),
    })
}
