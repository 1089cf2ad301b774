//! Encoded still-image buffer as delivered by the hardware.

use std::time::Instant;

/// An encoded still image (JPEG or PNG) returned by a capture request.
#[derive(Clone)]
pub struct EncodedPhoto {
    /// Encoded bytes.
    data: Vec<u8>,
    /// Time the hardware finished processing the photo.
    timestamp: Instant,
    /// Monotonic capture sequence number assigned by the session.
    sequence: u64,
}

impl EncodedPhoto {
    pub fn new(data: Vec<u8>, sequence: u64) -> Self {
        Self {
            data,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Returns the encoded bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for EncodedPhoto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedPhoto")
            .field("sequence", &self.sequence)
            .field("encoded_bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_payload() {
        let photo = EncodedPhoto::new(vec![0xFF; 4096], 7);
        let debug = format!("{:?}", photo);

        assert!(debug.contains("encoded_bytes: 4096"));
        assert!(debug.contains("sequence: 7"));
        assert!(!photo.is_empty());
    }
}
