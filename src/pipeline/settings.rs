//! Capture settings.

/// Pixel formats a device may offer for the embedded preview image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Bgra32,
    Yuv420BiPlanarVideoRange,
    Yuv420BiPlanarFullRange,
    /// Any other format, by FourCC code.
    Other(u32),
}

/// Settings for one still capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhotoSettings {
    /// Request the highest resolution the output supports.
    pub high_resolution: bool,
    /// Format of the embedded preview image, if one is requested.
    pub preview_format: Option<PixelFormat>,
}
