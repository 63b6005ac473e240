use std::fmt;

use crate::format::PixelFormat;

#[derive(Debug, Copy, Clone, PartialEq)]
/// Capability profile of a stream: resolution, frame rate and pixel encoding
pub struct VideoMode {
    /// width in pixels
    pub width: u32,
    /// height in pixels
    pub height: u32,
    /// nominal frames per second
    pub fps: f32,
    /// pixel encoding
    pub pixel_format: PixelFormat,
}

impl VideoMode {
    /// Returns a video mode
    ///
    /// Modes are normally reported by the driver. Constructing one by hand is only needed for
    /// synthetic sources, so the invariants are checked here: both dimensions must be non-zero
    /// and the frame rate must not be negative.
    ///
    /// # Arguments
    ///
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    /// * `fps` - Frames per second
    /// * `pixel_format` - Pixel encoding
    ///
    /// # Example
    ///
    /// ```
    /// use onireader::{PixelFormat, VideoMode};
    /// let mode = VideoMode::new(640, 480, 30.0, PixelFormat::Depth1Mm).unwrap();
    /// assert_eq!(mode.to_string(), "640x480 @ 30 fps (DEPTH_1MM)");
    /// ```
    pub fn new(width: u32, height: u32, fps: f32, pixel_format: PixelFormat) -> Option<Self> {
        if width == 0 || height == 0 || !(fps >= 0.0) {
            return None;
        }

        Some(VideoMode {
            width,
            height,
            fps,
            pixel_format,
        })
    }

    /// Size of one tightly packed frame in bytes, if the encoding has a fixed size
    pub fn frame_size(&self) -> Option<usize> {
        self.pixel_format
            .bytes_per_pixel()
            .map(|bpp| self.width as usize * self.height as usize * bpp)
    }
}

impl fmt::Display for VideoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} @ {} fps ({})",
            self.width, self.height, self.fps, self.pixel_format
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_modes() {
        assert!(VideoMode::new(0, 480, 30.0, PixelFormat::Rgb888).is_none());
        assert!(VideoMode::new(640, 0, 30.0, PixelFormat::Rgb888).is_none());
        assert!(VideoMode::new(640, 480, -1.0, PixelFormat::Rgb888).is_none());
        assert!(VideoMode::new(640, 480, f32::NAN, PixelFormat::Rgb888).is_none());
        assert!(VideoMode::new(640, 480, 0.0, PixelFormat::Rgb888).is_some());
    }

    #[test]
    fn frame_size_follows_encoding() {
        let depth = VideoMode::new(320, 240, 30.0, PixelFormat::Depth100Um).unwrap();
        assert_eq!(depth.frame_size(), Some(320 * 240 * 2));

        let jpeg = VideoMode::new(320, 240, 30.0, PixelFormat::Jpeg).unwrap();
        assert_eq!(jpeg.frame_size(), None);
    }

    #[test]
    fn display_includes_fractional_rates() {
        let mode = VideoMode::new(1280, 1024, 12.5, PixelFormat::Gray8).unwrap();
        assert_eq!(mode.to_string(), "1280x1024 @ 12.5 fps (GRAY8)");
    }
}
