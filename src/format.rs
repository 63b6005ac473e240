use std::convert::TryFrom;
use std::fmt;

/// Pixel encoding of a video stream
///
/// The discriminants match the codes used by the OpenNI2 driver API.
#[allow(clippy::unreadable_literal)]
#[rustfmt::skip]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Depth in millimeters, 16 bit
    Depth1Mm            = 100,
    /// Depth in units of 100 micrometers, 16 bit
    Depth100Um          = 101,
    /// Packed raw disparity shift (9.2 fixed point), 16 bit
    Shift92             = 102,
    /// Packed raw disparity shift (9.3 fixed point), 16 bit
    Shift93             = 103,

    /// Interleaved 8 bit red, green and blue
    Rgb888              = 200,
    /// UYVY ordered 4:2:2
    Yuv422              = 201,
    Gray8               = 202,
    Gray16              = 203,
    /// Compressed, frame size varies
    Jpeg                = 204,
    /// YUYV ordered 4:2:2
    Yuyv                = 205,
}

impl PixelFormat {
    /// Returns the size of a single pixel in bytes
    ///
    /// Compressed encodings have no fixed element size, so `None` is returned for them.
    ///
    /// # Example
    ///
    /// ```
    /// use onireader::PixelFormat;
    ///
    /// assert_eq!(PixelFormat::Depth1Mm.bytes_per_pixel(), Some(2));
    /// assert_eq!(PixelFormat::Rgb888.bytes_per_pixel(), Some(3));
    /// assert_eq!(PixelFormat::Jpeg.bytes_per_pixel(), None);
    /// ```
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            PixelFormat::Depth1Mm
            | PixelFormat::Depth100Um
            | PixelFormat::Shift92
            | PixelFormat::Shift93
            | PixelFormat::Gray16
            | PixelFormat::Yuv422
            | PixelFormat::Yuyv => Some(2),
            PixelFormat::Rgb888 => Some(3),
            PixelFormat::Gray8 => Some(1),
            PixelFormat::Jpeg => None,
        }
    }

    /// Whether the format carries depth (or raw disparity) samples
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            PixelFormat::Depth1Mm
                | PixelFormat::Depth100Um
                | PixelFormat::Shift92
                | PixelFormat::Shift93
        )
    }

    /// Whether the payload size depends on the frame content
    pub fn is_compressed(self) -> bool {
        self == PixelFormat::Jpeg
    }
}

impl TryFrom<u32> for PixelFormat {
    type Error = String;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            100 => Ok(PixelFormat::Depth1Mm),
            101 => Ok(PixelFormat::Depth100Um),
            102 => Ok(PixelFormat::Shift92),
            103 => Ok(PixelFormat::Shift93),
            200 => Ok(PixelFormat::Rgb888),
            201 => Ok(PixelFormat::Yuv422),
            202 => Ok(PixelFormat::Gray8),
            203 => Ok(PixelFormat::Gray16),
            204 => Ok(PixelFormat::Jpeg),
            205 => Ok(PixelFormat::Yuyv),
            code => Err(format!("Unknown pixel format: {}", code)),
        }
    }
}

impl From<PixelFormat> for u32 {
    fn from(format: PixelFormat) -> Self {
        format as u32
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PixelFormat::Depth1Mm => write!(f, "DEPTH_1MM"),
            PixelFormat::Depth100Um => write!(f, "DEPTH_100UM"),
            PixelFormat::Shift92 => write!(f, "SHIFT_9_2"),
            PixelFormat::Shift93 => write!(f, "SHIFT_9_3"),
            PixelFormat::Rgb888 => write!(f, "RGB888"),
            PixelFormat::Yuv422 => write!(f, "YUV422"),
            PixelFormat::Gray8 => write!(f, "GRAY8"),
            PixelFormat::Gray16 => write!(f, "GRAY16"),
            PixelFormat::Jpeg => write!(f, "JPEG"),
            PixelFormat::Yuyv => write!(f, "YUYV"),
        }
    }
}
