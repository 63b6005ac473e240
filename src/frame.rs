use std::convert::TryFrom;
use std::fmt;

use log::trace;

use crate::driver::RawFrame;
use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::sensor::SensorKind;

/// Decoded frame owned by the caller
///
/// The pixel payload is a tightly packed copy of what the driver produced: no re-encoding, no
/// color conversion and no scaling. Depth frames are `height x width` single channel images in
/// the native depth encoding (usually 16 bit), color frames are `height x width x 3` interleaved
/// bytes.
///
/// A read that yields no frame returns the empty sentinel instead: no pixels, an empty shape and
/// `timestamp() == frame_index() == -1`. Check [`FrameBuffer::is_empty`] before using a frame.
#[derive(Clone, PartialEq)]
pub struct FrameBuffer {
    kind: SensorKind,
    pixels: Vec<u8>,
    shape: [usize; 3],
    strides: [usize; 3],
    ndim: usize,
    timestamp: i64,
    frame_index: i64,
    pixel_format: Option<PixelFormat>,
}

impl FrameBuffer {
    /// Returns the "no frame available" sentinel for a stream
    ///
    /// # Example
    ///
    /// ```
    /// use onireader::{FrameBuffer, SensorKind};
    ///
    /// let frame = FrameBuffer::empty(SensorKind::Depth);
    /// assert!(frame.is_empty());
    /// assert_eq!(frame.timestamp(), -1);
    /// assert_eq!(frame.frame_index(), -1);
    /// ```
    pub fn empty(kind: SensorKind) -> Self {
        FrameBuffer {
            kind,
            pixels: Vec::new(),
            shape: [0; 3],
            strides: [0; 3],
            ndim: 0,
            timestamp: -1,
            frame_index: -1,
            pixel_format: None,
        }
    }

    /// Copies a driver frame into a caller owned buffer
    ///
    /// The layout is derived from the reported width and height, not from the payload size. A
    /// payload padded to the driver's row stride is repacked; any other size mismatch is a
    /// [`Error::FrameDecode`].
    ///
    /// # Arguments
    ///
    /// * `kind` - Stream the frame was read from
    /// * `raw` - Frame as handed out by the driver
    ///
    /// # Example
    ///
    /// ```
    /// use onireader::driver::RawFrame;
    /// use onireader::{FrameBuffer, SensorKind};
    ///
    /// let data = vec![0u8; 4 * 2 * 3];
    /// let raw = RawFrame {
    ///     data: &data,
    ///     width: 4,
    ///     height: 2,
    ///     stride: 0,
    ///     timestamp: 33_000,
    ///     frame_index: 1,
    ///     pixel_format: None,
    /// };
    /// let frame = FrameBuffer::from_raw(SensorKind::Color, &raw).unwrap();
    /// assert_eq!(frame.shape(), &[2, 4, 3]);
    /// assert_eq!(frame.row_stride(), 12);
    /// ```
    pub fn from_raw(kind: SensorKind, raw: &RawFrame<'_>) -> Result<Self> {
        let width = raw.width as usize;
        let height = raw.height as usize;

        let (channels, element_size) = match kind {
            SensorKind::Depth => (1, raw.pixel_format.map_or(Some(2), |f| f.bytes_per_pixel())),
            SensorKind::Color => match raw.pixel_format {
                Some(format) if format.is_compressed() => (3, None),
                _ => (3, Some(1)),
            },
        };

        let decode_error = |expected: usize| Error::FrameDecode {
            kind,
            width: raw.width,
            height: raw.height,
            expected,
            actual: raw.data.len(),
        };

        // compressed payloads cannot be laid out as a pixel grid
        let element_size = match element_size {
            Some(size) => size,
            None => {
                return Err(decode_error(
                    width.saturating_mul(height).saturating_mul(channels),
                ))
            }
        };

        // geometry comes from the driver, an overflowing size is a corrupt frame
        let row = width
            .checked_mul(channels)
            .and_then(|n| n.checked_mul(element_size));
        let expected = row.and_then(|row| row.checked_mul(height));
        let (row, expected) = match (row, expected) {
            (Some(row), Some(expected)) if expected > 0 => (row, expected),
            _ => return Err(decode_error(expected.unwrap_or(usize::MAX))),
        };

        let pixels = if raw.data.len() == expected {
            raw.data.to_vec()
        } else if raw.stride > row && raw.stride.checked_mul(height) == Some(raw.data.len()) {
            trace!("repacking {} frame rows from {} to {} bytes", kind, raw.stride, row);
            let mut pixels = Vec::with_capacity(expected);
            for line in raw.data.chunks_exact(raw.stride) {
                pixels.extend_from_slice(&line[..row]);
            }
            pixels
        } else {
            return Err(decode_error(expected));
        };

        let (shape, strides, ndim) = match kind {
            SensorKind::Depth => ([height, width, 0], [row, element_size, 0], 2),
            SensorKind::Color => ([height, width, 3], [row, 3, 1], 3),
        };

        Ok(FrameBuffer {
            kind,
            pixels,
            shape,
            strides,
            ndim,
            timestamp: i64::try_from(raw.timestamp).unwrap_or(i64::MAX),
            frame_index: raw.frame_index,
            pixel_format: raw.pixel_format,
        })
    }

    /// Whether this is the "no frame available" sentinel
    pub fn is_empty(&self) -> bool {
        self.ndim == 0
    }

    /// Converts the sentinel into `None`
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    /// Stream the frame was read from
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Raw pixel bytes, row-major and tightly packed
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    /// Takes ownership of the pixel bytes
    pub fn into_data(self) -> Vec<u8> {
        self.pixels
    }

    /// Size of the payload in bytes
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// `[height, width]` for depth, `[height, width, 3]` for color, empty for the sentinel
    pub fn shape(&self) -> &[usize] {
        &self.shape[..self.ndim]
    }

    /// Byte distance between consecutive elements along each axis of [`FrameBuffer::shape`]
    pub fn strides(&self) -> &[usize] {
        &self.strides[..self.ndim]
    }

    pub fn width(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.shape[1]
        }
    }

    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.shape[0]
        }
    }

    /// Bytes per row
    pub fn row_stride(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.strides[0]
        }
    }

    /// Size of one sample in bytes
    pub fn element_size(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.strides[self.ndim - 1]
        }
    }

    /// Driver clock at capture time, `-1` for the sentinel
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Sequence number within the stream, `-1` for the sentinel
    pub fn frame_index(&self) -> i64 {
        self.frame_index
    }

    /// Pixel encoding reported by the driver
    pub fn pixel_format(&self) -> Option<PixelFormat> {
        self.pixel_format
    }

    /// Returns the bytes of the pixel at `(x, y)`
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }

        let size = self.strides[1];
        let offset = y * self.row_stride() + x * size;
        self.pixels.get(offset..offset + size)
    }

    /// Decodes a 16 bit depth frame into samples
    ///
    /// Returns `None` for color frames, the sentinel and 8 bit encodings.
    pub fn depth_values(&self) -> Option<Vec<u16>> {
        if self.kind != SensorKind::Depth || self.is_empty() || self.element_size() != 2 {
            return None;
        }

        Some(
            self.pixels
                .chunks_exact(2)
                .map(|b| u16::from_ne_bytes([b[0], b[1]]))
                .collect(),
        )
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("kind", &self.kind)
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("timestamp", &self.timestamp)
            .field("frame_index", &self.frame_index)
            .field("pixel_format", &self.pixel_format)
            .field("len", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(data: &[u8], width: u32, height: u32, stride: usize) -> RawFrame<'_> {
        RawFrame {
            data,
            width,
            height,
            stride,
            timestamp: 1234,
            frame_index: 7,
            pixel_format: None,
        }
    }

    #[test]
    fn color_shape_and_strides() {
        for &(w, h) in &[(1u32, 1u32), (4, 3), (640, 480), (7, 13)] {
            let data = vec![0u8; (w * h * 3) as usize];
            let frame = FrameBuffer::from_raw(SensorKind::Color, &raw(&data, w, h, 0)).unwrap();
            assert_eq!(frame.shape(), &[h as usize, w as usize, 3]);
            assert_eq!(frame.strides(), &[w as usize * 3, 3, 1]);
            assert_eq!(frame.row_stride(), w as usize * 3);
            assert_eq!(frame.element_size(), 1);
        }
    }

    #[test]
    fn depth_shape_and_strides() {
        for &(w, h) in &[(1u32, 1u32), (4, 3), (320, 240)] {
            let data = vec![0u8; (w * h * 2) as usize];
            let mut frame = raw(&data, w, h, 0);
            frame.pixel_format = Some(PixelFormat::Depth1Mm);
            let frame = FrameBuffer::from_raw(SensorKind::Depth, &frame).unwrap();
            assert_eq!(frame.shape(), &[h as usize, w as usize]);
            assert_eq!(frame.strides(), &[w as usize * 2, 2]);
            assert_eq!(frame.element_size(), 2);
        }
    }

    #[test]
    fn eight_bit_depth_uses_single_byte_elements() {
        let data = vec![0u8; 6];
        let mut frame = raw(&data, 3, 2, 0);
        frame.pixel_format = Some(PixelFormat::Gray8);
        let frame = FrameBuffer::from_raw(SensorKind::Depth, &frame).unwrap();
        assert_eq!(frame.row_stride(), 3);
        assert_eq!(frame.element_size(), 1);
        assert!(frame.depth_values().is_none());
    }

    #[test]
    fn payload_is_copied() {
        let mut data = vec![1u8, 0, 2, 0, 3, 0, 4, 0];
        let frame = FrameBuffer::from_raw(SensorKind::Depth, &raw(&data, 2, 2, 0)).unwrap();
        data.iter_mut().for_each(|b| *b = 0xff);

        assert_eq!(frame.depth_values().unwrap(), vec![
            u16::from_ne_bytes([1, 0]),
            u16::from_ne_bytes([2, 0]),
            u16::from_ne_bytes([3, 0]),
            u16::from_ne_bytes([4, 0]),
        ]);
        assert_eq!(frame.timestamp(), 1234);
        assert_eq!(frame.frame_index(), 7);
    }

    #[test]
    fn padded_rows_are_repacked() {
        // 2x2 color frame, rows padded to 8 bytes
        let data: [u8; 16] = [1, 2, 3, 4, 5, 6, 0xee, 0xee, 7, 8, 9, 10, 11, 12, 0xee, 0xee];
        let frame = FrameBuffer::from_raw(SensorKind::Color, &raw(&data, 2, 2, 8)).unwrap();
        assert_eq!(frame.data(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        assert_eq!(frame.row_stride(), 6);
        assert_eq!(frame.pixel(1, 1), Some(&[10u8, 11, 12][..]));
    }

    #[test]
    fn size_mismatch_is_a_decode_error() {
        let data = vec![0u8; 4 * 3 * 3 - 1];
        match FrameBuffer::from_raw(SensorKind::Color, &raw(&data, 4, 3, 0)) {
            Err(Error::FrameDecode {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 36);
                assert_eq!(actual, 35);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        // a two byte color encoding does not fit the three channel layout
        let data = vec![0u8; 4 * 3 * 2];
        let mut frame = raw(&data, 4, 3, 0);
        frame.pixel_format = Some(PixelFormat::Yuyv);
        assert!(FrameBuffer::from_raw(SensorKind::Color, &frame).is_err());
    }

    #[test]
    fn compressed_and_degenerate_frames_are_rejected() {
        let data = vec![0u8; 100];
        let mut frame = raw(&data, 10, 10, 0);
        frame.pixel_format = Some(PixelFormat::Jpeg);
        assert!(FrameBuffer::from_raw(SensorKind::Color, &frame).is_err());

        let frame = raw(&[], 0, 0, 0);
        assert!(FrameBuffer::from_raw(SensorKind::Depth, &frame).is_err());
    }

    #[test]
    fn overflowing_geometry_is_a_decode_error() {
        let data = [0u8; 16];
        for &kind in SensorKind::ALL.iter() {
            match FrameBuffer::from_raw(kind, &raw(&data, u32::MAX, u32::MAX, 0)) {
                Err(Error::FrameDecode {
                    expected, actual, ..
                }) => {
                    assert_eq!(expected, usize::MAX);
                    assert_eq!(actual, 16);
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }

        // a huge stride must not wrap around to the payload size
        let frame = raw(&data, 2, u32::MAX, usize::MAX / 2 + 1);
        assert!(FrameBuffer::from_raw(SensorKind::Depth, &frame).is_err());
    }

    #[test]
    fn sentinel_has_no_geometry() {
        let frame = FrameBuffer::empty(SensorKind::Color);
        assert!(frame.is_empty());
        assert!(frame.shape().is_empty());
        assert_eq!(frame.len(), 0);
        assert_eq!(frame.row_stride(), 0);
        assert_eq!(frame.pixel(0, 0), None);
        assert!(frame.into_option().is_none());
    }
}
