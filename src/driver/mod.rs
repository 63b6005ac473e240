//! Sensor driver seam
//!
//! A session never talks to hardware directly. Everything it needs from the driver stack (device
//! discovery, stream creation, frame delivery and playback transport) goes through the traits in
//! this module. [`memory`] provides an in-process implementation, the `openni2` feature adds a
//! binding to the OpenNI2 runtime.

use std::{fmt, io};

use crate::format::PixelFormat;
use crate::mode::VideoMode;
use crate::sensor::{FieldOfView, Registration, SensorKind};

pub mod memory;

#[cfg(feature = "openni2")]
pub mod openni;

/// Device description as reported by the driver
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// URI used to open the device (a file path for recordings)
    pub uri: String,
    /// Vendor name
    pub vendor: String,
    /// Device name
    pub name: String,
    /// USB vendor id, zero for recordings
    pub usb_vendor_id: u16,
    /// USB product id, zero for recordings
    pub usb_product_id: u16,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "URI     : {}", self.uri)?;
        writeln!(f, "Vendor  : {}", self.vendor)?;
        writeln!(f, "Name    : {}", self.name)?;
        writeln!(
            f,
            "USB     : {:04x}:{:04x}",
            self.usb_vendor_id, self.usb_product_id
        )?;
        Ok(())
    }
}

/// A frame as handed out by the driver
///
/// The payload is owned by the driver and only valid until the next read on the same stream,
/// which the borrow on the stream enforces.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    /// Raw pixel payload
    pub data: &'a [u8],
    /// width in pixels
    pub width: u32,
    /// height in pixels
    pub height: u32,
    /// bytes per row as reported by the driver, zero if unknown
    pub stride: usize,
    /// driver clock, microseconds for OpenNI2
    pub timestamp: u64,
    /// sequence number of the frame within its stream
    pub frame_index: i64,
    /// pixel encoding, if the driver reported one
    pub pixel_format: Option<PixelFormat>,
}

/// Driver runtime
pub trait Driver {
    type Device: Device;

    /// Initializes the process-wide driver runtime
    ///
    /// Implementations must be idempotent: every session calls this on creation.
    fn initialize(&self) -> io::Result<()>;

    /// Returns the devices currently known to the driver
    fn devices(&self) -> io::Result<Vec<DeviceInfo>>;

    /// Binds a device
    ///
    /// # Arguments
    ///
    /// * `uri` - Device URI or recording path, `None` for any available device
    fn open(&self, uri: Option<&str>) -> io::Result<Self::Device>;
}

/// Bound device handle
///
/// Dropping the handle must release it, whether or not [`Device::close`] was called.
pub trait Device {
    type Stream: Stream;
    type Playback: Playback<Stream = Self::Stream>;

    /// Returns the driver's description of this device
    fn info(&self) -> io::Result<DeviceInfo>;

    /// Returns the supported modes of a sensor in driver order, `None` if there is no such sensor
    fn sensor_modes(&self, kind: SensorKind) -> Option<Vec<VideoMode>>;

    /// Creates a stream for the given sensor
    ///
    /// The stream is not started.
    fn create_stream(&mut self, kind: SensorKind) -> io::Result<Self::Stream>;

    /// Sets the spatial registration between depth and color
    fn set_registration(&mut self, mode: Registration) -> io::Result<()>;

    /// Returns the playback control of a recorded source, `None` for live devices
    fn playback(&self) -> Option<Self::Playback>;

    /// Releases the device
    ///
    /// Calling this more than once must be harmless.
    fn close(&mut self) -> io::Result<()>;
}

/// Stream of frames from one sensor
///
/// Dropping a stream must stop and destroy it.
pub trait Stream {
    /// Returns the mode the stream is configured for
    fn video_mode(&self) -> io::Result<VideoMode>;

    /// Configures the stream mode
    ///
    /// # Arguments
    ///
    /// * `mode` - One of the modes reported for the stream's sensor
    fn set_video_mode(&mut self, mode: &VideoMode) -> io::Result<()>;

    /// Start streaming
    fn start(&mut self) -> io::Result<()>;

    /// Stop streaming, a no-op for streams that are not running
    fn stop(&mut self) -> io::Result<()>;

    /// Pulls the next frame, blocking until one is ready
    ///
    /// Returns `Ok(None)` if the driver hands out an invalid frame, e.g. a dropped frame on a
    /// live sensor or the end of a recording.
    fn read_frame(&mut self) -> io::Result<Option<RawFrame<'_>>>;

    /// Returns the field of view of the sensor
    fn field_of_view(&self) -> io::Result<FieldOfView>;

    /// Returns the largest pixel value the stream can produce
    fn max_value(&self) -> io::Result<i32>;
}

/// Transport control of a recorded source
pub trait Playback {
    type Stream;

    /// Sets the playback speed as a ratio of the recording speed
    ///
    /// `-1.0` delivers one frame per read, `0.0` plays as fast as possible.
    fn set_speed(&mut self, speed: f32) -> io::Result<()>;

    /// Returns the number of frames the recording holds for a stream
    fn frame_count(&self, stream: &Self::Stream) -> io::Result<i64>;

    /// Moves the read cursor of a stream to a frame
    fn seek(&mut self, stream: &mut Self::Stream, index: i64) -> io::Result<()>;
}
