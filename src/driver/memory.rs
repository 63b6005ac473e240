//! In-process driver with synthetic devices
//!
//! Devices are registered up front, either as live sensors (endless frames, optional periodic
//! drops) or as recordings (fixed frame counts per stream, seekable). Pixel data is generated
//! deterministically from the frame index, so readers can check what they got.
//!
//! Every device can be observed through a [`Probe`], which reports the native resources the
//! device currently holds.
//!
//! # Example
//!
//! ```
//! use onireader::driver::memory::{MemoryDriver, Source};
//! use onireader::Session;
//!
//! let driver = MemoryDriver::new().with_device("file://demo.oni", Source::recorded(120, 100));
//! let mut session = Session::new(driver).unwrap();
//! session.open("file://demo.oni").unwrap();
//! session.start(None, None).unwrap();
//! assert_eq!(session.frame_count(), 120);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::{fmt, io};

use log::trace;

use crate::context::Runtime;
use crate::driver::{self, DeviceInfo, RawFrame};
use crate::format::PixelFormat;
use crate::mode::VideoMode;
use crate::sensor::{FieldOfView, Registration, SensorKind};

static RUNTIME: Runtime = Runtime::new();

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // state stays consistent across a panicking holder, every update is a single assignment
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

bitflags::bitflags! {
    /// Driver calls a synthetic device reports as failed
    #[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
    pub struct Faults : u32 {
        /// Setting the image registration fails
        const REGISTRATION      = 0x0001;
        /// Setting the playback speed of a recording fails
        const PLAYBACK_SPEED    = 0x0002;
        /// Stopping a stream reports an error, the stream still stops
        const STREAM_STOP       = 0x0004;
        /// Closing the device reports an error, the device is still released
        const DEVICE_CLOSE      = 0x0008;
    }
}

fn injected(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{} failed", what))
}

fn mode(width: u32, height: u32, fps: f32, pixel_format: PixelFormat) -> VideoMode {
    VideoMode {
        width,
        height,
        fps,
        pixel_format,
    }
}

/// Description of a synthetic device
#[derive(Debug, Clone)]
pub struct Source {
    name: String,
    recording: Option<[i64; 2]>,
    depth_modes: Vec<VideoMode>,
    color_modes: Vec<VideoMode>,
    drop_every: Option<u64>,
    row_padding: usize,
    payload_skew: isize,
    field_of_view: FieldOfView,
    max_depth: i32,
    faults: Faults,
}

impl Source {
    /// Returns a live sensor
    ///
    /// Live sensors have no playback control and produce frames forever.
    pub fn live() -> Self {
        Source {
            name: String::from("Synthetic sensor"),
            recording: None,
            depth_modes: vec![
                mode(640, 480, 30.0, PixelFormat::Depth1Mm),
                mode(320, 240, 30.0, PixelFormat::Depth1Mm),
                mode(640, 480, 30.0, PixelFormat::Depth100Um),
            ],
            color_modes: vec![
                mode(640, 480, 30.0, PixelFormat::Rgb888),
                mode(320, 240, 30.0, PixelFormat::Rgb888),
            ],
            drop_every: None,
            row_padding: 0,
            payload_skew: 0,
            field_of_view: FieldOfView {
                horizontal: 1.0226,
                vertical: 0.7959,
            },
            max_depth: 10_000,
            faults: Faults::empty(),
        }
    }

    /// Returns a recording
    ///
    /// The depth and color streams of a recording may hold different numbers of frames.
    ///
    /// # Arguments
    ///
    /// * `depth_frames` - Frames stored for the depth stream
    /// * `color_frames` - Frames stored for the color stream
    pub fn recorded(depth_frames: i64, color_frames: i64) -> Self {
        Source {
            name: String::from("Synthetic recording"),
            recording: Some([depth_frames.max(0), color_frames.max(0)]),
            ..Source::live()
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Replaces the depth modes, an empty list removes the depth sensor
    pub fn depth_modes(mut self, modes: Vec<VideoMode>) -> Self {
        self.depth_modes = modes;
        self
    }

    /// Replaces the color modes, an empty list removes the color sensor
    pub fn color_modes(mut self, modes: Vec<VideoMode>) -> Self {
        self.color_modes = modes;
        self
    }

    pub fn without_depth(self) -> Self {
        self.depth_modes(Vec::new())
    }

    pub fn without_color(self) -> Self {
        self.color_modes(Vec::new())
    }

    /// Hands out an invalid frame for every `n`th frame index
    pub fn drop_every(mut self, n: u64) -> Self {
        self.drop_every = if n == 0 { None } else { Some(n) };
        self
    }

    /// Pads every row of the payload with `bytes` zero bytes and reports the padded stride
    pub fn row_padding(mut self, bytes: usize) -> Self {
        self.row_padding = bytes;
        self
    }

    /// Grows (positive) or truncates (negative) every payload, producing inconsistent frames
    pub fn payload_skew(mut self, bytes: isize) -> Self {
        self.payload_skew = bytes;
        self
    }

    pub fn field_of_view(mut self, fov: FieldOfView) -> Self {
        self.field_of_view = fov;
        self
    }

    pub fn max_depth(mut self, value: i32) -> Self {
        self.max_depth = value;
        self
    }

    /// Makes the given driver calls fail
    pub fn fail(mut self, faults: Faults) -> Self {
        self.faults |= faults;
        self
    }

    fn modes(&self, kind: SensorKind) -> &[VideoMode] {
        match kind {
            SensorKind::Depth => &self.depth_modes,
            SensorKind::Color => &self.color_modes,
        }
    }

    fn frame_total(&self, kind: SensorKind) -> Option<i64> {
        self.recording.map(|[depth, color]| match kind {
            SensorKind::Depth => depth,
            SensorKind::Color => color,
        })
    }
}

#[derive(Debug)]
struct DeviceState {
    open: bool,
    opened: usize,
    registration: Registration,
    speed: Option<f32>,
    streams: usize,
    active: usize,
}

impl Default for DeviceState {
    fn default() -> Self {
        DeviceState {
            open: false,
            opened: 0,
            registration: Registration::Off,
            speed: None,
            streams: 0,
            active: 0,
        }
    }
}

struct Entry {
    uri: String,
    source: Arc<Source>,
    state: Arc<Mutex<DeviceState>>,
}

/// Driver over a set of synthetic devices
///
/// Clones share the same devices, so a test can keep one clone for probing while a session owns
/// another.
#[derive(Clone, Default)]
pub struct MemoryDriver {
    devices: Arc<Mutex<Vec<Entry>>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        MemoryDriver::default()
    }

    /// Registers a device and returns the driver
    pub fn with_device(self, uri: &str, source: Source) -> Self {
        self.add(uri, source);
        self
    }

    /// Registers a device
    ///
    /// Devices are handed out in registration order when any device is requested.
    pub fn add(&self, uri: &str, source: Source) {
        lock(&self.devices).push(Entry {
            uri: uri.to_string(),
            source: Arc::new(source),
            state: Arc::new(Mutex::new(DeviceState::default())),
        });
    }

    /// Returns an observer for a registered device
    pub fn probe(&self, uri: &str) -> Option<Probe> {
        lock(&self.devices)
            .iter()
            .find(|entry| entry.uri == uri)
            .map(|entry| Probe {
                state: Arc::clone(&entry.state),
            })
    }
}

impl driver::Driver for MemoryDriver {
    type Device = MemoryDevice;

    fn initialize(&self) -> io::Result<()> {
        RUNTIME.initialize(|| Ok(()), None)
    }

    fn devices(&self) -> io::Result<Vec<DeviceInfo>> {
        Ok(lock(&self.devices)
            .iter()
            .map(|entry| info(&entry.uri, &entry.source))
            .collect())
    }

    fn open(&self, uri: Option<&str>) -> io::Result<MemoryDevice> {
        let devices = lock(&self.devices);
        let entry = match uri {
            Some(uri) => devices.iter().find(|entry| entry.uri == uri),
            None => devices.first(),
        };
        let entry = entry.ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "no such device")
        })?;

        let mut state = lock(&entry.state);
        if state.open {
            return Err(io::Error::new(io::ErrorKind::Other, "device is busy"));
        }
        state.open = true;
        state.opened += 1;
        trace!("opened synthetic device {}", entry.uri);

        Ok(MemoryDevice {
            uri: entry.uri.clone(),
            source: Arc::clone(&entry.source),
            state: Arc::clone(&entry.state),
            closed: false,
        })
    }
}

fn info(uri: &str, source: &Source) -> DeviceInfo {
    DeviceInfo {
        uri: uri.to_string(),
        vendor: String::from("onireader"),
        name: source.name.clone(),
        usb_vendor_id: 0,
        usb_product_id: 0,
    }
}

/// Bound synthetic device
pub struct MemoryDevice {
    uri: String,
    source: Arc<Source>,
    state: Arc<Mutex<DeviceState>>,
    closed: bool,
}

impl MemoryDevice {
    fn ensure_open(&self) -> io::Result<()> {
        if self.closed {
            Err(io::Error::new(io::ErrorKind::NotConnected, "device is closed"))
        } else {
            Ok(())
        }
    }
}

impl driver::Device for MemoryDevice {
    type Stream = MemoryStream;
    type Playback = MemoryPlayback;

    fn info(&self) -> io::Result<DeviceInfo> {
        self.ensure_open()?;
        Ok(info(&self.uri, &self.source))
    }

    fn sensor_modes(&self, kind: SensorKind) -> Option<Vec<VideoMode>> {
        let modes = self.source.modes(kind);
        if self.closed || modes.is_empty() {
            None
        } else {
            Some(modes.to_vec())
        }
    }

    fn create_stream(&mut self, kind: SensorKind) -> io::Result<MemoryStream> {
        self.ensure_open()?;
        let mode = match self.source.modes(kind).first() {
            Some(mode) => *mode,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("device has no {} sensor", kind),
                ))
            }
        };

        lock(&self.state).streams += 1;
        Ok(MemoryStream {
            kind,
            source: Arc::clone(&self.source),
            state: Arc::clone(&self.state),
            mode,
            cursor: 0,
            active: false,
            buffer: Vec::new(),
        })
    }

    fn set_registration(&mut self, mode: Registration) -> io::Result<()> {
        self.ensure_open()?;
        if self.source.faults.contains(Faults::REGISTRATION) {
            return Err(injected("setting image registration"));
        }
        lock(&self.state).registration = mode;
        Ok(())
    }

    fn playback(&self) -> Option<MemoryPlayback> {
        if self.closed || self.source.recording.is_none() {
            return None;
        }

        Some(MemoryPlayback {
            source: Arc::clone(&self.source),
            state: Arc::clone(&self.state),
        })
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }

        self.closed = true;
        lock(&self.state).open = false;
        trace!("closed synthetic device {}", self.uri);
        if self.source.faults.contains(Faults::DEVICE_CLOSE) {
            return Err(injected("closing the device"));
        }
        Ok(())
    }
}

impl Drop for MemoryDevice {
    fn drop(&mut self) {
        let _ = driver::Device::close(self);
    }
}

/// Stream of synthetic frames
pub struct MemoryStream {
    kind: SensorKind,
    source: Arc<Source>,
    state: Arc<Mutex<DeviceState>>,
    mode: VideoMode,
    cursor: i64,
    active: bool,
    buffer: Vec<u8>,
}

impl MemoryStream {
    fn frame_total(&self) -> Option<i64> {
        self.source.frame_total(self.kind)
    }

    /// Renders frame `index` into the stream buffer and returns the padded row length
    fn render(&mut self, index: i64) -> usize {
        let width = self.mode.width as usize;
        let height = self.mode.height as usize;
        let bpp = self.mode.pixel_format.bytes_per_pixel().unwrap_or(1);
        let stride = width * bpp + self.source.row_padding;
        let max = self.source.max_depth.max(1) as i64;

        self.buffer.clear();
        self.buffer.reserve(stride * height);
        for y in 0..height {
            for x in 0..width {
                let sample = (x as i64 + y as i64 + index) % max;
                match bpp {
                    2 => self.buffer.extend_from_slice(&(sample as u16).to_ne_bytes()),
                    3 => self.buffer.extend_from_slice(&[x as u8, y as u8, index as u8]),
                    _ => self.buffer.extend((0..bpp).map(|_| sample as u8)),
                }
            }
            self.buffer
                .extend((0..self.source.row_padding).map(|_| 0u8));
        }

        let skew = self.source.payload_skew;
        if skew < 0 {
            let len = self.buffer.len().saturating_sub(skew.unsigned_abs());
            self.buffer.truncate(len);
        } else {
            self.buffer.extend((0..skew as usize).map(|_| 0u8));
        }

        stride
    }
}

impl driver::Stream for MemoryStream {
    fn video_mode(&self) -> io::Result<VideoMode> {
        Ok(self.mode)
    }

    fn set_video_mode(&mut self, mode: &VideoMode) -> io::Result<()> {
        if self.active {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "cannot change the mode of a running stream",
            ));
        }
        if !self.source.modes(self.kind).contains(mode) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported {} mode {}", self.kind, mode),
            ));
        }

        self.mode = *mode;
        Ok(())
    }

    fn start(&mut self) -> io::Result<()> {
        if !self.active {
            self.active = true;
            lock(&self.state).active += 1;
        }
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        self.active = false;
        lock(&self.state).active -= 1;
        if self.source.faults.contains(Faults::STREAM_STOP) {
            return Err(injected("stopping the stream"));
        }
        Ok(())
    }

    fn read_frame(&mut self) -> io::Result<Option<RawFrame<'_>>> {
        if !self.active {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "stream is not started",
            ));
        }

        let index = self.cursor;
        if let Some(total) = self.frame_total() {
            if index >= total {
                return Ok(None);
            }
        }
        self.cursor += 1;

        if let Some(n) = self.source.drop_every {
            if (index as u64 + 1) % n == 0 {
                trace!("dropping {} frame {}", self.kind, index);
                return Ok(None);
            }
        }

        let stride = self.render(index);
        let timestamp = if self.mode.fps > 0.0 {
            (index as f64 * 1_000_000.0 / self.mode.fps as f64) as u64
        } else {
            0
        };

        Ok(Some(RawFrame {
            data: &self.buffer,
            width: self.mode.width,
            height: self.mode.height,
            stride,
            timestamp,
            frame_index: index,
            pixel_format: Some(self.mode.pixel_format),
        }))
    }

    fn field_of_view(&self) -> io::Result<FieldOfView> {
        Ok(self.source.field_of_view)
    }

    fn max_value(&self) -> io::Result<i32> {
        Ok(match self.kind {
            SensorKind::Depth => self.source.max_depth,
            SensorKind::Color => 255,
        })
    }
}

impl Drop for MemoryStream {
    fn drop(&mut self) {
        let _ = driver::Stream::stop(self);
        lock(&self.state).streams -= 1;
    }
}

/// Transport control of a synthetic recording
pub struct MemoryPlayback {
    source: Arc<Source>,
    state: Arc<Mutex<DeviceState>>,
}

impl driver::Playback for MemoryPlayback {
    type Stream = MemoryStream;

    fn set_speed(&mut self, speed: f32) -> io::Result<()> {
        if self.source.faults.contains(Faults::PLAYBACK_SPEED) {
            return Err(injected("setting the playback speed"));
        }
        lock(&self.state).speed = Some(speed);
        Ok(())
    }

    fn frame_count(&self, stream: &MemoryStream) -> io::Result<i64> {
        Ok(stream.frame_total().unwrap_or(0))
    }

    fn seek(&mut self, stream: &mut MemoryStream, index: i64) -> io::Result<()> {
        let total = stream.frame_total().unwrap_or(0);
        if index < 0 || index >= total {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("frame {} is not in the {} stream", index, stream.kind),
            ));
        }

        stream.cursor = index;
        Ok(())
    }
}

/// Observer of a synthetic device's native resources
#[derive(Clone)]
pub struct Probe {
    state: Arc<Mutex<DeviceState>>,
}

impl Probe {
    /// Whether a session currently holds the device
    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    /// How many times the device has been opened
    pub fn open_count(&self) -> usize {
        lock(&self.state).opened
    }

    /// Streams created and not yet destroyed
    pub fn streams(&self) -> usize {
        lock(&self.state).streams
    }

    /// Streams currently running
    pub fn active_streams(&self) -> usize {
        lock(&self.state).active
    }

    pub fn registration(&self) -> Registration {
        lock(&self.state).registration
    }

    /// Last playback speed set, `None` if it was never set
    pub fn playback_speed(&self) -> Option<f32> {
        lock(&self.state).speed
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Probe")
            .field("open", &state.open)
            .field("streams", &state.streams)
            .field("active", &state.active)
            .finish()
    }
}
