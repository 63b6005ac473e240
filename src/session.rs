use std::{fmt, io};

use log::{debug, trace, warn};

use crate::capability::Capabilities;
use crate::catalog::{Catalog, Pair};
use crate::config::StartConfig;
use crate::driver::{Device, DeviceInfo, Driver, Playback, Stream};
use crate::error::{Error, Result};
use crate::frame::FrameBuffer;
use crate::mode::VideoMode;
use crate::sensor::{FieldOfView, Registration, SensorKind};

/// Stream type of a driver's devices
pub type DeviceStream<D> = <<D as Driver>::Device as Device>::Stream;
/// Playback type of a driver's devices
pub type DevicePlayback<D> = <<D as Driver>::Device as Device>::Playback;

/// Lifecycle state of a [`Session`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    /// No device is bound
    Closed,
    /// A device is bound, streams are not running
    Opened,
    /// Depth and color streams are running
    Started,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            State::Closed => write!(f, "closed"),
            State::Opened => write!(f, "opened"),
            State::Started => write!(f, "started"),
        }
    }
}

/// Depth and color reader for one device
///
/// A session owns the device it opens, both of its streams and the playback control of recorded
/// sources. All of them are released by [`Session::close`] or when the session is dropped.
///
/// # Example
///
/// ```
/// use onireader::driver::memory::{MemoryDriver, Source};
/// use onireader::Session;
///
/// let driver = MemoryDriver::new().with_device("cam0", Source::live());
/// let mut session = Session::new(driver).expect("Failed to initialize driver");
/// session.open("").expect("Failed to open device");
///
/// for mode in session.depth_modes().unwrap() {
///     println!("{}", mode);
/// }
///
/// session.start(Some(1), None).expect("Failed to start streams");
/// let depth = session.read_depth().unwrap();
/// assert_eq!(depth.shape(), &[240, 320]);
/// assert_eq!(session.frame_count(), -1);
/// ```
pub struct Session<D: Driver> {
    driver: D,
    uri: Option<String>,
    device: Option<D::Device>,
    streams: Option<Pair<DeviceStream<D>>>,
    playback: Option<DevicePlayback<D>>,
    stream_frames: Option<Pair<i64>>,
    frame_count: i64,
}

impl<D: Driver> Session<D> {
    /// Returns a closed session over a driver
    ///
    /// Initializes the driver runtime of the process if no other session did so before.
    ///
    /// # Arguments
    ///
    /// * `driver` - Driver used to discover and bind devices
    pub fn new(driver: D) -> Result<Self> {
        driver.initialize().map_err(Error::Init)?;

        Ok(Session {
            driver,
            uri: None,
            device: None,
            streams: None,
            playback: None,
            stream_frames: None,
            frame_count: -1,
        })
    }

    /// Driver the session binds devices through
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Current lifecycle state
    pub fn state(&self) -> State {
        if self.streams.is_some() {
            State::Started
        } else if self.device.is_some() {
            State::Opened
        } else {
            State::Closed
        }
    }

    /// URI the bound device was opened with, `None` if any device was requested
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Binds a device
    ///
    /// A bound device is closed first. Streams are not created until [`Session::start`].
    ///
    /// # Arguments
    ///
    /// * `uri` - Device URI or recording path, an empty string for any available device
    pub fn open(&mut self, uri: &str) -> Result<()> {
        self.close();

        let target = if uri.is_empty() { None } else { Some(uri) };
        debug!("opening device {}", target.unwrap_or("<any>"));

        let device = self
            .driver
            .open(target)
            .map_err(|source| Error::DeviceOpen {
                uri: uri.to_string(),
                source,
            })?;

        self.device = Some(device);
        self.uri = target.map(String::from);
        Ok(())
    }

    /// Returns the mode catalog of the bound device
    pub fn catalog(&self) -> Catalog<'_, D::Device> {
        Catalog::new(self.device.as_ref(), self.streams.as_ref())
    }

    /// Modes of a sensor of the bound device, see [`Catalog::modes`]
    pub fn modes(&self, kind: SensorKind) -> Result<Vec<VideoMode>> {
        self.catalog().modes(kind)
    }

    /// Modes of the depth sensor, in driver order
    pub fn depth_modes(&self) -> Result<Vec<VideoMode>> {
        self.modes(SensorKind::Depth)
    }

    /// Modes of the color sensor, in driver order
    pub fn color_modes(&self) -> Result<Vec<VideoMode>> {
        self.modes(SensorKind::Color)
    }

    /// Creates and starts the depth and color streams
    ///
    /// Uses depth-to-color registration and manual playback pacing, see
    /// [`Session::start_with`].
    ///
    /// # Arguments
    ///
    /// * `depth_mode` - Index into [`Session::depth_modes`], `None` for the device default
    /// * `color_mode` - Index into [`Session::color_modes`], `None` for the device default
    pub fn start(&mut self, depth_mode: Option<usize>, color_mode: Option<usize>) -> Result<()> {
        self.start_with(&StartConfig::with_modes(depth_mode, color_mode))
    }

    /// Creates and starts the depth and color streams
    ///
    /// Running streams are stopped and re-created. If any step fails, the session is left
    /// opened without streams.
    pub fn start_with(&mut self, config: &StartConfig) -> Result<()> {
        if self.device.is_none() {
            return Err(Error::NotOpened);
        }
        self.release_streams();

        let device = self.device.as_mut().ok_or(Error::NotOpened)?;
        debug!("starting streams\n{}", config);

        let mut playback = device.playback();
        if let Some(playback) = playback.as_mut() {
            playback
                .set_speed(config.playback_speed.into())
                .map_err(Error::Playback)?;
        }

        let depth = device
            .create_stream(SensorKind::Depth)
            .map_err(|source| Error::Stream {
                kind: SensorKind::Depth,
                source,
            })?;
        let color = device
            .create_stream(SensorKind::Color)
            .map_err(|source| Error::Stream {
                kind: SensorKind::Color,
                source,
            })?;
        let mut streams = Pair { depth, color };

        if let Err(e) = device.set_registration(config.registration) {
            if config.registration != Registration::Off {
                return Err(Error::Registration(e));
            }
            warn!("could not turn registration off: {}", e);
        }

        let requested = [
            (SensorKind::Depth, config.depth_mode),
            (SensorKind::Color, config.color_mode),
        ];
        for &(kind, index) in requested.iter() {
            if let Some(index) = index {
                let mode = Catalog::new(Some(&*device), None).mode(kind, index)?;
                streams
                    .get_mut(kind)
                    .set_video_mode(&mode)
                    .map_err(|source| Error::Stream { kind, source })?;
                debug!("{} stream set to {}", kind, mode);
            }
        }

        for &kind in SensorKind::ALL.iter() {
            streams
                .get_mut(kind)
                .start()
                .map_err(|source| Error::Stream { kind, source })?;
        }

        let stream_frames = match playback.as_ref() {
            Some(playback) => Some(Pair {
                depth: playback
                    .frame_count(&streams.depth)
                    .map_err(Error::Playback)?,
                color: playback
                    .frame_count(&streams.color)
                    .map_err(Error::Playback)?,
            }),
            None => None,
        };
        let frame_count = stream_frames
            .as_ref()
            .map_or(-1, |frames| frames.depth.max(frames.color));
        debug!("streams started, frame count {}", frame_count);

        self.streams = Some(streams);
        self.playback = playback;
        self.stream_frames = stream_frames;
        self.frame_count = frame_count;
        Ok(())
    }

    /// Pulls the next frame of a stream
    ///
    /// Blocks until the driver delivers a frame. An invalid frame (dropped, or past the end of a
    /// recording) yields an empty [`FrameBuffer`] rather than an error.
    pub fn read(&mut self, kind: SensorKind) -> Result<FrameBuffer> {
        let streams = self.streams.as_mut().ok_or(Error::NotStarted)?;
        let raw = streams
            .get_mut(kind)
            .read_frame()
            .map_err(|source| Error::Stream { kind, source })?;

        match raw {
            Some(raw) => {
                trace!(
                    "{} frame {} ({} bytes)",
                    kind,
                    raw.frame_index,
                    raw.data.len()
                );
                FrameBuffer::from_raw(kind, &raw)
            }
            None => {
                trace!("no {} frame available", kind);
                Ok(FrameBuffer::empty(kind))
            }
        }
    }

    /// Pulls the next depth frame, see [`Session::read`]
    pub fn read_depth(&mut self) -> Result<FrameBuffer> {
        self.read(SensorKind::Depth)
    }

    /// Pulls the next color frame, see [`Session::read`]
    pub fn read_color(&mut self) -> Result<FrameBuffer> {
        self.read(SensorKind::Color)
    }

    /// Pulls a depth frame, then a color frame
    pub fn read_pair(&mut self) -> Result<(FrameBuffer, FrameBuffer)> {
        let depth = self.read_depth()?;
        let color = self.read_color()?;
        Ok((depth, color))
    }

    /// Moves both streams of a recording to a frame
    ///
    /// The next read of either stream returns the frame at `frame_index`. No frame is delivered
    /// by the seek itself.
    ///
    /// The index must exist in both streams. If the shorter stream does not hold it, the seek
    /// fails with [`Error::Seek`] for that stream and neither stream moves.
    ///
    /// # Arguments
    ///
    /// * `frame_index` - Target frame, in `0..frame_count()`
    pub fn seek(&mut self, frame_index: i64) -> Result<()> {
        let streams = self.streams.as_mut().ok_or(Error::NotStarted)?;
        let playback = self.playback.as_mut().ok_or(Error::SeekUnsupported)?;
        if frame_index < 0 || frame_index >= self.frame_count {
            return Err(Error::SeekOutOfRange {
                index: frame_index,
                count: self.frame_count,
            });
        }

        if let Some(frames) = self.stream_frames.as_ref() {
            for &kind in SensorKind::ALL.iter() {
                let count = *frames.get(kind);
                if frame_index >= count {
                    return Err(Error::Seek {
                        kind,
                        source: io::Error::new(
                            io::ErrorKind::InvalidInput,
                            format!(
                                "frame {} is past the end of the stream ({} frames)",
                                frame_index, count
                            ),
                        ),
                    });
                }
            }
        }

        for &kind in SensorKind::ALL.iter() {
            playback
                .seek(streams.get_mut(kind), frame_index)
                .map_err(|source| Error::Seek { kind, source })?;
        }

        debug!("seeked to frame {}", frame_index);
        Ok(())
    }

    /// Frames in the recording, `-1` for live sources or before [`Session::start`]
    ///
    /// Fixed when the streams start, as the larger of the depth and color counts.
    pub fn frame_count(&self) -> i64 {
        self.frame_count
    }

    /// Whether the started source is a recording that supports [`Session::seek`]
    pub fn is_seekable(&self) -> bool {
        self.playback.is_some()
    }

    /// Mode the running depth stream uses
    pub fn depth_mode(&self) -> Result<VideoMode> {
        self.catalog().current(SensorKind::Depth)
    }

    /// Mode the running color stream uses
    pub fn color_mode(&self) -> Result<VideoMode> {
        self.catalog().current(SensorKind::Color)
    }

    /// Field of view of a running stream, in radians
    pub fn field_of_view(&self, kind: SensorKind) -> Result<FieldOfView> {
        let streams = self.streams.as_ref().ok_or(Error::NotStarted)?;
        streams
            .get(kind)
            .field_of_view()
            .map_err(|source| Error::Stream { kind, source })
    }

    /// Largest value the depth stream can produce
    pub fn max_depth(&self) -> Result<i32> {
        let streams = self.streams.as_ref().ok_or(Error::NotStarted)?;
        streams.depth.max_value().map_err(|source| Error::Stream {
            kind: SensorKind::Depth,
            source,
        })
    }

    /// Driver description of the bound device
    pub fn device_info(&self) -> Option<DeviceInfo> {
        let device = self.device.as_ref()?;
        match device.info() {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("could not query device info: {}", e);
                None
            }
        }
    }

    /// Sensors and transport features of the bound device, empty if none is bound
    pub fn capabilities(&self) -> Capabilities {
        let device = match self.device.as_ref() {
            Some(device) => device,
            None => return Capabilities::empty(),
        };

        let mut caps = Capabilities::empty();
        if device.sensor_modes(SensorKind::Depth).is_some() {
            caps |= Capabilities::DEPTH;
        }
        if device.sensor_modes(SensorKind::Color).is_some() {
            caps |= Capabilities::COLOR;
        }
        if device.playback().is_some() {
            caps |= Capabilities::PLAYBACK;
        }
        caps
    }

    /// Stops and releases the streams and the device
    ///
    /// Driver failures are logged and otherwise ignored. Closing a closed session does nothing.
    pub fn close(&mut self) {
        self.release_streams();

        if let Some(mut device) = self.device.take() {
            debug!("closing device {}", self.uri.as_deref().unwrap_or("<any>"));
            if let Err(e) = device.close() {
                warn!("failed to close device: {}", e);
            }
        }
        self.uri = None;
    }

    fn release_streams(&mut self) {
        if let Some(mut streams) = self.streams.take() {
            for &kind in SensorKind::ALL.iter() {
                if let Err(e) = streams.get_mut(kind).stop() {
                    warn!("failed to stop {} stream: {}", kind, e);
                }
            }
            debug!("streams stopped");
        }
        self.playback = None;
        self.stream_frames = None;
        self.frame_count = -1;
    }
}

impl<D: Driver> Drop for Session<D> {
    fn drop(&mut self) {
        self.close();
    }
}
