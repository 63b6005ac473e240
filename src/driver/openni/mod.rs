//! OpenNI2 binding
//!
//! Links against `libOpenNI2` and drives real sensors as well as `.oni` recordings. A device is
//! treated as a recording when it supports the playback speed property and the seek command.
//!
//! # Example
//!
//! ```no_run
//! use onireader::driver::openni::OpenNi;
//! use onireader::Session;
//!
//! let mut session = Session::new(OpenNi).expect("Failed to initialize OpenNI2");
//! session.open("capture.oni").expect("Failed to open recording");
//! session.start(None, None).expect("Failed to start streams");
//!
//! for _ in 0..session.frame_count() {
//!     let (depth, color) = session.read_pair().unwrap();
//!     println!("{:?} {:?}", depth, color);
//! }
//! ```

use std::convert::TryFrom;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::{io, mem, ptr, slice};

use log::{trace, warn};

mod ffi;
use ffi::*;

use crate::context::Runtime;
use crate::driver::{self, DeviceInfo, RawFrame};
use crate::format::PixelFormat;
use crate::mode::VideoMode;
use crate::sensor::{FieldOfView, Registration, SensorKind};

static RUNTIME: Runtime = Runtime::new();

extern "C" fn shutdown() {
    unsafe { oniShutdown() }
}

fn extended_error() -> String {
    let msg = unsafe { oniGetExtendedError() };
    if msg.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
}

/// Converts an OpenNI2 status into an io result carrying the driver's error text
fn check(status: OniStatus) -> io::Result<()> {
    let kind = match status {
        ONI_STATUS_OK => return Ok(()),
        ONI_STATUS_NOT_IMPLEMENTED | ONI_STATUS_NOT_SUPPORTED => io::ErrorKind::Unsupported,
        ONI_STATUS_BAD_PARAMETER => io::ErrorKind::InvalidInput,
        ONI_STATUS_NO_DEVICE => io::ErrorKind::NotFound,
        ONI_STATUS_TIME_OUT => io::ErrorKind::TimedOut,
        _ => io::ErrorKind::Other,
    };

    let mut msg = extended_error();
    if msg.is_empty() {
        msg = format!("OpenNI2 status {}", status);
    }
    Err(io::Error::new(kind, msg))
}

fn c_string(chars: &[c_char]) -> String {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn device_info(info: &OniDeviceInfo) -> DeviceInfo {
    DeviceInfo {
        uri: c_string(&info.uri),
        vendor: c_string(&info.vendor),
        name: c_string(&info.name),
        usb_vendor_id: info.usbVendorId,
        usb_product_id: info.usbProductId,
    }
}

fn video_mode(mode: &OniVideoMode) -> Option<VideoMode> {
    let format = PixelFormat::try_from(mode.pixelFormat as u32).ok()?;
    VideoMode::new(
        mode.resolutionX as u32,
        mode.resolutionY as u32,
        mode.fps as f32,
        format,
    )
}

fn oni_video_mode(mode: &VideoMode) -> OniVideoMode {
    OniVideoMode {
        pixelFormat: u32::from(mode.pixel_format) as c_int,
        resolutionX: mode.width as c_int,
        resolutionY: mode.height as c_int,
        fps: mode.fps.round() as c_int,
    }
}

fn size_of<T>() -> c_int {
    mem::size_of::<T>() as c_int
}

/// Reads a fixed size stream property
///
/// # Safety
///
/// `T` must match the property's C type and be valid when zeroed.
unsafe fn stream_property<T>(stream: OniStreamHandle, id: c_int) -> io::Result<T> {
    let mut value: T = mem::zeroed();
    let mut size = size_of::<T>();
    check(oniStreamGetProperty(
        stream,
        id,
        &mut value as *mut T as *mut c_void,
        &mut size,
    ))?;
    Ok(value)
}

/// The OpenNI2 runtime
///
/// The runtime is initialized once per process, on the first [`driver::Driver::initialize`]
/// call, and shut down at process exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenNi;

impl driver::Driver for OpenNi {
    type Device = OpenNiDevice;

    fn initialize(&self) -> io::Result<()> {
        RUNTIME.initialize(
            || check(unsafe { oniInitialize(ONI_API_VERSION) }),
            Some(shutdown),
        )
    }

    fn devices(&self) -> io::Result<Vec<DeviceInfo>> {
        let mut list: *mut OniDeviceInfo = ptr::null_mut();
        let mut count: c_int = 0;

        unsafe {
            check(oniGetDeviceList(&mut list, &mut count))?;
            let devices = if list.is_null() || count <= 0 {
                Vec::new()
            } else {
                slice::from_raw_parts(list, count as usize)
                    .iter()
                    .map(device_info)
                    .collect()
            };
            oniReleaseDeviceList(list);
            Ok(devices)
        }
    }

    fn open(&self, uri: Option<&str>) -> io::Result<OpenNiDevice> {
        let uri = uri
            .map(CString::new)
            .transpose()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let uri_ptr = uri.as_ref().map_or(ptr::null(), |uri| uri.as_ptr());

        let mut handle: OniDeviceHandle = ptr::null_mut();
        check(unsafe { oniDeviceOpen(uri_ptr, &mut handle) })?;
        Ok(OpenNiDevice { handle })
    }
}

/// Device bound through OpenNI2
pub struct OpenNiDevice {
    handle: OniDeviceHandle,
}

// OpenNI2 handles are not tied to the thread that created them. Each wrapper is the single
// owner of its handle and every call goes through `&mut self` or the owning session.
unsafe impl Send for OpenNiDevice {}

impl OpenNiDevice {
    fn handle(&self) -> io::Result<OniDeviceHandle> {
        if self.handle.is_null() {
            Err(io::Error::new(io::ErrorKind::NotConnected, "device is closed"))
        } else {
            Ok(self.handle)
        }
    }
}

impl driver::Device for OpenNiDevice {
    type Stream = OpenNiStream;
    type Playback = OpenNiPlayback;

    fn info(&self) -> io::Result<DeviceInfo> {
        let handle = self.handle()?;
        unsafe {
            let mut info: OniDeviceInfo = mem::zeroed();
            check(oniDeviceGetInfo(handle, &mut info))?;
            Ok(device_info(&info))
        }
    }

    fn sensor_modes(&self, kind: SensorKind) -> Option<Vec<VideoMode>> {
        let handle = self.handle().ok()?;
        let info = unsafe { oniDeviceGetSensorInfo(handle, kind as c_int).as_ref()? };
        if info.pSupportedVideoModes.is_null() || info.numSupportedVideoModes <= 0 {
            return Some(Vec::new());
        }

        let modes = unsafe {
            slice::from_raw_parts(
                info.pSupportedVideoModes,
                info.numSupportedVideoModes as usize,
            )
        };
        Some(
            modes
                .iter()
                .filter_map(|mode| {
                    let converted = video_mode(mode);
                    if converted.is_none() {
                        warn!("skipping unsupported {} mode {:?}", kind, mode);
                    }
                    converted
                })
                .collect(),
        )
    }

    fn create_stream(&mut self, kind: SensorKind) -> io::Result<OpenNiStream> {
        let handle = self.handle()?;
        let mut stream: OniStreamHandle = ptr::null_mut();
        check(unsafe { oniDeviceCreateStream(handle, kind as c_int, &mut stream) })?;

        Ok(OpenNiStream {
            handle: stream,
            kind,
            frame: ptr::null_mut(),
            active: false,
        })
    }

    fn set_registration(&mut self, mode: Registration) -> io::Result<()> {
        let handle = self.handle()?;
        let value = mode as c_int;
        check(unsafe {
            oniDeviceSetProperty(
                handle,
                ONI_DEVICE_PROPERTY_IMAGE_REGISTRATION,
                &value as *const c_int as *const c_void,
                size_of::<c_int>(),
            )
        })
    }

    fn playback(&self) -> Option<OpenNiPlayback> {
        let handle = self.handle().ok()?;
        let seekable = unsafe {
            oniDeviceIsPropertySupported(handle, ONI_DEVICE_PROPERTY_PLAYBACK_SPEED) != 0
                && oniDeviceIsCommandSupported(handle, ONI_DEVICE_COMMAND_SEEK) != 0
        };

        if seekable {
            Some(OpenNiPlayback { device: handle })
        } else {
            None
        }
    }

    fn close(&mut self) -> io::Result<()> {
        if self.handle.is_null() {
            return Ok(());
        }

        let handle = mem::replace(&mut self.handle, ptr::null_mut());
        check(unsafe { oniDeviceClose(handle) })
    }
}

impl Drop for OpenNiDevice {
    fn drop(&mut self) {
        if let Err(e) = driver::Device::close(self) {
            warn!("failed to close OpenNI2 device: {}", e);
        }
    }
}

/// OpenNI2 video stream
///
/// Holds on to the last frame it read until the next read, so that the frame payload can be
/// borrowed without copying.
pub struct OpenNiStream {
    handle: OniStreamHandle,
    kind: SensorKind,
    frame: *mut OniFrame,
    active: bool,
}

// see `OpenNiDevice`; the held frame is released by the owning stream only
unsafe impl Send for OpenNiStream {}

impl OpenNiStream {
    fn release_frame(&mut self) {
        if !self.frame.is_null() {
            unsafe { oniFrameRelease(self.frame) };
            self.frame = ptr::null_mut();
        }
    }
}

impl driver::Stream for OpenNiStream {
    fn video_mode(&self) -> io::Result<VideoMode> {
        let mode: OniVideoMode =
            unsafe { stream_property(self.handle, ONI_STREAM_PROPERTY_VIDEO_MODE)? };
        video_mode(&mode).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported {} mode {:?}", self.kind, mode),
            )
        })
    }

    fn set_video_mode(&mut self, mode: &VideoMode) -> io::Result<()> {
        let mode = oni_video_mode(mode);
        check(unsafe {
            oniStreamSetProperty(
                self.handle,
                ONI_STREAM_PROPERTY_VIDEO_MODE,
                &mode as *const OniVideoMode as *const c_void,
                size_of::<OniVideoMode>(),
            )
        })
    }

    fn start(&mut self) -> io::Result<()> {
        check(unsafe { oniStreamStart(self.handle) })?;
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        if self.active {
            unsafe { oniStreamStop(self.handle) };
            self.active = false;
        }
        Ok(())
    }

    fn read_frame(&mut self) -> io::Result<Option<RawFrame<'_>>> {
        self.release_frame();
        check(unsafe { oniStreamReadFrame(self.handle, &mut self.frame) })?;

        let frame = match unsafe { self.frame.as_ref() } {
            Some(frame) if !frame.data.is_null() && frame.dataSize > 0 => frame,
            _ => {
                trace!("invalid {} frame", self.kind);
                return Ok(None);
            }
        };

        let data =
            unsafe { slice::from_raw_parts(frame.data as *const u8, frame.dataSize as usize) };
        Ok(Some(RawFrame {
            data,
            width: frame.width.max(0) as u32,
            height: frame.height.max(0) as u32,
            stride: frame.stride.max(0) as usize,
            timestamp: frame.timestamp,
            frame_index: i64::from(frame.frameIndex),
            pixel_format: PixelFormat::try_from(frame.videoMode.pixelFormat as u32).ok(),
        }))
    }

    fn field_of_view(&self) -> io::Result<FieldOfView> {
        unsafe {
            Ok(FieldOfView {
                horizontal: stream_property(self.handle, ONI_STREAM_PROPERTY_HORIZONTAL_FOV)?,
                vertical: stream_property(self.handle, ONI_STREAM_PROPERTY_VERTICAL_FOV)?,
            })
        }
    }

    fn max_value(&self) -> io::Result<i32> {
        let value: c_int = unsafe { stream_property(self.handle, ONI_STREAM_PROPERTY_MAX_VALUE)? };
        Ok(value)
    }
}

impl Drop for OpenNiStream {
    fn drop(&mut self) {
        self.release_frame();
        let _ = driver::Stream::stop(self);
        unsafe { oniStreamDestroy(self.handle) };
    }
}

/// Playback control of an OpenNI2 recording
pub struct OpenNiPlayback {
    device: OniDeviceHandle,
}

unsafe impl Send for OpenNiPlayback {}

impl driver::Playback for OpenNiPlayback {
    type Stream = OpenNiStream;

    fn set_speed(&mut self, speed: f32) -> io::Result<()> {
        check(unsafe {
            oniDeviceSetProperty(
                self.device,
                ONI_DEVICE_PROPERTY_PLAYBACK_SPEED,
                &speed as *const f32 as *const c_void,
                size_of::<f32>(),
            )
        })
    }

    fn frame_count(&self, stream: &OpenNiStream) -> io::Result<i64> {
        let count: c_int =
            unsafe { stream_property(stream.handle, ONI_STREAM_PROPERTY_NUMBER_OF_FRAMES)? };
        Ok(i64::from(count))
    }

    fn seek(&mut self, stream: &mut OpenNiStream, index: i64) -> io::Result<()> {
        let frame_index = c_int::try_from(index)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let mut seek = OniSeek {
            frameIndex: frame_index,
            stream: stream.handle,
        };

        trace!("seeking {} stream to {}", stream.kind, index);
        check(unsafe {
            oniDeviceInvoke(
                self.device,
                ONI_DEVICE_COMMAND_SEEK,
                &mut seek as *mut OniSeek as *mut c_void,
                size_of::<OniSeek>(),
            )
        })
    }
}
