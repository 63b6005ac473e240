//! Declarations of the OpenNI2 C API (`OniCAPI.h`) used by the binding
#![allow(non_snake_case, dead_code)]

use std::os::raw::{c_char, c_int, c_void};

pub const ONI_API_VERSION: c_int = 2 * 1000 + 2;
pub const ONI_MAX_STR: usize = 256;

pub type OniStatus = c_int;
pub const ONI_STATUS_OK: OniStatus = 0;
pub const ONI_STATUS_ERROR: OniStatus = 1;
pub const ONI_STATUS_NOT_IMPLEMENTED: OniStatus = 2;
pub const ONI_STATUS_NOT_SUPPORTED: OniStatus = 3;
pub const ONI_STATUS_BAD_PARAMETER: OniStatus = 4;
pub const ONI_STATUS_OUT_OF_FLOW: OniStatus = 5;
pub const ONI_STATUS_NO_DEVICE: OniStatus = 6;
pub const ONI_STATUS_TIME_OUT: OniStatus = 102;

pub type OniBool = c_int;
pub type OniSensorType = c_int;
pub type OniPixelFormat = c_int;

// device properties
pub const ONI_DEVICE_PROPERTY_IMAGE_REGISTRATION: c_int = 5;
pub const ONI_DEVICE_PROPERTY_PLAYBACK_SPEED: c_int = 100;
pub const ONI_DEVICE_PROPERTY_PLAYBACK_REPEAT_ENABLED: c_int = 101;

// stream properties
pub const ONI_STREAM_PROPERTY_HORIZONTAL_FOV: c_int = 1;
pub const ONI_STREAM_PROPERTY_VERTICAL_FOV: c_int = 2;
pub const ONI_STREAM_PROPERTY_VIDEO_MODE: c_int = 3;
pub const ONI_STREAM_PROPERTY_MAX_VALUE: c_int = 4;
pub const ONI_STREAM_PROPERTY_NUMBER_OF_FRAMES: c_int = 8;

// device commands
pub const ONI_DEVICE_COMMAND_SEEK: c_int = 1;

#[repr(C)]
pub struct OniDevice {
    _private: [u8; 0],
}

#[repr(C)]
pub struct OniStream {
    _private: [u8; 0],
}

pub type OniDeviceHandle = *mut OniDevice;
pub type OniStreamHandle = *mut OniStream;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct OniVideoMode {
    pub pixelFormat: OniPixelFormat,
    pub resolutionX: c_int,
    pub resolutionY: c_int,
    pub fps: c_int,
}

#[repr(C)]
pub struct OniSensorInfo {
    pub sensorType: OniSensorType,
    pub numSupportedVideoModes: c_int,
    pub pSupportedVideoModes: *mut OniVideoMode,
}

#[repr(C)]
pub struct OniDeviceInfo {
    pub uri: [c_char; ONI_MAX_STR],
    pub vendor: [c_char; ONI_MAX_STR],
    pub name: [c_char; ONI_MAX_STR],
    pub usbVendorId: u16,
    pub usbProductId: u16,
}

#[repr(C)]
pub struct OniFrame {
    pub dataSize: c_int,
    pub data: *mut c_void,
    pub sensorType: OniSensorType,
    pub timestamp: u64,
    pub frameIndex: c_int,
    pub width: c_int,
    pub height: c_int,
    pub videoMode: OniVideoMode,
    pub croppingEnabled: OniBool,
    pub cropOriginX: c_int,
    pub cropOriginY: c_int,
    pub stride: c_int,
}

#[repr(C)]
pub struct OniSeek {
    pub frameIndex: c_int,
    pub stream: OniStreamHandle,
}

#[link(name = "OpenNI2")]
extern "C" {
    pub fn oniInitialize(apiVersion: c_int) -> OniStatus;
    pub fn oniShutdown();
    pub fn oniGetExtendedError() -> *const c_char;

    pub fn oniGetDeviceList(pDevices: *mut *mut OniDeviceInfo, pNumDevices: *mut c_int)
        -> OniStatus;
    pub fn oniReleaseDeviceList(pDevices: *mut OniDeviceInfo) -> OniStatus;

    pub fn oniDeviceOpen(uri: *const c_char, pDevice: *mut OniDeviceHandle) -> OniStatus;
    pub fn oniDeviceClose(device: OniDeviceHandle) -> OniStatus;
    pub fn oniDeviceGetInfo(device: OniDeviceHandle, pInfo: *mut OniDeviceInfo) -> OniStatus;
    pub fn oniDeviceGetSensorInfo(
        device: OniDeviceHandle,
        sensorType: OniSensorType,
    ) -> *const OniSensorInfo;
    pub fn oniDeviceCreateStream(
        device: OniDeviceHandle,
        sensorType: OniSensorType,
        pStreamHandle: *mut OniStreamHandle,
    ) -> OniStatus;
    pub fn oniDeviceSetProperty(
        device: OniDeviceHandle,
        propertyId: c_int,
        data: *const c_void,
        dataSize: c_int,
    ) -> OniStatus;
    pub fn oniDeviceIsPropertySupported(device: OniDeviceHandle, propertyId: c_int) -> OniBool;
    pub fn oniDeviceInvoke(
        device: OniDeviceHandle,
        commandId: c_int,
        data: *mut c_void,
        dataSize: c_int,
    ) -> OniStatus;
    pub fn oniDeviceIsCommandSupported(device: OniDeviceHandle, commandId: c_int) -> OniBool;

    pub fn oniStreamDestroy(stream: OniStreamHandle);
    pub fn oniStreamStart(stream: OniStreamHandle) -> OniStatus;
    pub fn oniStreamStop(stream: OniStreamHandle);
    pub fn oniStreamReadFrame(stream: OniStreamHandle, pFrame: *mut *mut OniFrame) -> OniStatus;
    pub fn oniStreamGetProperty(
        stream: OniStreamHandle,
        propertyId: c_int,
        data: *mut c_void,
        pDataSize: *mut c_int,
    ) -> OniStatus;
    pub fn oniStreamSetProperty(
        stream: OniStreamHandle,
        propertyId: c_int,
        data: *const c_void,
        dataSize: c_int,
    ) -> OniStatus;

    pub fn oniFrameRelease(pFrame: *mut OniFrame);
}
