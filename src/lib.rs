//! Depth and color stream reader for OpenNI2 style sensors
//!
//! A [`Session`] binds one device (a live sensor or a recording), runs its depth and color
//! streams side by side and hands out every frame as an owned [`FrameBuffer`]. Devices are
//! reached through the traits in [`driver`]; the `openni2` feature provides the OpenNI2 binding,
//! [`driver::memory`] a synthetic one.

pub mod context;
pub mod driver;

mod capability;
pub use capability::Capabilities;

mod catalog;
pub use catalog::Catalog;

mod config;
pub use config::{PlaybackSpeed, StartConfig};

mod error;
pub use error::{Error, QueryFailure, Result};

mod format;
pub use format::PixelFormat;

mod frame;
pub use frame::FrameBuffer;

mod mode;
pub use mode::VideoMode;

mod sensor;
pub use sensor::{FieldOfView, Registration, SensorKind};

mod session;
pub use session::{DevicePlayback, DeviceStream, Session, State};

pub mod prelude {
    pub use crate::driver::{Device, Driver, Playback, Stream};
    pub use crate::{FrameBuffer, SensorKind, Session, StartConfig, VideoMode};
}
