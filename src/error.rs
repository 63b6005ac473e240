use std::{fmt, io};

use thiserror::Error;

use crate::sensor::SensorKind;

/// Why a capability query could not be answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFailure {
    /// No device is bound to the session
    NotOpened,
    /// The device has no sensor of the requested kind
    NoSensor,
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            QueryFailure::NotOpened => write!(f, "no device is open"),
            QueryFailure::NoSensor => write!(f, "device has no such sensor"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("driver initialization failed: {0}")]
    Init(#[source] io::Error),

    #[error("failed to open device {uri:?}: {source}")]
    DeviceOpen {
        uri: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot query {kind} modes: {reason}")]
    DeviceQuery { kind: SensorKind, reason: QueryFailure },

    #[error("no device is open")]
    NotOpened,

    #[error("streams are not started")]
    NotStarted,

    #[error("{kind} mode index {index} is out of range ({available} modes available)")]
    ModeIndex {
        kind: SensorKind,
        index: usize,
        available: usize,
    },

    #[error("{kind} stream: {source}")]
    Stream {
        kind: SensorKind,
        #[source]
        source: io::Error,
    },

    #[error("failed to set image registration: {0}")]
    Registration(#[source] io::Error),

    #[error("playback control: {0}")]
    Playback(#[source] io::Error),

    #[error("live sources cannot seek")]
    SeekUnsupported,

    #[error("frame {index} is outside the recording ({count} frames)")]
    SeekOutOfRange { index: i64, count: i64 },

    #[error("failed to seek {kind} stream: {source}")]
    Seek {
        kind: SensorKind,
        #[source]
        source: io::Error,
    },

    #[error(
        "{kind} frame of {width}x{height} carries {actual} bytes, expected {expected}"
    )]
    FrameDecode {
        kind: SensorKind,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

impl Error {
    /// Whether the error only affects the call that produced it
    ///
    /// Seek and frame decode failures leave the session usable, so a read loop can carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::SeekUnsupported
                | Error::SeekOutOfRange { .. }
                | Error::Seek { .. }
                | Error::FrameDecode { .. }
                | Error::DeviceQuery { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_stream() {
        let err = Error::FrameDecode {
            kind: SensorKind::Color,
            width: 4,
            height: 2,
            expected: 24,
            actual: 20,
        };
        assert_eq!(
            err.to_string(),
            "color frame of 4x2 carries 20 bytes, expected 24"
        );

        let err = Error::DeviceQuery {
            kind: SensorKind::Depth,
            reason: QueryFailure::NoSensor,
        };
        assert_eq!(
            err.to_string(),
            "cannot query depth modes: device has no such sensor"
        );
    }

    #[test]
    fn lifecycle_errors_are_not_recoverable() {
        assert!(Error::SeekUnsupported.is_recoverable());
        assert!(Error::SeekOutOfRange { index: 9, count: 3 }.is_recoverable());
        assert!(!Error::NotStarted.is_recoverable());
        assert!(!Error::Init(io::Error::new(io::ErrorKind::Other, "boom")).is_recoverable());
    }
}
