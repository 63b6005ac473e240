use log::trace;

use crate::driver::{Device, Stream};
use crate::error::{Error, QueryFailure, Result};
use crate::mode::VideoMode;
use crate::sensor::SensorKind;

/// Depth and color streams of a started session
pub(crate) struct Pair<S> {
    pub depth: S,
    pub color: S,
}

impl<S> Pair<S> {
    pub fn get(&self, kind: SensorKind) -> &S {
        match kind {
            SensorKind::Depth => &self.depth,
            SensorKind::Color => &self.color,
        }
    }

    pub fn get_mut(&mut self, kind: SensorKind) -> &mut S {
        match kind {
            SensorKind::Depth => &mut self.depth,
            SensorKind::Color => &mut self.color,
        }
    }
}

/// Video modes of the device bound to a session
///
/// Every call queries the driver, nothing is cached.
pub struct Catalog<'a, D: Device> {
    device: Option<&'a D>,
    streams: Option<&'a Pair<D::Stream>>,
}

impl<'a, D: Device> Catalog<'a, D> {
    pub(crate) fn new(device: Option<&'a D>, streams: Option<&'a Pair<D::Stream>>) -> Self {
        Catalog { device, streams }
    }

    /// Returns every mode the sensor supports, in driver order
    ///
    /// Callers select modes by their position in this list.
    ///
    /// # Arguments
    ///
    /// * `kind` - Sensor to query
    pub fn modes(&self, kind: SensorKind) -> Result<Vec<VideoMode>> {
        let device = self.device.ok_or(Error::DeviceQuery {
            kind,
            reason: QueryFailure::NotOpened,
        })?;
        let modes = device.sensor_modes(kind).ok_or(Error::DeviceQuery {
            kind,
            reason: QueryFailure::NoSensor,
        })?;

        trace!("{} sensor reports {} modes", kind, modes.len());
        Ok(modes)
    }

    /// Returns the mode at `index` of [`Catalog::modes`]
    pub fn mode(&self, kind: SensorKind, index: usize) -> Result<VideoMode> {
        let modes = self.modes(kind)?;
        modes.get(index).copied().ok_or(Error::ModeIndex {
            kind,
            index,
            available: modes.len(),
        })
    }

    /// Returns the mode the active stream is running
    ///
    /// Only available once the session is started.
    pub fn current(&self, kind: SensorKind) -> Result<VideoMode> {
        let streams = self.streams.ok_or(Error::NotStarted)?;
        streams
            .get(kind)
            .video_mode()
            .map_err(|source| Error::Stream { kind, source })
    }
}
