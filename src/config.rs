use std::fmt;

use crate::sensor::Registration;

/// Pacing of a recorded source
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PlaybackSpeed {
    /// One frame per read, independent of the recording's clock
    Manual,
    /// As fast as the player can decode, frames may be skipped by slow readers
    Fastest,
    /// Ratio of the original recording speed, `1.0` is real time
    Ratio(f32),
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        PlaybackSpeed::Manual
    }
}

impl From<PlaybackSpeed> for f32 {
    fn from(speed: PlaybackSpeed) -> Self {
        match speed {
            PlaybackSpeed::Manual => -1.0,
            PlaybackSpeed::Fastest => 0.0,
            PlaybackSpeed::Ratio(ratio) => ratio,
        }
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PlaybackSpeed::Manual => write!(f, "manual"),
            PlaybackSpeed::Fastest => write!(f, "fastest"),
            PlaybackSpeed::Ratio(ratio) => write!(f, "{}x", ratio),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
/// Stream configuration applied by [`crate::Session::start_with`]
pub struct StartConfig {
    /// Index into the depth mode list, `None` keeps the device default
    pub depth_mode: Option<usize>,
    /// Index into the color mode list, `None` keeps the device default
    pub color_mode: Option<usize>,
    /// Spatial registration between depth and color
    pub registration: Registration,
    /// Pacing of recorded sources, ignored for live devices
    pub playback_speed: PlaybackSpeed,
}

impl StartConfig {
    /// Returns the default configuration
    ///
    /// Default modes, depth-to-color registration and manual playback.
    ///
    /// # Example
    ///
    /// ```
    /// use onireader::{Registration, StartConfig};
    ///
    /// let config = StartConfig::new().with_depth_mode(1).with_registration(Registration::Off);
    /// assert_eq!(config.depth_mode, Some(1));
    /// assert_eq!(config.color_mode, None);
    /// ```
    pub fn new() -> Self {
        StartConfig::default()
    }

    /// Returns a configuration selecting modes by index
    ///
    /// # Arguments
    ///
    /// * `depth_mode` - Depth mode index, `None` for the device default
    /// * `color_mode` - Color mode index, `None` for the device default
    pub fn with_modes(depth_mode: Option<usize>, color_mode: Option<usize>) -> Self {
        StartConfig {
            depth_mode,
            color_mode,
            ..StartConfig::default()
        }
    }

    pub fn with_depth_mode(mut self, index: usize) -> Self {
        self.depth_mode = Some(index);
        self
    }

    pub fn with_color_mode(mut self, index: usize) -> Self {
        self.color_mode = Some(index);
        self
    }

    pub fn with_registration(mut self, registration: Registration) -> Self {
        self.registration = registration;
        self
    }

    pub fn with_playback_speed(mut self, speed: PlaybackSpeed) -> Self {
        self.playback_speed = speed;
        self
    }
}

impl fmt::Display for StartConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = |i: Option<usize>| i.map_or_else(|| String::from("default"), |i| i.to_string());

        writeln!(f, "depth mode     : {}", index(self.depth_mode))?;
        writeln!(f, "color mode     : {}", index(self.color_mode))?;
        writeln!(f, "registration   : {}", self.registration)?;
        writeln!(f, "playback speed : {}", self.playback_speed)?;
        Ok(())
    }
}
