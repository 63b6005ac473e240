use std::convert::TryFrom;
use std::fmt;

/// Kind of sensor backing a stream
///
/// The discriminants match the OpenNI2 sensor type codes.
#[rustfmt::skip]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Color   = 2,
    Depth   = 3,
}

impl SensorKind {
    /// Both stream kinds a session drives, in read order
    pub const ALL: [SensorKind; 2] = [SensorKind::Depth, SensorKind::Color];
}

impl TryFrom<u32> for SensorKind {
    type Error = String;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            2 => Ok(SensorKind::Color),
            3 => Ok(SensorKind::Depth),
            code => Err(format!("Unsupported sensor type: {}", code)),
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SensorKind::Color => write!(f, "color"),
            SensorKind::Depth => write!(f, "depth"),
        }
    }
}

/// Spatial registration between the depth and color streams of a device
#[rustfmt::skip]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Depth and color pixel grids are independent
    Off             = 0,
    /// Depth pixels are remapped so that `(x, y)` addresses the same point in both frames
    DepthToColor    = 1,
}

impl Default for Registration {
    fn default() -> Self {
        Registration::DepthToColor
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Registration::Off => write!(f, "off"),
            Registration::DepthToColor => write!(f, "depth-to-color"),
        }
    }
}

/// Field of view of a stream, in radians
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FieldOfView {
    pub horizontal: f32,
    pub vertical: f32,
}

impl fmt::Display for FieldOfView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}° x {:.1}°",
            self.horizontal.to_degrees(),
            self.vertical.to_degrees()
        )
    }
}
