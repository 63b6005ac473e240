use std::fmt;

bitflags::bitflags! {
    /// What a bound device can do
    #[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
    pub struct Capabilities : u32 {
        /// Device has a depth sensor
        const DEPTH     = 0x0001;
        /// Device has a color sensor
        const COLOR     = 0x0002;
        /// Source is a recording with seek and frame count support
        const PLAYBACK  = 0x0004;
    }
}

impl From<u32> for Capabilities {
    fn from(flags: u32) -> Self {
        Self::from_bits_truncate(flags)
    }
}

impl From<Capabilities> for u32 {
    fn from(caps: Capabilities) -> Self {
        caps.bits()
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut prefix = "";

        let mut print_flag = |flag: Capabilities, info: &str| -> fmt::Result {
            if self.contains(flag) {
                write!(f, "{}{}", prefix, info)?;
                prefix = ", ";
            }
            Ok(())
        };

        print_flag(Capabilities::DEPTH, "Depth")?;
        print_flag(Capabilities::COLOR, "Color")?;
        print_flag(Capabilities::PLAYBACK, "Playback")?;

        if self.is_empty() {
            write!(f, "none")?;
        }
        Ok(())
    }
}
