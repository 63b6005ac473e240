#![allow(dead_code)]

use onireader::driver::memory::{MemoryDriver, Source};
use onireader::{PixelFormat, Session, VideoMode};

pub fn tiny_depth() -> Vec<VideoMode> {
    vec![
        VideoMode::new(8, 6, 30.0, PixelFormat::Depth1Mm).unwrap(),
        VideoMode::new(4, 3, 30.0, PixelFormat::Depth100Um).unwrap(),
    ]
}

pub fn tiny_color() -> Vec<VideoMode> {
    vec![
        VideoMode::new(8, 6, 30.0, PixelFormat::Rgb888).unwrap(),
        VideoMode::new(4, 3, 30.0, PixelFormat::Rgb888).unwrap(),
    ]
}

/// A small live source
pub fn live() -> Source {
    Source::live()
        .depth_modes(tiny_depth())
        .color_modes(tiny_color())
}

/// A small recording with independent depth and color frame counts
pub fn recorded(depth_frames: i64, color_frames: i64) -> Source {
    Source::recorded(depth_frames, color_frames)
        .depth_modes(tiny_depth())
        .color_modes(tiny_color())
}

/// Returns an opened session over a single device and a handle on the driver
pub fn opened(uri: &str, source: Source) -> (Session<MemoryDriver>, MemoryDriver) {
    let driver = MemoryDriver::new().with_device(uri, source);
    let mut session = Session::new(driver.clone()).unwrap();
    session.open(uri).unwrap();
    (session, driver)
}
