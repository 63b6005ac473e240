use std::env;

use onireader::driver::openni::OpenNi;
use onireader::prelude::*;
use onireader::PlaybackSpeed;

fn main() -> onireader::Result<()> {
    let path = env::args().nth(1).unwrap_or_default();
    println!("Using device: {}\n", if path.is_empty() { "<any>" } else { path.as_str() });

    let mut session = Session::new(OpenNi)?;
    session.open(&path)?;
    if let Some(info) = session.device_info() {
        println!("Device:\n{}", info);
    }

    let config = StartConfig::new().with_playback_speed(PlaybackSpeed::Manual);
    session.start_with(&config)?;
    println!("Depth mode : {}", session.depth_mode()?);
    println!("Color mode : {}", session.color_mode()?);

    if !session.is_seekable() {
        println!("Live device, reading 30 frames");
    }
    let count = if session.is_seekable() {
        session.frame_count()
    } else {
        30
    };

    for _ in 0..count {
        let (depth, color) = session.read_pair()?;
        let values = depth.depth_values().unwrap_or_default();
        let valid = values.iter().filter(|&&v| v > 0).count();

        println!("Frame");
        println!("  depth index : {}", depth.frame_index());
        println!("  color index : {}", color.frame_index());
        println!("  timestamp   : {}", depth.timestamp());
        println!("  valid depth : {}/{}", valid, values.len());
    }

    Ok(())
}
