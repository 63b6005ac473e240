use std::time::Instant;

use onireader::driver::memory::{MemoryDriver, Source};
use onireader::prelude::*;

fn main() -> onireader::Result<()> {
    let uri = "synthetic://recording";
    println!("Using device: {}\n", uri);

    let driver = MemoryDriver::new().with_device(uri, Source::recorded(90, 90).drop_every(30));
    let mut session = Session::new(driver)?;
    session.open(uri)?;

    if let Some(info) = session.device_info() {
        println!("Device:\n{}", info);
    }
    println!("Capabilities: {}\n", session.capabilities());

    println!("Depth modes:");
    for (i, mode) in session.depth_modes()?.iter().enumerate() {
        println!("  [{}] {}", i, mode);
    }
    println!("Color modes:");
    for (i, mode) in session.color_modes()?.iter().enumerate() {
        println!("  [{}] {}", i, mode);
    }
    println!();

    let config = StartConfig::new().with_depth_mode(1).with_color_mode(1);
    println!("Start configuration:\n{}", config);
    session.start_with(&config)?;

    println!("Depth mode  : {}", session.depth_mode()?);
    println!("Color mode  : {}", session.color_mode()?);
    println!("FOV         : {}", session.field_of_view(SensorKind::Depth)?);
    println!("Max depth   : {}", session.max_depth()?);
    println!("Frames      : {}\n", session.frame_count());

    let start = Instant::now();
    let mut lost = 0;
    for _ in 0..session.frame_count() {
        let (depth, color) = session.read_pair()?;
        if depth.is_empty() || color.is_empty() {
            lost += 1;
            continue;
        }

        if depth.frame_index() % 30 == 0 {
            println!("Frame");
            println!("  index     : {}", depth.frame_index());
            println!("  timestamp : {}", depth.timestamp());
            println!("  depth     : {:?}", depth.shape());
            println!("  color     : {:?}", color.shape());
        }
    }

    session.seek(45)?;
    let depth = session.read_depth()?;
    println!();
    println!("After seek to 45: frame {}", depth.frame_index());
    println!("Lost frames: {}", lost);
    println!(
        "FPS: {}",
        session.frame_count() as f64 / start.elapsed().as_secs_f64()
    );

    session.close();
    Ok(())
}
