use icon_tools::compress::compress_icon;
use icon_tools::config::{IconConfig, IconPaths};
use icon_tools::IconError;

fn main() -> Result<(), IconError> {
    env_logger::init();

    let paths = IconPaths::from_config(&IconConfig::load());
    let report = compress_icon(&paths.icon)?;

    println!("Image restored: {} KB", report.kilobytes());
    println!("Size: {}", report.size());
    println!("Mode: {}", report.mode);
    Ok(())
}
