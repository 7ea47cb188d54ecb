use icon_tools::config::{IconConfig, IconPaths};
use icon_tools::flatten::flatten_icon;
use icon_tools::IconError;

fn main() -> Result<(), IconError> {
    env_logger::init();

    let paths = IconPaths::from_config(&IconConfig::load());
    let flattened = flatten_icon(&paths.icon)?;

    let original = &flattened.original;
    println!("Original image: {}, mode: {}", original.size(), original.mode);

    let result = &flattened.result;
    println!(
        "Final image: {}, mode: {}, weight: {} KB",
        result.size(),
        result.mode,
        result.kilobytes()
    );
    Ok(())
}
