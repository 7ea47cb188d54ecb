use icon_tools::config::{IconConfig, IconPaths};
use icon_tools::font::LabelFont;
use icon_tools::recreate::Diagnosis;

fn main() {
    env_logger::init();

    let config = IconConfig::load();
    let paths = IconPaths::from_config(&config);
    let font = LabelFont::discover(&config);

    Diagnosis::run_with_progress(&paths, &config.label, &font, |section| println!("{}", section));
}
