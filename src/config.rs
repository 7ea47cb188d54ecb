use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_ASSETS_DIR: &str = "assets";
const DEFAULT_LABEL: &str = "ATT";

pub const ICON_FILE: &str = "icon.png";
pub const NEW_ICON_FILE: &str = "icon_new.png";
pub const REPAIRED_ICON_FILE: &str = "icon_repaired.png";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    pub assets_dir: PathBuf,
    pub label: String,
    pub font_path: Option<PathBuf>,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            label: DEFAULT_LABEL.to_string(),
            font_path: None,
        }
    }
}

impl IconConfig {
    /// Location of the optional config file, `<config_dir>/icon-tools/config.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("icon-tools")
            .join("config.json")
    }

    /// Loads the config from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::default_path()).unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        log::debug!("Attempting to load config from: {:?}", path);
        if !path.exists() {
            log::debug!("Config file does not exist at: {:?}", path);
            return None;
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<IconConfig>(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }
}

/// The fixed set of files the scripts read and write.
#[derive(Debug, Clone, PartialEq)]
pub struct IconPaths {
    pub icon: PathBuf,
    pub new_icon: PathBuf,
    pub repaired_icon: PathBuf,
}

impl IconPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            icon: dir.join(ICON_FILE),
            new_icon: dir.join(NEW_ICON_FILE),
            repaired_icon: dir.join(REPAIRED_ICON_FILE),
        }
    }

    pub fn from_config(config: &IconConfig) -> Self {
        Self::in_dir(&config.assets_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths() {
        let paths = IconPaths::from_config(&IconConfig::default());
        assert_eq!(paths.icon, Path::new("assets/icon.png"));
        assert_eq!(paths.new_icon, Path::new("assets/icon_new.png"));
        assert_eq!(paths.repaired_icon, Path::new("assets/icon_repaired.png"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "font_path": "/opt/fonts/Brand.ttf" }"#).unwrap();

        let config = IconConfig::load_from(&path).unwrap();
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
        assert_eq!(config.label, "ATT");
        assert_eq!(config.font_path, Some(PathBuf::from("/opt/fonts/Brand.ttf")));
    }

    #[test]
    fn test_missing_or_malformed_config() {
        let dir = TempDir::new().unwrap();
        assert!(IconConfig::load_from(&dir.path().join("absent.json")).is_none());

        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(IconConfig::load_from(&path).is_none());
    }
}
