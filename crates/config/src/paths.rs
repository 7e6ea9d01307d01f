//! ARMORY path utilities

use std::path::PathBuf;

/// Data directory (~/.armory)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".armory"))
        .unwrap_or_else(|| PathBuf::from(".armory"))
}

/// Default configuration file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}
