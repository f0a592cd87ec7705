use std::fs;
use std::io;
use std::path::Path;

use log::info;

use beamzone_core::settings::ManagerConfig;

use crate::settings::SettingsError;

/// Read a [`ManagerConfig`] from a JSON file. Absent fields take their
/// defaults; an absent file gives the default config.
pub fn load_config(path: impl AsRef<Path>) -> Result<ManagerConfig, SettingsError> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(json) => {
            let config = serde_json::from_str(&json)?;
            info!("config loaded from {}", path.display());
            Ok(config)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("no config at {}, using defaults", path.display());
            Ok(ManagerConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn save_config(path: impl AsRef<Path>, config: &ManagerConfig) -> Result<(), SettingsError> {
    fs::write(path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}
