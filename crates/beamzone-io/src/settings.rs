use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use beamzone_core::error::ManagerError;
use beamzone_core::settings::{
    ManagerSettings, ProjectorSettings, SettingsSnapshot, SettingsStore, ZoneSettings,
};
use beamzone_core::{ProjectorId, ZoneId};

// ── Errors ────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SettingsError> for ManagerError {
    fn from(e: SettingsError) -> Self {
        ManagerError::Settings(e.to_string())
    }
}

// ── JSON store ────────────────────────────────────────────────────────

/// Settings kept in a single pretty-printed JSON file.
///
/// The file is read once on [`open`](Self::open) and rewritten on every
/// `store`.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
    snapshot: SettingsSnapshot,
}

impl JsonSettingsStore {
    /// Load `path`. A missing file gives an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match fs::read_to_string(&path) {
            Ok(json) => {
                debug!("settings loaded from {}", path.display());
                from_json(&json)?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("no settings at {}, starting empty", path.display());
                SettingsSnapshot::default()
            }
            Err(e) => return Err(SettingsError::Io(e)),
        };
        Ok(Self { path, snapshot })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> &SettingsSnapshot {
        &self.snapshot
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        fs::write(&self.path, to_json(&self.snapshot)?)?;
        debug!("settings written to {}", self.path.display());
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn manager(&self) -> Option<ManagerSettings> {
        self.snapshot.manager.clone()
    }

    fn zone(&self, index: ZoneId) -> Option<ZoneSettings> {
        self.snapshot.zones.get(&index).copied()
    }

    fn projector(&self, index: ProjectorId) -> Option<ProjectorSettings> {
        self.snapshot.projectors.get(&index).cloned()
    }

    fn store(&mut self, snapshot: SettingsSnapshot) -> Result<(), ManagerError> {
        self.snapshot = snapshot;
        self.save()?;
        Ok(())
    }
}

pub fn to_json(snapshot: &SettingsSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(snapshot)
}

pub fn from_json(json: &str) -> Result<SettingsSnapshot, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamzone_core::geometry::BBox;
    use beamzone_core::partition::RoutingPolicy;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("beamzone-settings-{}.json", uuid::Uuid::new_v4()))
    }

    fn snapshot() -> SettingsSnapshot {
        let mut s = SettingsSnapshot {
            manager: Some(ManagerSettings {
                master_intensity: 0.3,
                policy: RoutingPolicy::Manual,
                use_bitmap_mask: true,
                laser_mask_outlines: false,
                show_zones: true,
                show_preview: true,
            }),
            ..Default::default()
        };
        s.zones.insert(
            1,
            ZoneSettings::from_rect(&BBox::from_origin_size(400.0, 0.0, 400.0, 600.0)),
        );
        s.projectors.insert(
            0,
            ProjectorSettings {
                name: "Stage left".to_string(),
                test_pattern: 4,
                zones: vec![1],
            },
        );
        s
    }

    #[test]
    fn test_missing_file_is_empty() {
        let store = JsonSettingsStore::open(temp_path()).unwrap();
        assert!(store.manager().is_none());
        assert!(store.zone(0).is_none());
        assert!(store.projector(0).is_none());
    }

    #[test]
    fn test_store_writes_and_reopens() {
        let path = temp_path();
        let mut store = JsonSettingsStore::open(&path).unwrap();
        store.store(snapshot()).unwrap();

        let reopened = JsonSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.snapshot(), &snapshot());
        assert_eq!(reopened.manager().unwrap().policy, RoutingPolicy::Manual);
        assert_eq!(
            reopened.zone(1).unwrap().rect(),
            BBox::from_origin_size(400.0, 0.0, 400.0, 600.0)
        );
        assert_eq!(reopened.projector(0).unwrap().name, "Stage left");
        assert_eq!(reopened.projector(0).unwrap().zones, vec![1]);

        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"policy\": \"manual\""));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = temp_path();
        fs::write(&path, "{ not json").unwrap();
        let err = JsonSettingsStore::open(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Json(_)));
        let converted: ManagerError = err.into();
        assert!(matches!(converted, ManagerError::Settings(_)));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unwritable_path_reports_settings_error() {
        let dir = temp_path();
        fs::create_dir_all(&dir).unwrap();
        // a directory cannot be written as a file
        let mut store = JsonSettingsStore {
            path: dir.clone(),
            snapshot: SettingsSnapshot::default(),
        };
        let result = store.store(snapshot());
        assert!(matches!(result, Err(ManagerError::Settings(_))));
        fs::remove_dir_all(&dir).unwrap();
    }
}
