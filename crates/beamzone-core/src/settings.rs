use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ManagerError;
use crate::geometry::BBox;
use crate::partition::RoutingPolicy;
use crate::projector::ProjectorId;
use crate::zone::ZoneId;

/// Construction-time configuration of a [`LaserManager`](crate::LaserManager).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub master_intensity: f64,
    pub policy: RoutingPolicy,
    /// Pass mask pixels to projectors at dispatch.
    pub use_bitmap_mask: bool,
    /// Trace the mask's outline polygons as extra shapes.
    pub laser_mask_outlines: bool,
    pub show_zones: bool,
    pub show_preview: bool,
    pub preview: PreviewConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 800.0,
            master_intensity: 0.1,
            policy: RoutingPolicy::Automatic,
            use_bitmap_mask: false,
            laser_mask_outlines: false,
            show_zones: false,
            show_preview: true,
            preview: PreviewConfig::default(),
        }
    }
}

/// Placement of the on-screen preview, in window pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub gui_spacing: f64,
    pub small_preview_height: f64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            gui_spacing: 0.0,
            small_preview_height: 200.0,
        }
    }
}

/// Persisted manager-wide values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerSettings {
    pub master_intensity: f64,
    pub policy: RoutingPolicy,
    pub use_bitmap_mask: bool,
    pub laser_mask_outlines: bool,
    pub show_zones: bool,
    pub show_preview: bool,
}

/// Persisted zone rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSettings {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ZoneSettings {
    pub fn from_rect(rect: &BBox) -> Self {
        Self {
            x: rect.min.x,
            y: rect.min.y,
            width: rect.width(),
            height: rect.height(),
        }
    }

    pub fn rect(&self) -> BBox {
        BBox::from_origin_size(self.x, self.y, self.width, self.height)
    }
}

/// Persisted projector values. Projectors always start disarmed, so the
/// armed flag is not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectorSettings {
    pub name: String,
    pub test_pattern: u32,
    /// Owned zone indices, restored when those zones exist.
    #[serde(default)]
    pub zones: Vec<ZoneId>,
}

/// Everything the manager saves, keyed by zone and projector index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    pub manager: Option<ManagerSettings>,
    pub zones: BTreeMap<ZoneId, ZoneSettings>,
    pub projectors: BTreeMap<ProjectorId, ProjectorSettings>,
}

/// Index-keyed settings persistence.
pub trait SettingsStore {
    fn manager(&self) -> Option<ManagerSettings>;
    fn zone(&self, index: ZoneId) -> Option<ZoneSettings>;
    fn projector(&self, index: ProjectorId) -> Option<ProjectorSettings>;
    fn store(&mut self, snapshot: SettingsSnapshot) -> Result<(), ManagerError>;
}

/// In-memory store, useful for hosts that persist settings themselves.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    pub snapshot: SettingsSnapshot,
    /// Number of successful `store` calls.
    pub saves: usize,
}

impl SettingsStore for MemorySettings {
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
        self.saves += 1;
        Ok(())
    }
}
