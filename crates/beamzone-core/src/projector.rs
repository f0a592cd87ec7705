use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{BBox, Point};
use crate::mask::MaskPixels;
use crate::shape::Shape;
use crate::style::Color;
use crate::zone::{CanvasSize, ZoneId};

/// Index of a registered projector, in registration order.
pub type ProjectorId = usize;

/// A single pre-built output point, bypassing shape collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaserPoint {
    pub position: Point,
    pub color: Color,
}

impl LaserPoint {
    pub fn new(x: f64, y: f64, color: Color) -> Self {
        Self {
            position: Point::new(x, y),
            color,
        }
    }
}

/// One owned zone's shapes for this frame.
#[derive(Debug, Clone)]
pub struct ZoneShapes<'a> {
    pub zone: ZoneId,
    pub rect: BBox,
    pub shapes: Vec<&'a Shape>,
}

/// Everything a projector receives at dispatch.
#[derive(Debug, Clone)]
pub struct ProjectorFrame<'a> {
    pub armed: bool,
    pub test_pattern: u32,
    /// In the order the zones were assigned to the projector.
    pub zones: Vec<ZoneShapes<'a>>,
}

impl ProjectorFrame<'_> {
    pub fn shape_count(&self) -> usize {
        self.zones.iter().map(|z| z.shapes.len()).sum()
    }
}

/// An output device that turns zone shapes into a point stream.
///
/// Calls are synchronous and may block on hardware I/O; bounding that
/// latency is the implementor's job.
pub trait Projector {
    /// A zone was assigned to this projector.
    fn add_zone(&mut self, zone: ZoneId, rect: BBox, canvas: CanvasSize);
    /// Start of frame. `zone_rects_changed` is true if any zone moved.
    fn update(&mut self, zone_rects_changed: bool);
    fn send(&mut self, frame: &ProjectorFrame<'_>, mask: Option<&MaskPixels>, master_intensity: f64);
    fn send_raw_points(&mut self, points: &[LaserPoint], zone: ZoneId, master_intensity: f64);
    fn point_rate(&self) -> u32;
    fn frame_rate(&self) -> f64;
}

/// A registered projector and the zones it owns.
pub struct ProjectorRecord {
    pub id: Uuid,
    pub name: String,
    pub device: Box<dyn Projector>,
    zones: Vec<ZoneId>,
    pub armed: bool,
    pub test_pattern: u32,
}

impl std::fmt::Debug for ProjectorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectorRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("zones", &self.zones)
            .field("armed", &self.armed)
            .field("test_pattern", &self.test_pattern)
            .finish_non_exhaustive()
    }
}

impl ProjectorRecord {
    pub fn new(name: &str, device: Box<dyn Projector>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            device,
            zones: Vec::new(),
            armed: false,
            test_pattern: 0,
        }
    }

    pub fn zones(&self) -> &[ZoneId] {
        &self.zones
    }

    /// Returns false if the zone was already owned.
    pub(crate) fn own_zone(&mut self, zone: ZoneId) -> bool {
        if self.zones.contains(&zone) {
            return false;
        }
        self.zones.push(zone);
        true
    }
}
