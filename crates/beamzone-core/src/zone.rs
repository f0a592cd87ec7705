use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::buffer::ShapeId;
use crate::geometry::{BBox, Point};
use crate::shape::Shape;

/// Stable zone index, assigned in creation order.
pub type ZoneId = usize;

/// Size of the logical output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn bbox(&self) -> BBox {
        BBox::from_origin_size(0.0, 0.0, self.width, self.height)
    }
}

/// A rectangular subdivision of the canvas and the shapes routed to it this frame.
#[derive(Debug, Clone)]
pub struct Zone {
    pub index: ZoneId,
    rect: BBox,
    shapes: Vec<ShapeId>,
    /// Drawn as an outline in previews.
    pub visible: bool,
    /// Accepts interactive edits in previews.
    pub active: bool,
    /// Display-only placement used by previews.
    pub preview_offset: Point,
    pub preview_scale: f64,
    rect_changed: bool,
}

impl Zone {
    pub fn new(index: ZoneId, rect: BBox) -> Self {
        Self {
            index,
            rect,
            shapes: Vec::new(),
            visible: false,
            active: false,
            preview_offset: Point::default(),
            preview_scale: 1.0,
            rect_changed: true,
        }
    }

    pub fn rect(&self) -> BBox {
        self.rect
    }

    pub fn set_rect(&mut self, rect: BBox) {
        if rect != self.rect {
            self.rect = rect;
            self.rect_changed = true;
        }
    }

    /// Record `shape` if any part of it falls inside this zone.
    pub fn add_shape(&mut self, id: ShapeId, shape: &Shape) -> bool {
        if shape.intersects_rect(&self.rect) {
            self.shapes.push(id);
            true
        } else {
            false
        }
    }

    /// Record `id` without a geometric test.
    pub fn push_shape(&mut self, id: ShapeId) {
        self.shapes.push(id);
    }

    pub fn shapes(&self) -> &[ShapeId] {
        &self.shapes
    }

    pub fn clear_shapes(&mut self) {
        self.shapes.clear();
    }

    /// Advance per-frame state. Returns true if the rectangle changed since
    /// the previous call.
    pub fn update(&mut self) -> bool {
        std::mem::take(&mut self.rect_changed)
    }
}

/// Ordered, grow-only collection of zones.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a zone. A non-positive width or height spans the full canvas.
    pub fn add_zone(&mut self, x: f64, y: f64, w: f64, h: f64, canvas: CanvasSize) -> ZoneId {
        let w = if w <= 0.0 { canvas.width } else { w };
        let h = if h <= 0.0 { canvas.height } else { h };
        let index = self.zones.len();
        self.zones
            .push(Zone::new(index, BBox::from_origin_size(x, y, w, h)));
        debug!("zone {} added at ({}, {}) size {}x{}", index, x, y, w, h);
        index
    }

    /// Create one full-canvas zone if there are none yet.
    pub fn bootstrap_default_if_empty(&mut self, canvas: CanvasSize) -> Option<ZoneId> {
        if !self.zones.is_empty() {
            return None;
        }
        info!(
            "no zones defined, creating default zone {}x{}",
            canvas.width, canvas.height
        );
        Some(self.add_zone(0.0, 0.0, canvas.width, canvas.height, canvas))
    }

    pub fn get(&self, index: ZoneId) -> Option<&Zone> {
        self.zones.get(index)
    }

    pub fn get_mut(&mut self, index: ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Zone> {
        self.zones.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn clear_all_shapes(&mut self) {
        for zone in &mut self.zones {
            zone.clear_shapes();
        }
    }

    /// Update every zone; true if any rectangle changed.
    pub fn update_all(&mut self) -> bool {
        // Every zone must be updated, so no short-circuiting `any`.
        self.zones
            .iter_mut()
            .fold(false, |changed, zone| zone.update() | changed)
    }
}
