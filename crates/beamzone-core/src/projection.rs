use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Viewport rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// The transforms in effect when a shape is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub view: DMat4,
    pub projection: DMat4,
    /// Screen orientation correction; its inverse is applied last.
    pub orientation: DMat4,
    pub viewport: Viewport,
}

impl ViewTransform {
    /// Orthographic mapping where a canvas pixel projects onto itself.
    pub fn screen(width: f64, height: f64) -> Self {
        Self {
            view: DMat4::IDENTITY,
            projection: DMat4::orthographic_rh_gl(0.0, width, 0.0, height, -1.0, 1.0),
            orientation: DMat4::IDENTITY,
            viewport: Viewport::new(0.0, 0.0, width, height),
        }
    }

    /// Map a submission-space point into canvas space.
    ///
    /// Pure; a singular orientation or a zero `w` yields non-finite
    /// coordinates rather than an error.
    pub fn project(&self, p: DVec3) -> Point {
        let m = self.orientation.inverse() * self.projection * self.view;
        let clip = m * p.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        let s = (ndc + DVec3::ONE) * 0.5;
        Point::new(
            s.x * self.viewport.width + self.viewport.x,
            s.y * self.viewport.height + self.viewport.y,
        )
    }

    pub fn project_xy(&self, x: f64, y: f64) -> Point {
        self.project(DVec3::new(x, y, 0.0))
    }
}

/// Supplies the current transforms, typically once per frame.
pub trait ViewProvider {
    fn view_transform(&self) -> ViewTransform;
}

impl ViewProvider for ViewTransform {
    fn view_transform(&self) -> ViewTransform {
        *self
    }
}
