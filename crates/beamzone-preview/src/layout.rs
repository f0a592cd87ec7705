use serde::{Deserialize, Serialize};

use beamzone_core::geometry::{BBox, Point};
use beamzone_core::settings::PreviewConfig;
use beamzone_core::zone::{CanvasSize, ZoneRegistry};
use beamzone_core::ProjectorId;

/// Size of the host window, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: f64,
    pub height: f64,
}

impl WindowSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Where the canvas preview sits in the window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewLayout {
    /// Window position of the canvas origin.
    pub offset: Point,
    /// Window pixels per canvas unit.
    pub scale: f64,
}

impl Default for PreviewLayout {
    fn default() -> Self {
        Self {
            offset: Point::default(),
            scale: 1.0,
        }
    }
}

impl PreviewLayout {
    /// Full size at the top left by default. With a projector selected the
    /// preview shrinks to a thumbnail below the canvas; otherwise `expand`
    /// fits it to the window.
    pub fn compute(
        config: &PreviewConfig,
        canvas: CanvasSize,
        window: WindowSize,
        current_projector: Option<ProjectorId>,
        expand: bool,
    ) -> Self {
        let spacing = config.gui_spacing;
        if current_projector.is_some() {
            return Self {
                offset: Point::new(spacing, canvas.height + spacing * 2.0),
                scale: ratio(config.small_preview_height, canvas.height),
            };
        }
        if expand {
            let mut scale = ratio(window.width, canvas.width);
            if canvas.height * scale > window.height {
                scale = ratio(window.height, canvas.height);
            }
            return Self {
                offset: Point::default(),
                scale,
            };
        }
        Self {
            offset: Point::new(spacing, spacing),
            scale: 1.0,
        }
    }

    /// Convert a canvas position to window pixels.
    pub fn to_window(&self, p: &Point) -> Point {
        Point::new(
            p.x * self.scale + self.offset.x,
            p.y * self.scale + self.offset.y,
        )
    }

    /// Convert a window position back to canvas space.
    pub fn to_canvas(&self, p: &Point) -> Point {
        Point::new(
            (p.x - self.offset.x) / self.scale,
            (p.y - self.offset.y) / self.scale,
        )
    }

    /// Push the layout into every zone and refresh their display flags.
    pub fn apply(
        &self,
        zones: &mut ZoneRegistry,
        show_zones: bool,
        current_projector: Option<ProjectorId>,
    ) {
        for zone in zones.iter_mut() {
            zone.visible = show_zones;
            zone.active = show_zones && current_projector.is_none();
            zone.preview_offset = self.offset;
            zone.preview_scale = self.scale;
        }
    }
}

fn ratio(a: f64, b: f64) -> f64 {
    if b > 0.0 {
        a / b
    } else {
        1.0
    }
}

/// Window rectangles for the row of per-projector path previews shown
/// under the canvas. The row shrinks to fit when it would overflow.
pub fn projector_thumbnails(
    config: &PreviewConfig,
    canvas: CanvasSize,
    window: WindowSize,
    count: usize,
) -> Vec<BBox> {
    let spacing = config.gui_spacing;
    let size = config.small_preview_height;
    let row = (size + spacing) * count as f64;
    let available = window.width - spacing * 2.0;
    let scale = if row > available && row > 0.0 {
        available / row
    } else {
        1.0
    };
    let top = canvas.height + spacing * 2.0;
    (0..count)
        .map(|i| {
            let x = spacing + (size * scale + spacing) * i as f64;
            BBox::from_origin_size(x, top, size * scale, size * scale)
        })
        .collect()
}
