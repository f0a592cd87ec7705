use log::debug;
use serde::{Deserialize, Serialize};

use beamzone_core::geometry::{BBox, Point};
use beamzone_core::mask::MaskSource;
use beamzone_core::shape::{Shape, ShapeKind};
use beamzone_core::style::Color;
use beamzone_core::zone::{CanvasSize, ZoneId, ZoneRegistry};
use beamzone_core::LaserManager;

use crate::layout::PreviewLayout;

/// Number of segments used to approximate a circle.
pub const CIRCLE_SEGMENTS: usize = 32;

/// Brightness of the second, additive glow pass.
pub const GLOW_DIM: f32 = 0.4;

/// One connected line strip, ready for the host's renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewStrip {
    /// Flat array of vertices: [x0, y0, x1, y1, ...]
    pub vertices: Vec<f64>,
    /// Flat array of colours: [r0, g0, b0, r1, ...] in 0..=1.
    pub colors: Vec<f32>,
}

impl PreviewStrip {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            colors: Vec::new(),
        }
    }

    pub fn push(&mut self, p: Point, color: [f32; 3]) {
        self.vertices.extend_from_slice(&[p.x, p.y]);
        self.colors.extend_from_slice(&color);
    }

    pub fn len(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn point(&self, i: usize) -> Point {
        Point::new(self.vertices[2 * i], self.vertices[2 * i + 1])
    }
}

impl Default for PreviewStrip {
    fn default() -> Self {
        Self::new()
    }
}

/// Anything that can draw itself into a preview.
pub trait PreviewSource {
    fn add_preview(&self, mesh: &mut PreviewMesh);
}

impl PreviewSource for Shape {
    fn add_preview(&self, mesh: &mut PreviewMesh) {
        let mut strip = PreviewStrip::new();
        match &self.kind {
            ShapeKind::Line { start, end, color } => {
                let c = color.to_f32_array();
                strip.push(*start, c);
                strip.push(*end, c);
            }
            ShapeKind::Dot {
                position,
                color,
                intensity,
            } => {
                strip.push(*position, color.scaled(*intensity).to_f32_array());
            }
            ShapeKind::Polyline {
                vertices,
                colors,
                closed,
            } => {
                for (i, v) in vertices.iter().enumerate() {
                    strip.push(*v, colors.at(i).to_f32_array());
                }
                if *closed {
                    if let Some(first) = vertices.first() {
                        strip.push(*first, colors.at(0).to_f32_array());
                    }
                }
            }
            ShapeKind::Circle {
                center,
                radius,
                color,
            } => {
                let c = color.to_f32_array();
                for i in 0..=CIRCLE_SEGMENTS {
                    let a = std::f64::consts::TAU * i as f64 / CIRCLE_SEGMENTS as f64;
                    strip.push(
                        Point::new(center.x + radius * a.cos(), center.y + radius * a.sin()),
                        c,
                    );
                }
            }
        }
        mesh.strips.push(strip);
    }
}

/// All strips of one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewMesh {
    pub strips: Vec<PreviewStrip>,
}

impl PreviewMesh {
    pub fn from_shapes<'a>(shapes: impl IntoIterator<Item = &'a Shape>) -> Self {
        let mut mesh = Self::default();
        for shape in shapes {
            shape.add_preview(&mut mesh);
        }
        mesh
    }

    /// Scale every vertex colour by the mask brightness under it. Vertices
    /// outside the canvas go dark.
    pub fn apply_mask(&mut self, canvas: CanvasSize, mask: &dyn MaskSource) {
        let bounds = canvas.bbox();
        for strip in &mut self.strips {
            for i in 0..strip.len() {
                let p = strip.point(i);
                let brightness = if bounds.contains_point(&p) {
                    mask.brightness(p.x, p.y) as f32
                } else {
                    0.0
                };
                for c in &mut strip.colors[3 * i..3 * i + 3] {
                    *c *= brightness;
                }
            }
        }
    }

    pub fn dimmed(&self, factor: f32) -> Self {
        let mut out = self.clone();
        for strip in &mut out.strips {
            for c in &mut strip.colors {
                *c *= factor;
            }
        }
        out
    }

    pub fn vertex_count(&self) -> usize {
        self.strips.iter().map(|s| s.len()).sum()
    }
}

/// A zone rectangle as shown over the preview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneOutline {
    pub index: ZoneId,
    /// [min_x, min_y, max_x, max_y] in canvas space.
    pub rect: [f64; 4],
    pub visible: bool,
    pub active: bool,
}

impl ZoneOutline {
    fn from_rect(index: ZoneId, rect: &BBox, visible: bool, active: bool) -> Self {
        Self {
            index,
            rect: [rect.min.x, rect.min.y, rect.max.x, rect.max.y],
            visible,
            active,
        }
    }
}

/// Complete preview of one frame, handed to whatever draws the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewFrame {
    pub canvas: CanvasSize,
    pub strips: Vec<PreviewStrip>,
    /// Additive second pass over `strips`.
    pub glow: Vec<PreviewStrip>,
    pub zones: Vec<ZoneOutline>,
    pub layout: PreviewLayout,
    pub outline_color: [f32; 3],
}

impl PreviewFrame {
    pub fn empty(canvas: CanvasSize, layout: PreviewLayout) -> Self {
        Self {
            canvas,
            strips: Vec::new(),
            glow: Vec::new(),
            zones: Vec::new(),
            layout,
            outline_color: Color::new(50, 50, 50).to_f32_array(),
        }
    }

    /// Build the preview of the manager's current frame.
    pub fn capture(manager: &LaserManager, layout: PreviewLayout) -> Self {
        let canvas = manager.canvas();
        let mut mesh = PreviewMesh::from_shapes(manager.shapes().shapes());
        if manager.config().use_bitmap_mask {
            if let Some(mask) = manager.mask() {
                mesh.apply_mask(canvas, mask);
            }
        }
        let glow = mesh.dimmed(GLOW_DIM);

        let mut frame = Self::empty(canvas, layout);
        frame.zones = zone_outlines(manager.zones());
        frame.strips = mesh.strips;
        frame.glow = glow.strips;
        debug!(
            "preview captured: {} strips, {} zones, scale {}",
            frame.strips.len(),
            frame.zones.len(),
            layout.scale
        );
        frame
    }
}

pub fn zone_outlines(zones: &ZoneRegistry) -> Vec<ZoneOutline> {
    zones
        .iter()
        .map(|z| ZoneOutline::from_rect(z.index, &z.rect(), z.visible, z.active))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamzone_core::mask::MaskPixels;
    use beamzone_core::shape::PolylineColors;
    use beamzone_core::style::Profile;

    #[test]
    fn test_dot_is_single_point_strip() {
        let dot = Shape::dot(Point::new(3.0, 4.0), Color::WHITE, 0.5, Profile::default());
        let mesh = PreviewMesh::from_shapes([&dot]);
        assert_eq!(mesh.strips.len(), 1);
        assert_eq!(mesh.strips[0].len(), 1);
        assert!((mesh.strips[0].colors[0] - 127.0 / 255.0).abs() < 0.01);
    }

    #[test]
    fn test_closed_polyline_repeats_first_vertex() {
        let shape = Shape::polyline(
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
            ],
            PolylineColors::Uniform(Color::CYAN),
            true,
            Profile::default(),
        )
        .unwrap();
        let mesh = PreviewMesh::from_shapes([&shape]);
        let strip = &mesh.strips[0];
        assert_eq!(strip.len(), 4);
        assert_eq!(strip.point(3), strip.point(0));
    }

    #[test]
    fn test_circle_is_closed_loop() {
        let circle = Shape::circle(Point::new(50.0, 50.0), 10.0, Color::WHITE, Profile::default());
        let mesh = PreviewMesh::from_shapes([&circle]);
        let strip = &mesh.strips[0];
        assert_eq!(strip.len(), CIRCLE_SEGMENTS + 1);
        let first = strip.point(0);
        let last = strip.point(CIRCLE_SEGMENTS);
        assert!(first.distance_to(&last) < 1e-9);
        assert!((first.distance_to(&Point::new(50.0, 50.0)) - 10.0).abs() < 1e-9);
    }

    struct HalfMask {
        pixels: MaskPixels,
    }

    impl MaskSource for HalfMask {
        fn init(&mut self, width: usize, height: usize) {
            self.pixels = MaskPixels::open(width, height);
        }

        fn update(&mut self) {}

        fn pixels(&self) -> &MaskPixels {
            &self.pixels
        }

        // left half open, right half blocked
        fn brightness(&self, x: f64, _y: f64) -> f64 {
            if x < 50.0 {
                1.0
            } else {
                0.0
            }
        }

        fn outline_shapes(&self) -> Vec<Vec<Point>> {
            Vec::new()
        }
    }

    #[test]
    fn test_mask_darkens_blocked_and_outside_vertices() {
        let line = Shape::line(
            Point::new(10.0, 10.0),
            Point::new(60.0, 10.0),
            Color::WHITE,
            Profile::default(),
        );
        let outside = Shape::dot(Point::new(150.0, 10.0), Color::WHITE, 1.0, Profile::default());
        let mut mesh = PreviewMesh::from_shapes([&line, &outside]);
        let mask = HalfMask {
            pixels: MaskPixels::open(100, 100),
        };
        mesh.apply_mask(CanvasSize::new(100.0, 100.0), &mask);

        assert_eq!(&mesh.strips[0].colors[0..3], &[1.0, 1.0, 1.0]);
        assert_eq!(&mesh.strips[0].colors[3..6], &[0.0, 0.0, 0.0]);
        assert_eq!(&mesh.strips[1].colors[0..3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_dimmed_scales_colors_only() {
        let line = Shape::line(
            Point::new(0.0, 0.0),
            Point::new(5.0, 5.0),
            Color::WHITE,
            Profile::default(),
        );
        let mesh = PreviewMesh::from_shapes([&line]);
        let glow = mesh.dimmed(GLOW_DIM);
        assert_eq!(glow.strips[0].vertices, mesh.strips[0].vertices);
        assert!((glow.strips[0].colors[0] - 0.4).abs() < 1e-6);
        assert_eq!(glow.vertex_count(), 2);
    }

    #[test]
    fn test_frame_serializes() {
        let frame = PreviewFrame::empty(CanvasSize::new(800.0, 600.0), PreviewLayout::default());
        let json = serde_json::to_string(&frame).unwrap();
        let back: PreviewFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }
}
