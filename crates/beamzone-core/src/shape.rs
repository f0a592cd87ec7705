use serde::{Deserialize, Serialize};

use crate::geometry::{perimeter, BBox, Point};
use crate::style::{Color, Profile};
use crate::zone::ZoneId;

/// Minimum perimeter of a single-colour polyline; shorter ones are dropped.
pub const MIN_POLYLINE_PERIMETER: f64 = 0.01;
/// Minimum perimeter of a polyline with per-vertex colours.
pub const MIN_MULTICOLOR_PERIMETER: f64 = 0.1;

/// Colouring of a polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PolylineColors {
    Uniform(Color),
    /// One colour per vertex. Missing entries repeat the last colour.
    PerVertex(Vec<Color>),
}

impl PolylineColors {
    /// Colour of vertex `i`.
    pub fn at(&self, i: usize) -> Color {
        match self {
            PolylineColors::Uniform(c) => *c,
            PolylineColors::PerVertex(colors) => colors
                .get(i)
                .or_else(|| colors.last())
                .copied()
                .unwrap_or_default(),
        }
    }
}

/// The geometry and colour of a submitted primitive, in canvas space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Line {
        start: Point,
        end: Point,
        color: Color,
    },
    Dot {
        position: Point,
        color: Color,
        intensity: f64,
    },
    Polyline {
        vertices: Vec<Point>,
        colors: PolylineColors,
        closed: bool,
    },
    Circle {
        center: Point,
        radius: f64,
        color: Color,
    },
}

/// A drawable primitive collected during one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub profile: Profile,
    /// Explicit zone, only consulted under manual routing.
    target_zone: Option<ZoneId>,
}

impl Shape {
    pub fn new(kind: ShapeKind, profile: Profile) -> Self {
        Self {
            kind,
            profile,
            target_zone: None,
        }
    }

    pub fn line(start: Point, end: Point, color: Color, profile: Profile) -> Self {
        Self::new(ShapeKind::Line { start, end, color }, profile)
    }

    pub fn dot(position: Point, color: Color, intensity: f64, profile: Profile) -> Self {
        Self::new(
            ShapeKind::Dot {
                position,
                color,
                intensity,
            },
            profile,
        )
    }

    pub fn circle(center: Point, radius: f64, color: Color, profile: Profile) -> Self {
        Self::new(
            ShapeKind::Circle {
                center,
                radius: radius.abs(),
                color,
            },
            profile,
        )
    }

    /// Build a polyline, or `None` if it is too small to trace.
    ///
    /// Empty polylines and those whose perimeter falls under the minimum are
    /// rejected before any shape exists.
    pub fn polyline(
        vertices: Vec<Point>,
        colors: PolylineColors,
        closed: bool,
        profile: Profile,
    ) -> Option<Self> {
        let min = match colors {
            PolylineColors::Uniform(_) => MIN_POLYLINE_PERIMETER,
            PolylineColors::PerVertex(_) => MIN_MULTICOLOR_PERIMETER,
        };
        if vertices.is_empty() || perimeter(&vertices, closed) < min {
            return None;
        }
        Some(Self::new(
            ShapeKind::Polyline {
                vertices,
                colors,
                closed,
            },
            profile,
        ))
    }

    pub fn with_target_zone(mut self, zone: ZoneId) -> Self {
        self.target_zone = Some(zone);
        self
    }

    pub fn target_zone(&self) -> Option<ZoneId> {
        self.target_zone
    }

    pub fn set_target_zone(&mut self, zone: ZoneId) {
        self.target_zone = Some(zone);
    }

    pub fn bbox(&self) -> BBox {
        match &self.kind {
            ShapeKind::Line { start, end, .. } => {
                BBox::from_points(&[*start, *end]).unwrap_or(BBox::new(*start, *end))
            }
            ShapeKind::Dot { position, .. } => BBox::new(*position, *position),
            ShapeKind::Polyline { vertices, .. } => {
                // Polylines are never empty once constructed.
                BBox::from_points(vertices).unwrap_or(BBox::new(Point::default(), Point::default()))
            }
            ShapeKind::Circle { center, radius, .. } => BBox::new(
                center.translate(-radius, -radius),
                center.translate(*radius, *radius),
            ),
        }
    }

    /// The zone containment test: does any part of the traced shape touch
    /// `rect`?
    pub fn intersects_rect(&self, rect: &BBox) -> bool {
        if !self.bbox().intersects(rect) {
            return false;
        }
        match &self.kind {
            ShapeKind::Line { start, end, .. } => rect.intersects_segment(start, end),
            ShapeKind::Dot { position, .. } => rect.contains_point(position),
            ShapeKind::Polyline {
                vertices, closed, ..
            } => {
                if vertices.len() == 1 {
                    return rect.contains_point(&vertices[0]);
                }
                let closing = match (closed, vertices.first(), vertices.last()) {
                    (true, Some(first), Some(last)) => rect.intersects_segment(last, first),
                    _ => false,
                };
                closing
                    || vertices
                        .windows(2)
                        .any(|w| rect.intersects_segment(&w[0], &w[1]))
            }
            // the ring must pass through the rect, not just enclose it
            ShapeKind::Circle { center, radius, .. } => {
                rect.distance_to_point(center) <= *radius
                    && rect.max_distance_to_point(center) >= *radius
            }
        }
    }

    /// Representative colour, used for previews and diagnostics.
    pub fn color(&self) -> Color {
        match &self.kind {
            ShapeKind::Line { color, .. }
            | ShapeKind::Dot { color, .. }
            | ShapeKind::Circle { color, .. } => *color,
            ShapeKind::Polyline { colors, .. } => colors.at(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> BBox {
        BBox::from_origin_size(0.0, 0.0, 100.0, 100.0)
    }

    #[test]
    fn test_polyline_rejects_empty_and_tiny() {
        let p = Shape::polyline(
            Vec::new(),
            PolylineColors::Uniform(Color::WHITE),
            false,
            Profile::default(),
        );
        assert!(p.is_none());

        let tiny = vec![Point::new(1.0, 1.0), Point::new(1.001, 1.0)];
        let p = Shape::polyline(
            tiny.clone(),
            PolylineColors::Uniform(Color::WHITE),
            false,
            Profile::default(),
        );
        assert!(p.is_none());

        let short = vec![Point::new(1.0, 1.0), Point::new(1.05, 1.0)];
        let uniform = Shape::polyline(
            short.clone(),
            PolylineColors::Uniform(Color::WHITE),
            false,
            Profile::default(),
        );
        assert!(uniform.is_some());
        let multi = Shape::polyline(
            short,
            PolylineColors::PerVertex(vec![Color::WHITE, Color::CYAN]),
            false,
            Profile::default(),
        );
        assert!(multi.is_none());
    }

    #[test]
    fn test_line_containment() {
        let inside = Shape::line(
            Point::new(10.0, 10.0),
            Point::new(20.0, 20.0),
            Color::WHITE,
            Profile::default(),
        );
        let crossing = Shape::line(
            Point::new(-50.0, 50.0),
            Point::new(150.0, 50.0),
            Color::WHITE,
            Profile::default(),
        );
        let outside = Shape::line(
            Point::new(150.0, 150.0),
            Point::new(200.0, 150.0),
            Color::WHITE,
            Profile::default(),
        );
        assert!(inside.intersects_rect(&zone()));
        assert!(crossing.intersects_rect(&zone()));
        assert!(!outside.intersects_rect(&zone()));
    }

    #[test]
    fn test_closed_polyline_uses_closing_segment() {
        // Only the closing segment (150,50)->(-50,50) passes through the zone.
        let verts = vec![
            Point::new(-50.0, 50.0),
            Point::new(-50.0, 200.0),
            Point::new(150.0, 200.0),
            Point::new(150.0, 50.0),
        ];
        let open = Shape::polyline(
            verts.clone(),
            PolylineColors::Uniform(Color::WHITE),
            false,
            Profile::default(),
        )
        .unwrap();
        let closed = Shape::polyline(
            verts,
            PolylineColors::Uniform(Color::WHITE),
            true,
            Profile::default(),
        )
        .unwrap();
        assert!(!open.intersects_rect(&zone()));
        assert!(closed.intersects_rect(&zone()));
    }

    #[test]
    fn test_dot_and_circle_containment() {
        let dot = Shape::dot(Point::new(50.0, 50.0), Color::WHITE, 1.0, Profile::default());
        assert!(dot.intersects_rect(&zone()));
        let far_dot = Shape::dot(Point::new(150.0, 50.0), Color::WHITE, 1.0, Profile::default());
        assert!(!far_dot.intersects_rect(&zone()));

        let touching = Shape::circle(Point::new(110.0, 50.0), 15.0, Color::WHITE, Profile::default());
        assert!(touching.intersects_rect(&zone()));
        // bbox overlaps the corner but the circle itself does not reach it
        let corner = Shape::circle(Point::new(110.0, 110.0), 12.0, Color::WHITE, Profile::default());
        assert!(!corner.intersects_rect(&zone()));
    }

    #[test]
    fn test_circle_enclosing_zone_misses_it() {
        let ring = Shape::circle(Point::new(50.0, 50.0), 1000.0, Color::WHITE, Profile::default());
        assert!(!ring.intersects_rect(&zone()));
        let square = Shape::polyline(
            vec![
                Point::new(-500.0, -500.0),
                Point::new(600.0, -500.0),
                Point::new(600.0, 600.0),
                Point::new(-500.0, 600.0),
            ],
            PolylineColors::Uniform(Color::WHITE),
            true,
            Profile::default(),
        )
        .unwrap();
        assert_eq!(ring.intersects_rect(&zone()), square.intersects_rect(&zone()));

        // centred inside the zone with the ring crossing its edges
        let crossing = Shape::circle(Point::new(50.0, 50.0), 60.0, Color::WHITE, Profile::default());
        assert!(crossing.intersects_rect(&zone()));
        // small ring entirely inside the zone
        let inner = Shape::circle(Point::new(50.0, 50.0), 10.0, Color::WHITE, Profile::default());
        assert!(inner.intersects_rect(&zone()));
    }

    #[test]
    fn test_per_vertex_color_lookup() {
        let colors = PolylineColors::PerVertex(vec![Color::BLACK, Color::CYAN]);
        assert_eq!(colors.at(0), Color::BLACK);
        assert_eq!(colors.at(5), Color::CYAN);
        assert_eq!(PolylineColors::PerVertex(Vec::new()).at(0), Color::WHITE);
    }

    #[test]
    fn test_target_zone_tagging() {
        let mut s = Shape::dot(Point::new(1.0, 1.0), Color::WHITE, 1.0, Profile::default());
        assert_eq!(s.target_zone(), None);
        s.set_target_zone(3);
        assert_eq!(s.target_zone(), Some(3));
    }
}
