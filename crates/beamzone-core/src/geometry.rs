use serde::{Deserialize, Serialize};

/// A 2D point in canvas coordinates (output pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Build a box from an origin and a size, the way zones are declared.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            min: Point::new(x, y),
            max: Point::new(x + width, y + height),
        }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            min: Point::new(min_x, min_y),
            max: Point::new(max_x, max_y),
        })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Euclidean distance from `p` to the nearest point of the box (0 inside).
    pub fn distance_to_point(&self, p: &Point) -> f64 {
        let dx = (self.min.x - p.x).max(0.0).max(p.x - self.max.x);
        let dy = (self.min.y - p.y).max(0.0).max(p.y - self.max.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Distance from `p` to the farthest corner of the box.
    pub fn max_distance_to_point(&self, p: &Point) -> f64 {
        let dx = (p.x - self.min.x).abs().max((self.max.x - p.x).abs());
        let dy = (p.y - self.min.y).abs().max((self.max.y - p.y).abs());
        (dx * dx + dy * dy).sqrt()
    }

    /// Liang-Barsky clip of the segment `a`-`b` against the box.
    ///
    /// Returns true if any part of the segment lies inside or on the boundary.
    pub fn intersects_segment(&self, a: &Point, b: &Point) -> bool {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;

        let edges = [
            (-dx, a.x - self.min.x),
            (dx, self.max.x - a.x),
            (-dy, a.y - self.min.y),
            (dy, self.max.y - a.y),
        ];

        for (p, q) in edges {
            if p == 0.0 {
                // Parallel to this edge: outside means no hit at all.
                if q < 0.0 {
                    return false;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return false;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return false;
                }
                t1 = t1.min(r);
            }
        }
        t0 <= t1
    }
}

/// Total length of a polyline, including the closing segment when `closed`.
pub fn perimeter(points: &[Point], closed: bool) -> f64 {
    let open: f64 = points
        .windows(2)
        .map(|w| w[0].distance_to(&w[1]))
        .sum();
    match (closed, points.first(), points.last()) {
        (true, Some(first), Some(last)) if points.len() > 2 => open + last.distance_to(first),
        _ => open,
    }
}

/// Area-weighted centroid of a polygon outline.
///
/// Falls back to the vertex mean when the outline encloses no area.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }

    let mut area2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = &points[(i + 1) % points.len()];
        let cross = a.x * b.y - b.x * a.y;
        area2 += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }

    if area2.abs() < 1e-12 {
        let n = points.len() as f64;
        let sx: f64 = points.iter().map(|p| p.x).sum();
        let sy: f64 = points.iter().map(|p| p.y).sum();
        return Some(Point::new(sx / n, sy / n));
    }

    Some(Point::new(cx / (3.0 * area2), cy / (3.0 * area2)))
}

/// Scale every point about `centre` by `factor`, in place.
pub fn scale_about(points: &mut [Point], centre: Point, factor: f64) {
    for p in points {
        p.x = centre.x + (p.x - centre.x) * factor;
        p.y = centre.y + (p.y - centre.y) * factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_keeps_distance() {
        let origin = Point::new(1.0, 1.0).translate(-1.0, -1.0);
        let rim = Point::new(6.0, 8.0);
        assert!((origin.distance_to(&rim) - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_adjacent_zones_touch() {
        let left = BBox::from_origin_size(0.0, 0.0, 400.0, 600.0);
        let right = BBox::from_origin_size(400.0, 0.0, 400.0, 600.0);
        let far = BBox::from_origin_size(900.0, 0.0, 10.0, 10.0);
        assert!(left.intersects(&right));
        assert!(!right.intersects(&far));
        assert_eq!(left.union(&right), BBox::from_origin_size(0.0, 0.0, 800.0, 600.0));
    }

    #[test]
    fn test_from_origin_size() {
        let b = BBox::from_origin_size(10.0, 20.0, 100.0, 50.0);
        assert_eq!(b.min, Point::new(10.0, 20.0));
        assert_eq!(b.max, Point::new(110.0, 70.0));
        assert!((b.width() - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_segment_clip() {
        let r = BBox::from_origin_size(0.0, 0.0, 10.0, 10.0);
        // crosses the box diagonally without an endpoint inside
        assert!(r.intersects_segment(&Point::new(-5.0, 5.0), &Point::new(15.0, 5.0)));
        // bounding boxes overlap but the segment misses the corner
        assert!(!r.intersects_segment(&Point::new(8.0, 15.0), &Point::new(15.0, 8.0)));
        // fully inside
        assert!(r.intersects_segment(&Point::new(2.0, 2.0), &Point::new(3.0, 3.0)));
        // degenerate segment outside
        assert!(!r.intersects_segment(&Point::new(20.0, 20.0), &Point::new(20.0, 20.0)));
    }

    #[test]
    fn test_distance_to_point() {
        let r = BBox::from_origin_size(0.0, 0.0, 10.0, 10.0);
        assert!((r.distance_to_point(&Point::new(5.0, 5.0))).abs() < 1e-10);
        assert!((r.distance_to_point(&Point::new(13.0, 14.0)) - 5.0).abs() < 1e-10);
        assert!((r.max_distance_to_point(&Point::new(13.0, 14.0)) - 19.1049731745).abs() < 1e-9);
    }

    #[test]
    fn test_perimeter_closed_and_open() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert!((perimeter(&square, false) - 3.0).abs() < 1e-10);
        assert!((perimeter(&square, true) - 4.0).abs() < 1e-10);
        assert_eq!(perimeter(&[], true), 0.0);
    }

    #[test]
    fn test_centroid_and_scale() {
        let mut tri = vec![
            Point::new(0.0, 0.0),
            Point::new(6.0, 0.0),
            Point::new(0.0, 6.0),
        ];
        let c = centroid(&tri).unwrap();
        assert!((c.x - 2.0).abs() < 1e-10);
        assert!((c.y - 2.0).abs() < 1e-10);

        scale_about(&mut tri, c, 2.0);
        assert!((tri[1].x - 10.0).abs() < 1e-10);
        assert!((tri[1].y + 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_centroid_collinear_falls_back_to_mean() {
        let line = [Point::new(0.0, 0.0), Point::new(4.0, 0.0)];
        let c = centroid(&line).unwrap();
        assert!((c.x - 2.0).abs() < 1e-10);
        assert!(centroid(&[]).is_none());
    }
}
