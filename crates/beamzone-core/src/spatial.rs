use rstar::{Envelope, PointDistance, RTree, RTreeObject, AABB};

use crate::buffer::ShapeId;
use crate::geometry::{BBox, Point};

/// An entry in the R-tree spatial index, referencing a buffered shape.
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    pub shape: ShapeId,
    /// Bounding box of the shape.
    pub bbox: BBox,
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min.x, self.bbox.min.y],
            [self.bbox.max.x, self.bbox.max.y],
        )
    }
}

impl PointDistance for SpatialEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope().distance_2(point)
    }
}

/// Spatial index of shapes already assigned to one zone.
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
        }
    }

    /// Insert a single entry.
    pub fn insert(&mut self, entry: SpatialEntry) {
        self.tree.insert(entry);
    }

    /// The entry nearest to `point`, if any.
    pub fn nearest(&self, point: &Point) -> Option<&SpatialEntry> {
        self.tree.nearest_neighbor(&[point.x, point.y])
    }

    /// Distance from `point` to the nearest entry's box, or `None` when empty.
    pub fn nearest_distance(&self, point: &Point) -> Option<f64> {
        self.nearest(point)
            .map(|e| e.distance_2(&[point.x, point.y]).sqrt())
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
