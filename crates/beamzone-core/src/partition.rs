//! Routing of buffered shapes into zones.
//!
//! Every run starts by clearing all zone member lists, so partitioning the
//! same buffer twice gives the same membership.

use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::buffer::{FrameShapeBuffer, ShapeId};
use crate::geometry::Point;
use crate::shape::Shape;
use crate::spatial::{SpatialEntry, SpatialIndex};
use crate::zone::{ZoneId, ZoneRegistry};

/// Rule deciding which zones a shape belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingPolicy {
    /// Shapes go to the zone they were tagged with at submission.
    Manual,
    /// Shapes go to every zone they touch.
    #[default]
    Automatic,
    /// Shapes go to exactly one of the zones they touch.
    Optimise,
}

/// Per-run state visible to an [`OptimiseStrategy`].
pub struct OptimiseContext<'a> {
    zones: &'a ZoneRegistry,
    assigned: &'a [SpatialIndex],
    /// Soft per-zone limit: an equal share of the routable shapes.
    pub capacity: usize,
}

impl OptimiseContext<'_> {
    pub fn zones(&self) -> &ZoneRegistry {
        self.zones
    }

    /// Shapes assigned to `zone` so far in this run.
    pub fn load(&self, zone: ZoneId) -> usize {
        self.assigned.get(zone).map_or(0, SpatialIndex::len)
    }

    /// Distance from `point` to the nearest shape already assigned to `zone`.
    pub fn nearest_distance(&self, zone: ZoneId, point: &Point) -> Option<f64> {
        self.assigned
            .get(zone)
            .and_then(|index| index.nearest_distance(point))
    }
}

/// Picks one zone for a shape that overlaps several.
///
/// `candidates` is never empty and holds the zones whose containment test
/// accepted the shape. Answers outside `candidates` are ignored.
pub trait OptimiseStrategy {
    fn choose(&mut self, shape: &Shape, candidates: &[ZoneId], ctx: &OptimiseContext<'_>) -> ZoneId;
}

/// Prefer zones under capacity, then the zone with the nearest assigned
/// shape, then the lighter zone, then the lower index.
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestBalanced;

impl OptimiseStrategy for NearestBalanced {
    fn choose(&mut self, shape: &Shape, candidates: &[ZoneId], ctx: &OptimiseContext<'_>) -> ZoneId {
        let center = shape.bbox().center();
        let score = |z: ZoneId| {
            let load = ctx.load(z);
            let dist = ctx
                .nearest_distance(z, &center)
                .unwrap_or(f64::INFINITY);
            (load >= ctx.capacity, dist, load, z)
        };
        candidates
            .iter()
            .map(|&z| score(z))
            .min_by(|a, b| {
                a.0.cmp(&b.0)
                    .then(a.1.total_cmp(&b.1))
                    .then(a.2.cmp(&b.2))
                    .then(a.3.cmp(&b.3))
            })
            .map_or(candidates[0], |s| s.3)
    }
}

/// Assigns buffered shapes to zones under the active [`RoutingPolicy`].
pub struct ZonePartitioner {
    strategy: Box<dyn OptimiseStrategy>,
}

impl Default for ZonePartitioner {
    fn default() -> Self {
        Self::new(Box::new(NearestBalanced))
    }
}

impl ZonePartitioner {
    pub fn new(strategy: Box<dyn OptimiseStrategy>) -> Self {
        Self { strategy }
    }

    pub fn set_strategy(&mut self, strategy: Box<dyn OptimiseStrategy>) {
        self.strategy = strategy;
    }

    pub fn partition(
        &mut self,
        policy: RoutingPolicy,
        buffer: &FrameShapeBuffer,
        zones: &mut ZoneRegistry,
    ) {
        zones.clear_all_shapes();
        match policy {
            RoutingPolicy::Manual => Self::partition_manual(buffer, zones),
            RoutingPolicy::Automatic => Self::partition_automatic(buffer, zones),
            RoutingPolicy::Optimise => self.partition_optimise(buffer, zones),
        }
    }

    fn partition_manual(buffer: &FrameShapeBuffer, zones: &mut ZoneRegistry) {
        for zone in zones.iter_mut() {
            for (id, shape) in buffer.iter() {
                if shape.target_zone() == Some(zone.index) {
                    zone.push_shape(id);
                }
            }
        }
    }

    fn partition_automatic(buffer: &FrameShapeBuffer, zones: &mut ZoneRegistry) {
        for zone in zones.iter_mut() {
            for (id, shape) in buffer.iter() {
                zone.add_shape(id, shape);
            }
        }
    }

    fn partition_optimise(&mut self, buffer: &FrameShapeBuffer, zones: &mut ZoneRegistry) {
        let candidates: Vec<(ShapeId, &Shape, Vec<ZoneId>)> = buffer
            .iter()
            .map(|(id, shape)| {
                let hits: Vec<ZoneId> = zones
                    .iter()
                    .filter(|z| shape.intersects_rect(&z.rect()))
                    .map(|z| z.index)
                    .collect();
                (id, shape, hits)
            })
            .filter(|c| !c.2.is_empty())
            .collect();

        let mut touched = vec![false; zones.len()];
        for (_, _, hits) in &candidates {
            for &z in hits {
                touched[z] = true;
            }
        }
        let contended_zones = touched.iter().filter(|&&t| t).count().max(1);
        let capacity = candidates.len().div_ceil(contended_zones);

        let mut assigned: Vec<SpatialIndex> = (0..zones.len()).map(|_| SpatialIndex::new()).collect();
        let mut home: Vec<Option<ZoneId>> = vec![None; buffer.len()];

        // Shapes with a single option are placed first so contested shapes
        // can cluster around them.
        for (id, shape, hits) in candidates.iter().filter(|c| c.2.len() == 1) {
            assigned[hits[0]].insert(SpatialEntry {
                shape: *id,
                bbox: shape.bbox(),
            });
            home[id.index()] = Some(hits[0]);
        }

        for (id, shape, hits) in candidates.iter().filter(|c| c.2.len() > 1) {
            let ctx = OptimiseContext {
                zones: &*zones,
                assigned: &assigned,
                capacity,
            };
            let mut zone = self.strategy.choose(shape, hits, &ctx);
            if !hits.contains(&zone) {
                warn!(
                    "optimise strategy chose zone {} outside candidates {:?}, using {}",
                    zone, hits, hits[0]
                );
                zone = hits[0];
            }
            trace!("shape {:?} -> zone {}", id, zone);
            assigned[zone].insert(SpatialEntry {
                shape: *id,
                bbox: shape.bbox(),
            });
            home[id.index()] = Some(zone);
        }

        // Membership is emitted in submission order.
        for (id, _) in buffer.iter() {
            if let Some(zone) = home[id.index()].and_then(|z| zones.get_mut(z)) {
                zone.push_shape(id);
            }
        }
    }
}
