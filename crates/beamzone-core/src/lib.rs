//! # Beamzone Core
//!
//! Per-frame laser shape pipeline: shapes are projected into canvas space,
//! collected in a frame buffer, routed to rectangular zones and dispatched
//! to the projectors that own those zones.
//!
//! [`LaserManager`] is the entry point; a host calls `update`, submits
//! shapes with the `draw_*` methods and finishes the frame with `send`.

pub mod geometry;
pub mod style;
pub mod shape;
pub mod buffer;
pub mod zone;
pub mod projection;
pub mod mask;
pub mod projector;
pub mod spatial;
pub mod partition;
pub mod error;
pub mod settings;
pub mod logging;
pub mod manager;

pub use buffer::{FrameShapeBuffer, ShapeId};
pub use error::ManagerError;
pub use geometry::{BBox, Point};
pub use manager::LaserManager;
pub use mask::{MaskPixels, MaskSource};
pub use partition::{NearestBalanced, OptimiseStrategy, RoutingPolicy};
pub use projection::{ViewProvider, ViewTransform};
pub use projector::{LaserPoint, Projector, ProjectorFrame, ProjectorId};
pub use settings::{ManagerConfig, SettingsStore};
pub use shape::{Shape, ShapeKind};
pub use style::{Color, Profile};
pub use zone::{CanvasSize, Zone, ZoneId};
