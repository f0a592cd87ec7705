//! # Beamzone Preview
//!
//! On-screen preview of the laser frame: line strips built from the
//! buffered shapes, optional mask dimming and the window layout that
//! places the canvas, its zones and the per-projector thumbnails.
//!
//! Everything here is plain serializable data; drawing it is up to the host.

pub mod layout;
pub mod preview;

pub use layout::{PreviewLayout, WindowSize};
pub use preview::{PreviewFrame, PreviewMesh, PreviewSource, PreviewStrip};

use beamzone_core::LaserManager;

/// Lay out the preview for the manager's current selection, push the layout
/// into its zones and capture the frame.
pub fn apply_layout(manager: &mut LaserManager, window: WindowSize, expand: bool) -> PreviewFrame {
    let layout = PreviewLayout::compute(
        &manager.config().preview,
        manager.canvas(),
        window,
        manager.current_projector(),
        expand,
    );
    let show_zones = manager.config().show_zones;
    let current = manager.current_projector();
    layout.apply(manager.zones_mut(), show_zones, current);
    PreviewFrame::capture(manager, layout)
}
