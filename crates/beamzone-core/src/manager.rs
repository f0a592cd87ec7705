use glam::DVec3;
use log::{debug, error, info, warn};

use crate::buffer::{FrameShapeBuffer, ShapeId};
use crate::error::ManagerError;
use crate::geometry::{centroid, scale_about, BBox, Point};
use crate::mask::MaskSource;
use crate::partition::{OptimiseStrategy, RoutingPolicy, ZonePartitioner};
use crate::projection::{ViewProvider, ViewTransform};
use crate::projector::{
    LaserPoint, Projector, ProjectorFrame, ProjectorId, ProjectorRecord, ZoneShapes,
};
use crate::settings::{
    ManagerConfig, ManagerSettings, ProjectorSettings, SettingsSnapshot, SettingsStore,
    ZoneSettings,
};
use crate::shape::{PolylineColors, Shape};
use crate::style::{Color, Profile};
use crate::zone::{CanvasSize, Zone, ZoneId, ZoneRegistry};

/// Mask outlines are grown by 1% about their centroid before tracing.
pub const MASK_OUTLINE_MARGIN: f64 = 1.01;

/// The per-frame pipeline: collects shapes, routes them to zones and hands
/// each projector the shapes of the zones it owns.
///
/// A host drives it once per rendered frame:
/// [`update`](Self::update), then `draw_*` calls, then [`send`](Self::send).
/// The previous frame's shapes stay readable (for previews) until the next
/// `update`.
pub struct LaserManager {
    config: ManagerConfig,
    canvas: CanvasSize,
    /// Zone tagged onto new shapes, used under manual routing.
    target_zone: ZoneId,
    /// `None` means no projector is selected for editing.
    current_projector: Option<ProjectorId>,
    zones: ZoneRegistry,
    projectors: Vec<ProjectorRecord>,
    buffer: FrameShapeBuffer,
    partitioner: ZonePartitioner,
    view: ViewTransform,
    mask: Option<Box<dyn MaskSource>>,
    settings: Option<Box<dyn SettingsStore>>,
    zones_changed: bool,
    arm_all_requested: bool,
    disarm_all_requested: bool,
    warned_no_projectors: bool,
}

impl LaserManager {
    pub fn new(mut config: ManagerConfig) -> Self {
        info!(
            "laser manager created, canvas {}x{}",
            config.canvas_width, config.canvas_height
        );
        config.master_intensity = config.master_intensity.clamp(0.0, 1.0);
        let canvas = CanvasSize::new(config.canvas_width, config.canvas_height);
        Self {
            config,
            canvas,
            target_zone: 0,
            current_projector: None,
            zones: ZoneRegistry::new(),
            projectors: Vec::new(),
            buffer: FrameShapeBuffer::new(),
            partitioner: ZonePartitioner::default(),
            view: ViewTransform::screen(canvas.width, canvas.height),
            mask: None,
            settings: None,
            zones_changed: false,
            arm_all_requested: false,
            disarm_all_requested: false,
            warned_no_projectors: false,
        }
    }

    // ── Setup ────────────────────────────────────────────────────────

    /// Size the canvas before the first frame.
    pub fn setup(&mut self, width: f64, height: f64) {
        self.resize(width, height);
    }

    /// Resize the canvas. Resets the view to the screen mapping and
    /// reinitialises the mask. Existing zones keep their rectangles.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.canvas = CanvasSize::new(width, height);
        self.config.canvas_width = width;
        self.config.canvas_height = height;
        self.view = ViewTransform::screen(width, height);
        if let Some(mask) = self.mask.as_mut() {
            mask.init(width.max(0.0) as usize, height.max(0.0) as usize);
        }
        debug!("canvas resized to {}x{}", width, height);
    }

    pub fn attach_mask(&mut self, mut mask: Box<dyn MaskSource>) {
        mask.init(
            self.canvas.width.max(0.0) as usize,
            self.canvas.height.max(0.0) as usize,
        );
        self.mask = Some(mask);
    }

    pub fn mask(&self) -> Option<&dyn MaskSource> {
        self.mask.as_deref()
    }

    /// Attach persistence and apply whatever it holds to the current state.
    pub fn attach_settings(&mut self, store: Box<dyn SettingsStore>) {
        if let Some(saved) = store.manager() {
            self.config.master_intensity = saved.master_intensity.clamp(0.0, 1.0);
            self.config.policy = saved.policy;
            self.config.use_bitmap_mask = saved.use_bitmap_mask;
            self.config.laser_mask_outlines = saved.laser_mask_outlines;
            self.config.show_zones = saved.show_zones;
            self.config.show_preview = saved.show_preview;
        }
        for zone in self.zones.iter_mut() {
            if let Some(saved) = store.zone(zone.index) {
                zone.set_rect(saved.rect());
            }
        }
        let mut owned = Vec::new();
        for (index, record) in self.projectors.iter_mut().enumerate() {
            if let Some(saved) = store.projector(index) {
                record.name = saved.name;
                record.test_pattern = saved.test_pattern;
                owned.extend(saved.zones.into_iter().map(|z| (z, index)));
            }
        }
        self.settings = Some(store);
        self.restore_ownership(owned);
    }

    /// Re-assign saved zones to projectors, skipping zones that do not
    /// exist yet.
    fn restore_ownership(&mut self, owned: Vec<(ZoneId, ProjectorId)>) {
        for (zone, projector) in owned {
            if zone < self.zones.len() {
                if let Err(e) = self.add_zone_to_projector(zone, projector) {
                    warn!("saved zone {} not restored: {}", zone, e);
                }
            } else {
                debug!(
                    "saved zone {} for projector {} not defined, skipped",
                    zone, projector
                );
            }
        }
    }

    /// Capture the host's current transforms for subsequent draw calls.
    pub fn sync_view(&mut self, provider: &dyn ViewProvider) {
        self.view = provider.view_transform();
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn set_optimise_strategy(&mut self, strategy: Box<dyn OptimiseStrategy>) {
        self.partitioner.set_strategy(strategy);
    }

    // ── Projectors & zones ───────────────────────────────────────────

    /// Register a projector. The first registration with no zones defined
    /// creates a full-canvas zone and gives it to the new projector.
    pub fn add_projector(&mut self, device: Box<dyn Projector>) -> ProjectorId {
        let index = self.projectors.len();
        let mut record = ProjectorRecord::new(&format!("Projector{}", index + 1), device);
        let mut saved_zones = Vec::new();
        if let Some(saved) = self.settings.as_ref().and_then(|s| s.projector(index)) {
            record.name = saved.name;
            record.test_pattern = saved.test_pattern;
            saved_zones = saved.zones;
        }
        info!(
            "projector {} registered as '{}' ({})",
            index, record.name, record.id
        );
        self.projectors.push(record);

        if let Some(zone) = self.zones.bootstrap_default_if_empty(self.canvas) {
            self.load_zone_settings(zone);
            if let Err(e) = self.add_zone_to_projector(zone, index) {
                warn!("default zone {} not assigned: {}", zone, e);
            }
        }
        self.restore_ownership(saved_zones.into_iter().map(|z| (z, index)).collect());
        index
    }

    /// Add a zone. A non-positive width or height spans the full canvas.
    pub fn add_zone(&mut self, x: f64, y: f64, w: f64, h: f64) -> ZoneId {
        let zone = self.zones.add_zone(x, y, w, h, self.canvas);
        self.load_zone_settings(zone);
        zone
    }

    pub fn add_zone_rect(&mut self, rect: &BBox) -> ZoneId {
        self.add_zone(rect.min.x, rect.min.y, rect.width(), rect.height())
    }

    fn load_zone_settings(&mut self, zone: ZoneId) {
        let saved = self.settings.as_ref().and_then(|s| s.zone(zone));
        if let (Some(saved), Some(z)) = (saved, self.zones.get_mut(zone)) {
            debug!("zone {} restored from settings", zone);
            z.set_rect(saved.rect());
        }
    }

    pub fn add_zone_to_projector(
        &mut self,
        zone: ZoneId,
        projector: ProjectorId,
    ) -> Result<(), ManagerError> {
        let count = self.projectors.len();
        let Some(record) = self.projectors.get_mut(projector) else {
            error!("invalid projector index {} passed to add_zone_to_projector", projector);
            return Err(ManagerError::InvalidProjector {
                index: projector,
                count,
            });
        };
        let Some(z) = self.zones.get(zone) else {
            error!("invalid zone index {} passed to add_zone_to_projector", zone);
            return Err(ManagerError::InvalidZone {
                index: zone,
                count: self.zones.len(),
            });
        };
        if record.own_zone(zone) {
            record.device.add_zone(zone, z.rect(), self.canvas);
            debug!("zone {} assigned to projector {}", zone, projector);
        }
        Ok(())
    }

    pub fn zone(&self, index: ZoneId) -> Option<&Zone> {
        let zone = self.zones.get(index);
        if zone.is_none() {
            warn!("zone: no zone {}", index);
        }
        zone
    }

    pub fn zone_mut(&mut self, index: ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(index)
    }

    pub fn zones(&self) -> &ZoneRegistry {
        &self.zones
    }

    pub fn zones_mut(&mut self) -> &mut ZoneRegistry {
        &mut self.zones
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn projector(&self, index: ProjectorId) -> Option<&ProjectorRecord> {
        let record = self.projectors.get(index);
        if record.is_none() {
            warn!("projector: no projector {}", index);
        }
        record
    }

    pub fn projector_count(&self) -> usize {
        self.projectors.len()
    }

    // ── Drawing ──────────────────────────────────────────────────────

    fn submit(&mut self, mut shape: Shape) -> Option<ShapeId> {
        shape.set_target_zone(self.target_zone);
        self.buffer.submit(shape)
    }

    pub fn draw_line(
        &mut self,
        start: DVec3,
        end: DVec3,
        color: Color,
        profile: Profile,
    ) -> Option<ShapeId> {
        let shape = Shape::line(
            self.view.project(start),
            self.view.project(end),
            color,
            profile,
        );
        self.submit(shape)
    }

    pub fn draw_dot(
        &mut self,
        position: DVec3,
        color: Color,
        intensity: f64,
        profile: Profile,
    ) -> Option<ShapeId> {
        let shape = Shape::dot(self.view.project(position), color, intensity, profile);
        self.submit(shape)
    }

    /// Submit a single-colour polyline. Empty or near-zero-length input is
    /// dropped and returns `None`.
    pub fn draw_poly(
        &mut self,
        vertices: &[DVec3],
        closed: bool,
        color: Color,
        profile: Profile,
    ) -> Option<ShapeId> {
        self.draw_poly_with(vertices, closed, PolylineColors::Uniform(color), profile)
    }

    /// Submit a polyline with one colour per vertex.
    pub fn draw_poly_colors(
        &mut self,
        vertices: &[DVec3],
        closed: bool,
        colors: Vec<Color>,
        profile: Profile,
    ) -> Option<ShapeId> {
        self.draw_poly_with(vertices, closed, PolylineColors::PerVertex(colors), profile)
    }

    fn draw_poly_with(
        &mut self,
        vertices: &[DVec3],
        closed: bool,
        colors: PolylineColors,
        profile: Profile,
    ) -> Option<ShapeId> {
        let projected: Vec<Point> = vertices.iter().map(|&v| self.view.project(v)).collect();
        let shape = Shape::polyline(projected, colors, closed, profile)?;
        self.submit(shape)
    }

    /// Submit a circle. The radius is measured in canvas space from the
    /// projected centre to a projected rim point.
    pub fn draw_circle(
        &mut self,
        center: DVec3,
        radius: f64,
        color: Color,
        profile: Profile,
    ) -> Option<ShapeId> {
        let c = self.view.project(center);
        let rim = self.view.project(center + DVec3::new(radius, 0.0, 0.0));
        let shape = Shape::circle(c, c.distance_to(&rim), color, profile);
        self.submit(shape)
    }

    /// Shapes collected in the current frame.
    pub fn shapes(&self) -> &FrameShapeBuffer {
        &self.buffer
    }

    // ── Frame cycle ──────────────────────────────────────────────────

    /// Start a frame: apply pending arm requests, drop the previous frame's
    /// shapes and update mask, zones and projectors.
    pub fn update(&mut self) {
        if std::mem::take(&mut self.arm_all_requested) {
            self.arm_all();
        }
        if std::mem::take(&mut self.disarm_all_requested) {
            self.disarm_all();
        }
        self.zones_changed = false;

        if self.config.use_bitmap_mask {
            if let Some(mask) = self.mask.as_mut() {
                mask.update();
            }
        }

        self.buffer.clear();

        let none_selected = self.current_projector.is_none();
        for zone in self.zones.iter_mut() {
            zone.visible = none_selected;
        }
        let rects_changed = self.zones.update_all();

        for record in &mut self.projectors {
            record.device.update(rects_changed);
        }
        self.zones_changed = rects_changed;
    }

    /// Route this frame's shapes into zones and dispatch them to every
    /// projector in registration order.
    pub fn send(&mut self) {
        if self.projectors.is_empty() && !self.warned_no_projectors {
            warn!("send called with no projectors registered");
            self.warned_no_projectors = true;
        }

        self.inject_mask_outlines();
        self.partitioner
            .partition(self.config.policy, &self.buffer, &mut self.zones);

        let mask = if self.config.use_bitmap_mask {
            self.mask.as_deref().map(|m| m.pixels())
        } else {
            None
        };
        let intensity = self.config.master_intensity;

        for record in &mut self.projectors {
            let zones = record
                .zones()
                .iter()
                .filter_map(|&z| self.zones.get(z))
                .map(|zone| ZoneShapes {
                    zone: zone.index,
                    rect: zone.rect(),
                    shapes: zone
                        .shapes()
                        .iter()
                        .filter_map(|&id| self.buffer.get(id))
                        .collect(),
                })
                .collect();
            let frame = ProjectorFrame {
                armed: record.armed,
                test_pattern: record.test_pattern,
                zones,
            };
            record.device.send(&frame, mask, intensity);
        }
    }

    fn inject_mask_outlines(&mut self) {
        if !self.config.laser_mask_outlines {
            return;
        }
        let Some(mask) = self.mask.as_ref() else {
            return;
        };

        let mut outlines = mask.outline_shapes();
        for poly in &mut outlines {
            if let Some(centre) = centroid(poly) {
                scale_about(poly, centre, MASK_OUTLINE_MARGIN);
            }
        }

        let passes = match self.config.policy {
            RoutingPolicy::Manual => self.zones.len(),
            _ => self.zones.len().min(1),
        };
        let previous = self.target_zone;
        for zone in 0..passes {
            self.target_zone = zone;
            for poly in &outlines {
                let shape = Shape::polyline(
                    poly.clone(),
                    PolylineColors::Uniform(Color::CYAN),
                    true,
                    Profile::default(),
                );
                if let Some(shape) = shape {
                    self.submit(shape);
                }
            }
        }
        self.target_zone = previous;
    }

    /// Forward pre-built points straight to one projector, scaled by the
    /// master intensity.
    pub fn send_raw_points(
        &mut self,
        points: &[LaserPoint],
        projector: ProjectorId,
        zone: ZoneId,
    ) -> Result<(), ManagerError> {
        if zone >= self.zones.len() {
            error!("invalid zone index {} passed to send_raw_points", zone);
            return Err(ManagerError::InvalidZone {
                index: zone,
                count: self.zones.len(),
            });
        }
        let count = self.projectors.len();
        let Some(record) = self.projectors.get_mut(projector) else {
            error!("invalid projector index {} passed to send_raw_points", projector);
            return Err(ManagerError::InvalidProjector {
                index: projector,
                count,
            });
        };
        record
            .device
            .send_raw_points(points, zone, self.config.master_intensity);
        Ok(())
    }

    /// True if any zone rectangle changed during the last `update`.
    pub fn zones_changed(&self) -> bool {
        self.zones_changed
    }

    // ── Selection & routing ──────────────────────────────────────────

    pub fn current_projector(&self) -> Option<ProjectorId> {
        self.current_projector
    }

    /// Step the selection forward: none, 0, 1, ..., last, none.
    pub fn next_projector(&mut self) -> Option<ProjectorId> {
        self.current_projector = match self.current_projector {
            None if !self.projectors.is_empty() => Some(0),
            Some(i) if i + 1 < self.projectors.len() => Some(i + 1),
            _ => None,
        };
        self.current_projector
    }

    /// Step the selection backward: none, last, ..., 0, none.
    pub fn previous_projector(&mut self) -> Option<ProjectorId> {
        self.current_projector = match self.current_projector {
            None => self.projectors.len().checked_sub(1),
            Some(0) => None,
            Some(i) => Some((i - 1).min(self.projectors.len().saturating_sub(1))),
        };
        self.current_projector
    }

    pub fn policy(&self) -> RoutingPolicy {
        self.config.policy
    }

    pub fn set_policy(&mut self, policy: RoutingPolicy) {
        if policy != self.config.policy {
            info!("routing policy {:?} -> {:?}", self.config.policy, policy);
        }
        self.config.policy = policy;
    }

    pub fn target_zone(&self) -> ZoneId {
        self.target_zone
    }

    /// Select the zone tagged onto subsequent shapes. Out-of-range indices
    /// are rejected and the previous target stays in effect.
    pub fn set_target_zone(&mut self, zone: ZoneId) -> bool {
        if zone >= self.zones.len() {
            error!(
                "invalid zone index {} passed to set_target_zone ({} zones)",
                zone,
                self.zones.len()
            );
            return false;
        }
        self.target_zone = zone;
        true
    }

    pub fn master_intensity(&self) -> f64 {
        self.config.master_intensity
    }

    pub fn set_master_intensity(&mut self, intensity: f64) {
        self.config.master_intensity = intensity.clamp(0.0, 1.0);
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn set_use_bitmap_mask(&mut self, enabled: bool) {
        self.config.use_bitmap_mask = enabled;
    }

    pub fn set_laser_mask_outlines(&mut self, enabled: bool) {
        self.config.laser_mask_outlines = enabled;
    }

    pub fn set_show_zones(&mut self, show: bool) {
        self.config.show_zones = show;
    }

    // ── Projector state ──────────────────────────────────────────────

    pub fn arm_all(&mut self) {
        for record in &mut self.projectors {
            record.armed = true;
        }
        info!("all projectors armed");
    }

    pub fn disarm_all(&mut self) {
        for record in &mut self.projectors {
            record.armed = false;
        }
        info!("all projectors disarmed");
    }

    /// Arm every projector at the start of the next `update`.
    pub fn request_arm_all(&mut self) {
        self.arm_all_requested = true;
    }

    /// Disarm every projector at the start of the next `update`.
    pub fn request_disarm_all(&mut self) {
        self.disarm_all_requested = true;
    }

    pub fn set_armed(&mut self, projector: ProjectorId, armed: bool) -> Result<(), ManagerError> {
        let count = self.projectors.len();
        match self.projectors.get_mut(projector) {
            Some(record) => {
                record.armed = armed;
                Ok(())
            }
            None => {
                error!("invalid projector index {} passed to set_armed", projector);
                Err(ManagerError::InvalidProjector {
                    index: projector,
                    count,
                })
            }
        }
    }

    pub fn set_test_pattern_all(&mut self, pattern: u32) {
        for record in &mut self.projectors {
            record.test_pattern = pattern;
        }
    }

    pub fn is_projector_armed(&self, projector: ProjectorId) -> bool {
        match self.projectors.get(projector) {
            Some(record) => record.armed,
            None => {
                warn!("is_projector_armed: no projector {}", projector);
                false
            }
        }
    }

    pub fn projector_point_rate(&self, projector: ProjectorId) -> u32 {
        match self.projectors.get(projector) {
            Some(record) => record.device.point_rate(),
            None => {
                warn!("projector_point_rate: no projector {}", projector);
                0
            }
        }
    }

    pub fn projector_frame_rate(&self, projector: ProjectorId) -> f64 {
        match self.projectors.get(projector) {
            Some(record) => record.device.frame_rate(),
            None => {
                warn!("projector_frame_rate: no projector {}", projector);
                0.0
            }
        }
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn settings_snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            manager: Some(ManagerSettings {
                master_intensity: self.config.master_intensity,
                policy: self.config.policy,
                use_bitmap_mask: self.config.use_bitmap_mask,
                laser_mask_outlines: self.config.laser_mask_outlines,
                show_zones: self.config.show_zones,
                show_preview: self.config.show_preview,
            }),
            zones: self
                .zones
                .iter()
                .map(|z| (z.index, ZoneSettings::from_rect(&z.rect())))
                .collect(),
            projectors: self
                .projectors
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    (
                        i,
                        ProjectorSettings {
                            name: p.name.clone(),
                            test_pattern: p.test_pattern,
                            zones: p.zones().to_vec(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Write the current state to the attached store, if any.
    pub fn save_settings(&mut self) -> Result<(), ManagerError> {
        let snapshot = self.settings_snapshot();
        match self.settings.as_mut() {
            Some(store) => store.store(snapshot),
            None => {
                debug!("no settings store attached, nothing saved");
                Ok(())
            }
        }
    }
}

impl Default for LaserManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl Drop for LaserManager {
    fn drop(&mut self) {
        info!("laser manager shutting down");
        if self.settings.is_some() {
            if let Err(e) = self.save_settings() {
                error!("failed to save settings on shutdown: {}", e);
            }
        }
    }
}
