//! Scene lifecycle and the per-frame render loop.

use foundation::geo::{GeoPoint, LatLng};
use foundation::math::Vec2;
use foundation::math::projection::{ProjectionMode, ProjectionParams};
use foundation::time::Time;
use gpu::{DrawStats, GraphicsBackend, Renderer};
use runtime::{Event, EventBus, FrameScheduler, Metrics};
use tracing::{debug, info, trace, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::input::{DragAction, GestureClassifier, GestureKind, PointerButton, drag_action};
use crate::pick::{ContainerRect, resolve_click};
use crate::scene::{Scene, Viewport};
use crate::surface::{self, build_surface, dispose_surface};
use crate::texture::TextureLoader;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Active(ProjectionMode),
    /// Terminal.
    Disposed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A click landed on the surface.
    CoordinateSelected(LatLng),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameStatus {
    /// The loop was cancelled; nothing ran.
    Stopped,
    /// State advanced but nothing was drawn (empty viewport or draw error).
    Skipped,
    Drawn(DrawStats),
}

/// One mounted globe/map view.
///
/// The host drives it: input and state setters between frames, [`frame`]
/// once per animation frame, [`drain_events`] for selections. Dropping the
/// engine tears it down.
///
/// [`frame`]: Engine::frame
/// [`drain_events`]: Engine::drain_events
pub struct Engine<B: GraphicsBackend, L: TextureLoader> {
    config: EngineConfig,
    params: ProjectionParams,
    backend: B,
    loader: L,
    state: LifecycleState,
    scene: Option<Scene>,
    scheduler: FrameScheduler,
    events: EventBus<EngineEvent>,
    metrics: Metrics,
    classifier: GestureClassifier,
    stops: Vec<GeoPoint>,
    texture_id: String,
    auto_rotate: bool,
}

impl<B: GraphicsBackend, L: TextureLoader> Engine<B, L> {
    pub fn new(config: EngineConfig, backend: B, loader: L) -> Self {
        let params = config.projection_params();
        let classifier = GestureClassifier::new(&config.input);
        let texture_id = config.textures.default_texture.clone();
        Self {
            config,
            params,
            backend,
            loader,
            state: LifecycleState::Uninitialized,
            scene: None,
            scheduler: FrameScheduler::new(),
            events: EventBus::new(),
            metrics: Metrics::new(),
            classifier,
            stops: Vec::new(),
            texture_id,
            auto_rotate: false,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn mode(&self) -> Option<ProjectionMode> {
        match self.state {
            LifecycleState::Active(mode) => Some(mode),
            _ => None,
        }
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn texture_id(&self) -> &str {
        &self.texture_id
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the scene and starts the render loop in the configured mode.
    pub fn initialize(&mut self, viewport: Viewport) -> Result<(), EngineError> {
        match self.state {
            LifecycleState::Uninitialized => {}
            LifecycleState::Active(_) => {
                return Err(EngineError::Lifecycle("engine already initialized"));
            }
            LifecycleState::Disposed => return Err(EngineError::Lifecycle("engine disposed")),
        }

        let mut scene = Scene::new(viewport, &self.config.camera);
        self.backend.resize(viewport.width, viewport.height);
        scene.add_lights(&self.config.lights);
        scene.add_stars(&mut self.backend, &self.config.stars)?;
        self.scene = Some(scene);

        let mode = self.config.initial_mode;
        self.state = LifecycleState::Active(mode);
        self.scheduler.start();
        self.rebuild(mode)?;
        info!(%mode, width = viewport.width, height = viewport.height, "engine initialized");
        Ok(())
    }

    /// Tears down the current surface and builds `mode` with `texture_id`.
    /// No-op unless active.
    pub fn switch_mode(&mut self, mode: ProjectionMode, texture_id: &str) -> Result<(), EngineError> {
        if self.mode().is_none() {
            debug!(%mode, "switch_mode ignored: engine not active");
            return Ok(());
        }
        self.texture_id = texture_id.to_string();
        self.rebuild(mode)?;
        info!(%mode, texture = texture_id, "projection switched");
        Ok(())
    }

    pub fn set_texture(&mut self, texture_id: &str) -> Result<(), EngineError> {
        match self.mode() {
            Some(mode) => self.switch_mode(mode, texture_id),
            None => {
                self.texture_id = texture_id.to_string();
                Ok(())
            }
        }
    }

    pub fn toggle_mode(&mut self) -> Result<(), EngineError> {
        match self.mode() {
            Some(mode) => {
                let texture = self.texture_id.clone();
                self.switch_mode(mode.other(), &texture)
            }
            None => Ok(()),
        }
    }

    /// Stores a copy of `stops` and rebuilds the markers if a surface exists.
    pub fn set_stops(&mut self, stops: &[GeoPoint]) -> Result<(), EngineError> {
        self.stops = stops.to_vec();
        self.rebuild_markers()
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
        if let Some(rig) = self.scene.as_mut().and_then(|s| s.rig.as_mut()) {
            rig.set_auto_rotate(enabled);
        }
    }

    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.set_auto_rotate(!self.auto_rotate);
        self.auto_rotate
    }

    /// A zero-sized viewport suspends drawing until a valid size arrives.
    pub fn resize(&mut self, viewport: Viewport) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        scene.resize(viewport);
        self.backend.resize(viewport.width, viewport.height);
        if viewport.is_empty() {
            warn!("viewport is empty; drawing suspended");
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, time_ms: f64, button: PointerButton) {
        if let Some(scene) = self.scene.as_mut() {
            scene.pointer.down(Vec2::new(x, y), time_ms, button);
        }
    }

    /// Drives the rig while a button is held.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let Some((delta, button)) = scene.pointer.moved(Vec2::new(x, y)) else {
            return;
        };
        let height = scene.viewport.height as f64;
        let Some(rig) = scene.rig.as_mut() else {
            return;
        };
        match drag_action(button, &rig.limits()) {
            DragAction::Rotate => rig.rotate(delta.x, delta.y, height),
            DragAction::Pan => rig.pan(delta.x, delta.y, height),
            DragAction::Ignore => {}
        }
    }

    /// Ends a gesture. A click is resolved against the surface; a hit is
    /// returned and queued as [`EngineEvent::CoordinateSelected`].
    pub fn pointer_up(&mut self, x: f64, y: f64, time_ms: f64, rect: &ContainerRect) -> Option<LatLng> {
        let mode = self.mode()?;
        let scene = self.scene.as_mut()?;
        let gesture = scene.pointer.up()?;
        let position = Vec2::new(x, y);
        if self.classifier.classify(&gesture, time_ms, position) == GestureKind::Drag {
            self.metrics.incr("gesture.drags");
            return None;
        }
        self.metrics.incr("gesture.clicks");
        self.metrics.incr("pick.attempts");

        let surface = scene.surface_node()?;
        let geo = resolve_click(&scene.graph, &scene.camera, surface, position, rect, mode, &self.params)?;
        self.metrics.incr("pick.hits");
        let selected = EngineEvent::CoordinateSelected(geo);
        match self.scheduler.last_frame() {
            Some(frame) => self.events.emit_in(frame, selected),
            None => self.events.emit(0, selected),
        }
        debug!(lat = geo.lat, lng = geo.lng, "coordinate selected");
        Some(geo)
    }

    pub fn wheel(&mut self, delta_y: f64) {
        if let Some(rig) = self.scene.as_mut().and_then(|s| s.rig.as_mut()) {
            rig.dolly(delta_y);
        }
    }

    pub fn drain_events(&mut self) -> Vec<Event<EngineEvent>> {
        self.events.drain()
    }

    /// One animation frame at host time `now_s`.
    pub fn frame(&mut self, now_s: f64) -> FrameStatus {
        let Some(frame) = self.scheduler.tick(Time(now_s)) else {
            return FrameStatus::Stopped;
        };
        self.poll_textures();

        let Some(mode) = self.mode() else {
            return FrameStatus::Stopped;
        };
        let Some(scene) = self.scene.as_mut() else {
            return FrameStatus::Stopped;
        };

        if mode == ProjectionMode::Map
            && self.auto_rotate
            && let Some(node) = scene.surface_node()
            && let Some(mut transform) = scene.graph.transform(node)
        {
            transform.rotation_z += self.config.camera.map_spin_rate;
            scene.graph.set_transform(node, transform);
        }
        if let Some(rig) = scene.rig.as_mut() {
            rig.update();
        }
        scene.sync_camera();

        if scene.viewport.is_empty() {
            trace!(frame = frame.index, "empty viewport, draw skipped");
            return FrameStatus::Skipped;
        }
        let render_frame = Renderer::collect(&scene.graph);
        match self.backend.render(&scene.camera, &render_frame) {
            Ok(stats) => {
                self.metrics.incr("frames.rendered");
                self.metrics
                    .set_gauge("resources.live", self.backend.live_resources() as i64);
                FrameStatus::Drawn(stats)
            }
            Err(err) => {
                warn!(frame = frame.index, %err, "draw failed");
                FrameStatus::Skipped
            }
        }
    }

    /// Stops the loop and releases everything. Idempotent and safe on an
    /// engine that never initialized.
    pub fn teardown(&mut self) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        self.scheduler.cancel();
        if let Some(mut scene) = self.scene.take() {
            scene.pointer.reset();
            scene.pending_texture = None;
            if let Some(rig) = scene.rig.take() {
                rig.dispose();
            }
            scene.markers.clear(&mut scene.graph, &mut self.backend);
            scene.surface = None;
            let remaining = scene.graph.clear();
            surface::release_bindings(&mut self.backend, remaining);
        }
        self.backend.dispose();
        self.state = LifecycleState::Disposed;
        self.metrics.log();
        info!("engine torn down");
    }

    /// Disposes the mode-specific parts and builds `mode` from scratch.
    fn rebuild(&mut self, mode: ProjectionMode) -> Result<(), EngineError> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        scene.markers.clear(&mut scene.graph, &mut self.backend);
        if let Some(parts) = scene.surface.take() {
            dispose_surface(&mut scene.graph, &mut self.backend, parts);
        }
        scene.generation += 1;
        scene.pending_texture = None;
        self.metrics.set_gauge("scene.generation", scene.generation as i64);

        scene.frame_camera(mode, &self.config.camera);
        scene.set_stars_visible(mode == ProjectionMode::Globe);
        self.auto_rotate = match mode {
            ProjectionMode::Globe => self.config.camera.globe_auto_rotate,
            ProjectionMode::Map => false,
        };
        if let Some(rig) = scene.rig.as_mut() {
            rig.set_auto_rotate(self.auto_rotate);
        }

        let parts = build_surface(
            scene,
            &mut self.backend,
            &mut self.loader,
            mode,
            &self.texture_id,
            &self.config.surface,
        )?;
        scene.surface = Some(parts);
        self.state = LifecycleState::Active(mode);
        self.rebuild_markers()
    }

    fn rebuild_markers(&mut self) -> Result<(), EngineError> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        let Some(parts) = scene.surface else {
            return Ok(());
        };
        scene.markers.rebuild(
            &mut scene.graph,
            &mut self.backend,
            &self.stops,
            parts.mode,
            parts.mesh,
            &self.params,
            &self.config.markers,
        )?;
        self.metrics.incr("markers.rebuilds");
        self.metrics.set_gauge("markers.count", scene.markers.len() as i64);
        Ok(())
    }

    fn poll_textures(&mut self) {
        for completion in self.loader.poll() {
            let current = self.scene.as_ref().and_then(|s| s.pending_texture);
            if current != Some(completion.ticket) {
                self.metrics.incr("textures.stale");
                debug!(
                    texture = %completion.identifier,
                    generation = completion.ticket.generation,
                    "stale texture load ignored"
                );
                continue;
            }
            let Some(scene) = self.scene.as_mut() else {
                continue;
            };
            scene.pending_texture = None;
            let image = match completion.result {
                Ok(image) => image,
                Err(err) => {
                    self.metrics.incr("textures.failed");
                    warn!(texture = %completion.identifier, %err, "texture load failed; surface stays untextured");
                    continue;
                }
            };
            let Some(parts) = scene.surface else {
                continue;
            };
            match surface::apply_texture(&mut scene.graph, &mut self.backend, &parts, &image) {
                Ok(_) => {
                    self.metrics.incr("textures.applied");
                    if let Err(err) = self.rebuild_markers() {
                        warn!(%err, "marker rebuild after texture load failed");
                    }
                }
                Err(err) => {
                    self.metrics.incr("textures.failed");
                    warn!(texture = %completion.identifier, %err, "texture upload failed");
                }
            }
        }
    }
}

impl<B: GraphicsBackend, L: TextureLoader> Drop for Engine<B, L> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::{Engine, EngineEvent, FrameStatus, LifecycleState};
    use crate::config::EngineConfig;
    use crate::error::EngineError;
    use crate::input::PointerButton;
    use crate::pick::ContainerRect;
    use crate::scene::Viewport;
    use crate::texture::MemoryTextureLoader;
    use foundation::geo::GeoPoint;
    use foundation::ids::ResourceId;
    use foundation::math::projection::ProjectionMode;
    use gpu::{GraphicsBackend, HeadlessBackend, TextureImage};
    use scene::NodeKind;
    use scene::components::Transform;

    type TestEngine = Engine<HeadlessBackend, MemoryTextureLoader>;

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    fn small_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.stars.count = 64;
        config.surface.globe_segments = 8;
        config
    }

    fn loader() -> MemoryTextureLoader {
        MemoryTextureLoader::new().with_image("earth.jpg", TextureImage::solid(4, 2, [0, 0, 255, 255]))
    }

    fn engine_with(config: EngineConfig) -> TestEngine {
        let mut engine = Engine::new(config, HeadlessBackend::default(), loader());
        engine.initialize(VIEWPORT).unwrap();
        engine
    }

    fn engine() -> TestEngine {
        engine_with(small_config())
    }

    fn stops() -> Vec<GeoPoint> {
        vec![GeoPoint::new("Paris", 48.85, 2.35), GeoPoint::new("Lima", -12.05, -77.04)]
    }

    fn rect() -> ContainerRect {
        ContainerRect::from_viewport(VIEWPORT)
    }

    #[test]
    fn initialize_twice_is_an_error() {
        let mut engine = engine();
        assert_eq!(engine.state(), LifecycleState::Active(ProjectionMode::Globe));
        assert!(matches!(engine.initialize(VIEWPORT), Err(EngineError::Lifecycle(_))));
        engine.teardown();
        assert!(matches!(engine.initialize(VIEWPORT), Err(EngineError::Lifecycle(_))));
    }

    #[test]
    fn calls_before_initialize_are_no_ops() {
        let mut engine: TestEngine =
            Engine::new(small_config(), HeadlessBackend::default(), loader());
        engine.switch_mode(ProjectionMode::Map, "earth.jpg").unwrap();
        engine.set_stops(&stops()).unwrap();
        engine.pointer_down(1.0, 1.0, 0.0, PointerButton::Primary);
        assert!(engine.pointer_up(1.0, 1.0, 10.0, &rect()).is_none());
        assert_eq!(engine.frame(0.0), FrameStatus::Stopped);
        assert_eq!(engine.state(), LifecycleState::Uninitialized);
        assert_eq!(engine.backend().created_total(), 0);
    }

    #[test]
    fn initial_scene_contents() {
        let mut engine = engine();
        engine.set_stops(&stops()).unwrap();
        let scene = engine.scene().unwrap();
        assert_eq!(scene.graph.count(NodeKind::Surface), 1);
        assert_eq!(scene.graph.count(NodeKind::Atmosphere), 1);
        assert_eq!(scene.graph.count(NodeKind::Stars), 1);
        assert_eq!(scene.graph.count(NodeKind::Marker), 2);
        assert_eq!(scene.lights.len(), 2);
        assert!(engine.auto_rotate());
        assert_eq!(engine.backend().size(), (800, 600));
    }

    #[test]
    fn mode_round_trip_leaves_single_surface() {
        let mut engine = engine();
        engine.set_stops(&stops()).unwrap();
        let live = engine.backend().live_resources();

        engine.switch_mode(ProjectionMode::Map, "earth.jpg").unwrap();
        {
            let scene = engine.scene().unwrap();
            assert_eq!(scene.graph.count(NodeKind::Surface), 1);
            assert_eq!(scene.graph.count(NodeKind::Atmosphere), 0);
            assert!(!engine.auto_rotate());
        }
        engine.switch_mode(ProjectionMode::Globe, "earth.jpg").unwrap();

        let scene = engine.scene().unwrap();
        assert_eq!(scene.graph.count(NodeKind::Surface), 1);
        assert_eq!(scene.graph.count(NodeKind::Atmosphere), 1);
        assert_eq!(scene.graph.count(NodeKind::MarkerGroup), 1);
        assert_eq!(scene.graph.count(NodeKind::Marker), 2);
        assert_eq!(engine.backend().live_resources(), live);
        let group = scene.markers.group().unwrap();
        assert_eq!(scene.graph.parent(group), scene.surface_node());
    }

    #[test]
    fn stars_only_visible_on_globe() {
        let mut engine = engine();
        let stars = engine.scene().unwrap().stars.unwrap();
        assert!(engine.scene().unwrap().graph.is_visible(stars));
        engine.toggle_mode().unwrap();
        assert_eq!(engine.mode(), Some(ProjectionMode::Map));
        assert!(!engine.scene().unwrap().graph.is_visible(stars));
    }

    #[test]
    fn quick_still_release_picks_once() {
        let mut engine = engine();
        engine.frame(0.0);
        engine.pointer_down(400.0, 300.0, 1000.0, PointerButton::Primary);
        let geo = engine.pointer_up(401.0, 301.0, 1100.0, &rect());
        assert!(geo.is_some());
        assert_eq!(engine.metrics().counter("pick.attempts"), 1);
        assert_eq!(engine.metrics().counter("gesture.clicks"), 1);

        let events = engine.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].payload, EngineEvent::CoordinateSelected(_)));
    }

    #[test]
    fn selection_is_stamped_with_current_frame() {
        let mut engine = engine();
        engine.pointer_down(400.0, 300.0, 0.0, PointerButton::Primary);
        engine.pointer_up(400.0, 300.0, 10.0, &rect()).unwrap();
        engine.frame(0.0);
        engine.frame(0.016);
        engine.pointer_down(400.0, 300.0, 100.0, PointerButton::Primary);
        engine.pointer_up(400.0, 300.0, 110.0, &rect()).unwrap();

        let frames: Vec<u64> = engine.drain_events().iter().map(|e| e.frame_index).collect();
        assert_eq!(frames, vec![0, 1]);
    }

    #[test]
    fn gauges_track_markers_and_live_resources() {
        let mut engine = engine();
        assert_eq!(engine.metrics().gauge("markers.count"), Some(0));
        assert_eq!(engine.metrics().gauge("scene.generation"), Some(1));

        engine.set_stops(&stops()).unwrap();
        assert_eq!(engine.metrics().gauge("markers.count"), Some(2));
        engine.frame(0.0);
        let live = engine.backend().live_resources() as i64;
        assert_eq!(engine.metrics().gauge("resources.live"), Some(live));

        engine.toggle_mode().unwrap();
        assert_eq!(engine.metrics().gauge("scene.generation"), Some(2));
        assert_eq!(engine.metrics().gauge("markers.count"), Some(2));
    }

    #[test]
    fn moved_or_slow_release_is_a_drag() {
        let mut engine = engine();
        engine.pointer_down(400.0, 300.0, 0.0, PointerButton::Primary);
        engine.pointer_move(406.0, 300.0);
        assert!(engine.pointer_up(406.0, 300.0, 50.0, &rect()).is_none());

        engine.pointer_down(400.0, 300.0, 1000.0, PointerButton::Primary);
        assert!(engine.pointer_up(400.0, 300.0, 1400.0, &rect()).is_none());

        assert_eq!(engine.metrics().counter("pick.attempts"), 0);
        assert_eq!(engine.metrics().counter("gesture.drags"), 2);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn click_off_surface_selects_nothing() {
        let mut engine = engine();
        engine.pointer_down(2.0, 2.0, 0.0, PointerButton::Primary);
        assert!(engine.pointer_up(2.0, 2.0, 10.0, &rect()).is_none());
        assert_eq!(engine.metrics().counter("pick.attempts"), 1);
        assert_eq!(engine.metrics().counter("pick.hits"), 0);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn teardown_after_initialize_only() {
        let mut engine = engine();
        engine.teardown();
        assert_eq!(engine.state(), LifecycleState::Disposed);
        assert_eq!(engine.frame(1.0), FrameStatus::Stopped);
        assert!(engine.backend().is_disposed());
        assert_eq!(engine.backend().created_total(), engine.backend().released_total());
        assert_eq!(engine.backend().frames_rendered(), 0);
        engine.teardown();
    }

    #[test]
    fn teardown_releases_textures_and_markers() {
        let mut engine = engine();
        engine.set_stops(&stops()).unwrap();
        engine.frame(0.0);
        assert_eq!(engine.backend().live_of_kind("texture"), 1);
        engine.teardown();
        assert_eq!(engine.backend().created_total(), engine.backend().released_total());
        engine.switch_mode(ProjectionMode::Map, "earth.jpg").unwrap();
        assert!(engine.scene().is_none());
    }

    #[test]
    fn texture_arrives_on_next_frame_and_rebuilds_markers() {
        let mut engine = engine();
        engine.set_stops(&stops()).unwrap();
        let rebuilds = engine.metrics().counter("markers.rebuilds");
        let material = engine.scene().unwrap().surface.unwrap().material;
        assert_eq!(engine.backend().material_texture(material), None);

        assert!(matches!(engine.frame(0.0), FrameStatus::Drawn(_)));
        let texture = engine.backend().material_texture(material).unwrap();
        assert_eq!(engine.backend().texture_size(texture), Some((4, 2)));
        assert_eq!(engine.metrics().counter("markers.rebuilds"), rebuilds + 1);
        assert_eq!(engine.metrics().counter("textures.applied"), 1);
    }

    #[test]
    fn stale_texture_after_switch_is_ignored() {
        let mut engine = engine();
        engine.set_stops(&stops()).unwrap();
        engine.switch_mode(ProjectionMode::Map, "earth.jpg").unwrap();
        let rebuilds = engine.metrics().counter("markers.rebuilds");

        engine.frame(0.0);
        // The globe's load is dropped; only the map's is uploaded.
        assert_eq!(engine.metrics().counter("textures.stale"), 1);
        assert_eq!(engine.metrics().counter("textures.applied"), 1);
        assert_eq!(engine.backend().live_of_kind("texture"), 1);
        assert_eq!(engine.metrics().counter("markers.rebuilds"), rebuilds + 1);
        let material = engine.scene().unwrap().surface.unwrap().material;
        assert!(engine.backend().material_texture(material).is_some());
    }

    #[test]
    fn failed_texture_leaves_surface_pickable() {
        let mut engine = engine();
        engine.set_texture("missing.jpg").unwrap();
        engine.frame(0.0);
        assert_eq!(engine.metrics().counter("textures.failed"), 1);
        let scene = engine.scene().unwrap();
        let mesh = scene.graph.mesh(scene.surface_node().unwrap()).unwrap();
        assert_eq!(mesh.texture, None);

        engine.pointer_down(400.0, 300.0, 0.0, PointerButton::Primary);
        assert!(engine.pointer_up(400.0, 300.0, 10.0, &rect()).is_some());
    }

    #[test]
    fn spun_map_click_reports_coordinate_under_cursor() {
        let mut config = small_config();
        config.initial_mode = ProjectionMode::Map;
        let mut engine = engine_with(config);
        let scene = engine.scene_mut().unwrap();
        let surface = scene.surface_node().unwrap();
        scene.graph.set_transform(
            surface,
            Transform {
                position: foundation::math::Vec3::ZERO,
                rotation_z: std::f64::consts::FRAC_PI_2,
            },
        );

        let ndc_y = 2.0 / (15.0 * 22.5f64.to_radians().tan());
        let py = (1.0 - ndc_y) * 0.5 * 600.0;
        engine.pointer_down(400.0, py, 0.0, PointerButton::Primary);
        let geo = engine.pointer_up(400.0, py, 20.0, &rect()).unwrap();
        assert!(geo.lat.abs() < 1e-6, "{geo:?}");
        assert!((geo.lng - 36.0).abs() < 1e-6, "{geo:?}");
    }

    #[test]
    fn map_auto_rotate_spins_surface() {
        let mut config = small_config();
        config.initial_mode = ProjectionMode::Map;
        let mut engine = engine_with(config);
        assert!(!engine.auto_rotate());
        assert!(engine.toggle_auto_rotate());
        engine.frame(0.0);
        engine.frame(0.016);
        let scene = engine.scene().unwrap();
        let t = scene.graph.transform(scene.surface_node().unwrap()).unwrap();
        assert!((t.rotation_z - 0.002).abs() < 1e-12);
    }

    #[test]
    fn globe_auto_rotate_moves_camera() {
        let mut engine = engine();
        let before = engine.scene().unwrap().camera.position;
        engine.frame(0.0);
        assert!((engine.scene().unwrap().camera.position - before).length() > 0.0);

        engine.set_auto_rotate(false);
        engine.frame(0.016);
        let settled = engine.scene().unwrap().camera.position;
        engine.frame(0.032);
        assert!((engine.scene().unwrap().camera.position - settled).length() < 1e-2);
    }

    #[test]
    fn empty_viewport_skips_draw() {
        let mut engine = engine();
        engine.resize(Viewport::new(0, 0));
        assert_eq!(engine.frame(0.0), FrameStatus::Skipped);
        engine.resize(VIEWPORT);
        assert!(matches!(engine.frame(0.016), FrameStatus::Drawn(_)));
        assert_eq!(engine.metrics().counter("frames.rendered"), 1);
    }

    #[test]
    fn wheel_zooms_within_limits() {
        let mut engine = engine();
        engine.set_auto_rotate(false);
        for i in 0..300 {
            engine.wheel(-100.0);
            engine.frame(i as f64 / 60.0);
        }
        let distance = engine.scene().unwrap().camera.position.length();
        assert!((distance - 8.0).abs() < 1e-9);
    }

    #[test]
    fn frame_draws_every_layer() {
        let mut engine = engine();
        engine.set_stops(&stops()).unwrap();
        let FrameStatus::Drawn(stats) = engine.frame(0.0) else {
            panic!("expected a drawn frame");
        };
        // stars + globe + atmosphere + two markers
        assert_eq!(stats.draw_calls, 5);
        assert_eq!(stats.points, 64);
    }

    #[test]
    fn released_ids_are_not_drawn() {
        let mut engine = engine();
        let material = engine.scene().unwrap().surface.unwrap().material;
        engine.switch_mode(ProjectionMode::Map, "earth.jpg").unwrap();
        assert!(!engine.backend().is_live(ResourceId::Material(material)));
        assert!(matches!(engine.frame(0.0), FrameStatus::Drawn(_)));
    }
}
