use foundation::ids::ResourceId;
use foundation::math::Vec3;
use foundation::math::projection::ProjectionMode;
use gpu::{BackendError, Camera3D, GraphicsBackend, MaterialDesc};
use scene::components::{Drawable3D, MeshBinding, RenderLayer, Transform, Visibility};
use scene::entity::NodeId;
use scene::mesh::{StarFieldBounds, star_field};
use scene::{NodeKind, SceneGraph};
use tracing::debug;

use crate::camera::{OrbitRig, RigLimits};
use crate::config::{CameraConfig, LightConfig, StarConfig};
use crate::input::PointerState;
use crate::markers::MarkerSet;
use crate::surface::SurfaceParts;
use crate::texture::TextureTicket;

/// Drawable area in physical pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.width as f64 / self.height as f64)
        }
    }
}

/// Everything one mounted view owns.
///
/// `surface` holds at most one mesh (plus the globe's atmosphere). The marker
/// group, when present, hangs under that mesh.
#[derive(Debug)]
pub struct Scene {
    pub graph: SceneGraph,
    pub viewport: Viewport,
    pub camera: Camera3D,
    pub rig: Option<OrbitRig>,
    pub surface: Option<SurfaceParts>,
    pub markers: MarkerSet,
    pub stars: Option<NodeId>,
    pub lights: Vec<NodeId>,
    /// Bumped on every surface rebuild; texture tickets from older
    /// generations are stale.
    pub generation: u64,
    pub pending_texture: Option<TextureTicket>,
    pub pointer: PointerState,
}

impl Scene {
    pub fn new(viewport: Viewport, camera: &CameraConfig) -> Self {
        let eye = Vec3::from(camera.globe_eye);
        let mut cam = Camera3D::look_at(
            eye,
            Vec3::ZERO,
            camera.fov_deg.to_radians(),
            camera.near,
            camera.far,
        );
        if let Some(aspect) = viewport.aspect() {
            cam.set_aspect(aspect);
        }
        Self {
            graph: SceneGraph::new(),
            viewport,
            camera: cam,
            rig: None,
            surface: None,
            markers: MarkerSet::default(),
            stars: None,
            lights: Vec::new(),
            generation: 0,
            pending_texture: None,
            pointer: PointerState::default(),
        }
    }

    pub fn add_lights(&mut self, config: &LightConfig) {
        let ambient = self.graph.spawn(
            NodeKind::AmbientLight {
                intensity_milli: milli(config.ambient),
            },
            None,
        );
        let directional = self.graph.spawn(
            NodeKind::DirectionalLight {
                intensity_milli: milli(config.directional),
            },
            None,
        );
        self.graph.set_transform(
            directional,
            Transform::translate(Vec3::from(config.directional_position)),
        );
        self.lights = vec![ambient, directional];
    }

    /// Background point cloud. The node owns its geometry and material.
    pub fn add_stars<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        config: &StarConfig,
    ) -> Result<NodeId, BackendError> {
        let bounds = StarFieldBounds {
            half_extent: config.half_extent,
            depth: config.depth,
        };
        let mesh = star_field(config.count, bounds, config.seed);
        let geometry = backend.create_geometry(&mesh)?;
        let material = match backend.create_material(&MaterialDesc::Stars {
            color: [1.0, 1.0, 1.0],
            size: config.size,
        }) {
            Ok(material) => material,
            Err(err) => {
                let _ = backend.release(ResourceId::Geometry(geometry));
                return Err(err);
            }
        };
        let node = self.graph.spawn(NodeKind::Stars, None);
        self.graph.set_drawable(node, Drawable3D::points(config.count));
        self.graph
            .set_mesh(node, MeshBinding::owned(geometry, material, RenderLayer::Background));
        self.stars = Some(node);
        debug!(count = config.count, "star field created");
        Ok(node)
    }

    pub fn set_stars_visible(&mut self, visible: bool) {
        if let Some(stars) = self.stars {
            self.graph.set_visibility(stars, Visibility::from_flag(visible));
        }
    }

    /// Resets the camera to the mode's framing and installs a fresh rig.
    /// The previous rig, if any, is disposed.
    pub fn frame_camera(&mut self, mode: ProjectionMode, config: &CameraConfig) {
        if let Some(rig) = self.rig.take() {
            rig.dispose();
        }
        let eye = match mode {
            ProjectionMode::Globe => Vec3::from(config.globe_eye),
            ProjectionMode::Map => Vec3::from(config.map_eye),
        };
        let rig = OrbitRig::new(eye, Vec3::ZERO, RigLimits::for_mode(mode), config);
        let mut camera = Camera3D::look_at(
            rig.eye(),
            rig.target(),
            config.fov_deg.to_radians(),
            config.near,
            config.far,
        );
        if let Some(aspect) = self.viewport.aspect() {
            camera.set_aspect(aspect);
        }
        self.camera = camera;
        self.rig = Some(rig);
    }

    /// Copies the rig pose into the camera.
    pub fn sync_camera(&mut self) {
        if let Some(rig) = &self.rig {
            self.camera.position = rig.eye();
            self.camera.target = rig.target();
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Some(aspect) = viewport.aspect() {
            self.camera.set_aspect(aspect);
        }
    }

    pub fn surface_node(&self) -> Option<NodeId> {
        self.surface.as_ref().map(|s| s.mesh)
    }
}

fn milli(intensity: f32) -> u32 {
    (intensity.max(0.0) * 1000.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::{Scene, Viewport};
    use crate::config::{CameraConfig, LightConfig, StarConfig};
    use foundation::math::Vec3;
    use foundation::math::projection::ProjectionMode;
    use gpu::{GraphicsBackend, HeadlessBackend, Renderer};
    use scene::NodeKind;

    #[test]
    fn viewport_aspect() {
        assert_eq!(Viewport::new(800, 400).aspect(), Some(2.0));
        assert!(Viewport::new(0, 400).is_empty());
        assert_eq!(Viewport::new(800, 0).aspect(), None);
    }

    #[test]
    fn lights_feed_render_frame() {
        let mut scene = Scene::new(Viewport::new(800, 600), &CameraConfig::default());
        scene.add_lights(&LightConfig::default());
        let frame = Renderer::collect(&scene.graph);
        assert!((frame.lighting.ambient - 0.5).abs() < 1e-6);
        assert!((frame.lighting.directional - 1.5).abs() < 1e-6);
        let d = 1.0 / 3f32.sqrt();
        for c in frame.lighting.direction {
            assert!((c - d).abs() < 1e-6);
        }
    }

    #[test]
    fn stars_are_background_and_toggle() {
        let mut backend = HeadlessBackend::default();
        let mut scene = Scene::new(Viewport::new(800, 600), &CameraConfig::default());
        let config = StarConfig {
            count: 100,
            ..StarConfig::default()
        };
        scene.add_stars(&mut backend, &config).unwrap();
        assert_eq!(backend.live_resources(), 2);
        assert_eq!(scene.graph.count(NodeKind::Stars), 1);

        scene.set_stars_visible(false);
        assert!(Renderer::collect(&scene.graph).commands.is_empty());
        scene.set_stars_visible(true);
        assert_eq!(Renderer::collect(&scene.graph).commands.len(), 1);
    }

    #[test]
    fn framing_follows_mode() {
        let mut scene = Scene::new(Viewport::new(800, 600), &CameraConfig::default());
        scene.frame_camera(ProjectionMode::Map, &CameraConfig::default());
        assert!((scene.camera.position - Vec3::new(0.0, 0.0, 15.0)).length() < 1e-9);
        assert!((scene.camera.aspect - 800.0 / 600.0).abs() < 1e-12);
        scene.frame_camera(ProjectionMode::Globe, &CameraConfig::default());
        assert!((scene.camera.position - Vec3::new(0.0, 5.0, 20.0)).length() < 1e-9);
        assert_eq!(scene.rig.as_ref().map(|r| r.limits().min_distance), Some(8.0));
    }

    #[test]
    fn zero_resize_keeps_aspect() {
        let mut scene = Scene::new(Viewport::new(800, 400), &CameraConfig::default());
        scene.resize(Viewport::new(0, 0));
        assert!(scene.viewport.is_empty());
        assert_eq!(scene.camera.aspect, 2.0);
    }
}
