use foundation::geo::GeoPoint;
use foundation::ids::{GeometryId, MaterialId, ResourceId};
use foundation::math::Vec3;
use foundation::math::projection::{ProjectionMode, ProjectionParams, to_scene_position};
use gpu::{BackendError, GraphicsBackend, MaterialDesc};
use scene::components::{MeshBinding, RenderLayer, Transform};
use scene::entity::NodeId;
use scene::mesh::uv_sphere;
use scene::{NodeKind, SceneGraph};
use tracing::{debug, warn};

use crate::config::MarkerConfig;

/// One marker node per stop, all drawing with a single shared geometry and
/// material owned by the set.
#[derive(Debug, Default)]
pub struct MarkerSet {
    group: Option<NodeId>,
    nodes: Vec<NodeId>,
    shared: Option<(GeometryId, MaterialId)>,
}

impl MarkerSet {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn group(&self) -> Option<NodeId> {
        self.group
    }

    /// Replaces every marker with one per stop, parented under `parent`
    /// through a fresh group node.
    ///
    /// Old nodes and the old shared resources are released first, so calling
    /// this repeatedly with the same input is stable in both positions and
    /// live resource count. An empty stop list leaves the set empty.
    #[allow(clippy::too_many_arguments)]
    pub fn rebuild<B: GraphicsBackend + ?Sized>(
        &mut self,
        graph: &mut SceneGraph,
        backend: &mut B,
        stops: &[GeoPoint],
        mode: ProjectionMode,
        parent: NodeId,
        params: &ProjectionParams,
        config: &MarkerConfig,
    ) -> Result<(), BackendError> {
        self.clear(graph, backend);
        if stops.is_empty() {
            return Ok(());
        }

        let geometry =
            backend.create_geometry(&uv_sphere(config.radius, config.segments, config.segments))?;
        let material = match backend.create_material(&MaterialDesc::Marker {
            color: config.color,
        }) {
            Ok(material) => material,
            Err(err) => {
                let _ = backend.release(ResourceId::Geometry(geometry));
                return Err(err);
            }
        };
        self.shared = Some((geometry, material));

        let group = graph.spawn(NodeKind::MarkerGroup, Some(parent));
        self.group = Some(group);
        let binding = MeshBinding::shared(geometry, material, RenderLayer::Opaque);
        for stop in stops {
            let node = graph.spawn(NodeKind::Marker, Some(group));
            let position = to_scene_position(stop.lat, stop.lng, mode, params);
            graph.set_transform(node, Transform::translate(position));
            graph.set_mesh(node, binding);
            self.nodes.push(node);
        }
        debug!(count = stops.len(), %mode, "markers rebuilt");
        Ok(())
    }

    /// Detaches the marker nodes and releases the shared resources. Safe to
    /// call when empty or after the parent surface was already removed.
    pub fn clear<B: GraphicsBackend + ?Sized>(&mut self, graph: &mut SceneGraph, backend: &mut B) {
        if let Some(group) = self.group.take() {
            // Marker bindings are shared; nothing comes back to release here.
            graph.remove(group);
        }
        self.nodes.clear();
        if let Some((geometry, material)) = self.shared.take() {
            for id in [ResourceId::Geometry(geometry), ResourceId::Material(material)] {
                if let Err(err) = backend.release(id) {
                    warn!(%err, "marker resource release failed");
                }
            }
        }
    }

    /// Marker positions in the surface's local frame, in stop order.
    pub fn positions(&self, graph: &SceneGraph) -> Vec<Vec3> {
        self.nodes
            .iter()
            .filter_map(|n| graph.transform(*n))
            .map(|t| t.position)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::MarkerSet;
    use crate::config::MarkerConfig;
    use foundation::geo::GeoPoint;
    use foundation::math::Vec3;
    use foundation::math::projection::{ProjectionMode, ProjectionParams};
    use gpu::{GraphicsBackend, HeadlessBackend, MaterialDesc, Renderer};
    use pretty_assertions::assert_eq;
    use scene::{NodeKind, SceneGraph};

    fn stops() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new("Lisbon", 38.72, -9.14),
            GeoPoint::new("Tokyo", 35.68, 139.69),
            GeoPoint::new("Origin", 0.0, 0.0),
        ]
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut graph = SceneGraph::new();
        let mut backend = HeadlessBackend::default();
        let surface = graph.spawn(NodeKind::Surface, None);
        let params = ProjectionParams::default();
        let config = MarkerConfig::default();
        let mut markers = MarkerSet::default();

        markers
            .rebuild(&mut graph, &mut backend, &stops(), ProjectionMode::Globe, surface, &params, &config)
            .unwrap();
        let first = markers.positions(&graph);
        let live = backend.live_resources();
        let nodes = graph.len();

        for _ in 0..5 {
            markers
                .rebuild(&mut graph, &mut backend, &stops(), ProjectionMode::Globe, surface, &params, &config)
                .unwrap();
        }
        assert_eq!(markers.positions(&graph), first);
        assert_eq!(backend.live_resources(), live);
        assert_eq!(graph.len(), nodes);
        assert_eq!(markers.len(), 3);
        assert!((first[2] - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-12);

        markers.clear(&mut graph, &mut backend);
        assert_eq!(backend.created_total(), backend.released_total());
        assert_eq!(backend.live_resources(), 0);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn markers_share_one_geometry_and_material() {
        let mut graph = SceneGraph::new();
        let mut backend = HeadlessBackend::default();
        let surface = graph.spawn(NodeKind::Surface, None);
        let mut markers = MarkerSet::default();
        markers
            .rebuild(
                &mut graph,
                &mut backend,
                &stops(),
                ProjectionMode::Map,
                surface,
                &ProjectionParams::default(),
                &MarkerConfig::default(),
            )
            .unwrap();
        assert_eq!(backend.live_resources(), 2);
        assert_eq!(graph.parent(markers.group().unwrap()), Some(surface));

        let frame = Renderer::collect(&graph);
        assert_eq!(frame.commands.len(), 3);
        let material = frame.commands[0].mesh.material;
        assert!(frame.commands.iter().all(|c| c.mesh.material == material));
        assert!(matches!(backend.material_desc(material), Some(MaterialDesc::Marker { .. })));
        // Map markers float just above the plane.
        assert!(markers.positions(&graph).iter().all(|p| p.z == 0.05));
    }

    #[test]
    fn empty_stops_and_double_clear() {
        let mut graph = SceneGraph::new();
        let mut backend = HeadlessBackend::default();
        let surface = graph.spawn(NodeKind::Surface, None);
        let mut markers = MarkerSet::default();
        markers.clear(&mut graph, &mut backend);
        markers
            .rebuild(
                &mut graph,
                &mut backend,
                &[],
                ProjectionMode::Globe,
                surface,
                &ProjectionParams::default(),
                &MarkerConfig::default(),
            )
            .unwrap();
        assert!(markers.is_empty());
        assert_eq!(backend.created_total(), 0);
        markers.clear(&mut graph, &mut backend);
    }

    #[test]
    fn clear_after_parent_removed_still_releases() {
        let mut graph = SceneGraph::new();
        let mut backend = HeadlessBackend::default();
        let surface = graph.spawn(NodeKind::Surface, None);
        let mut markers = MarkerSet::default();
        markers
            .rebuild(
                &mut graph,
                &mut backend,
                &stops(),
                ProjectionMode::Globe,
                surface,
                &ProjectionParams::default(),
                &MarkerConfig::default(),
            )
            .unwrap();
        assert!(graph.remove(surface).is_empty());
        markers.clear(&mut graph, &mut backend);
        assert_eq!(backend.live_resources(), 0);
        assert!(graph.is_empty());
    }
}
