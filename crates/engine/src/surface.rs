//! Surface construction and disposal for both projection modes.

use foundation::ids::{MaterialId, ResourceId, TextureId};
use foundation::math::projection::ProjectionMode;
use gpu::{BackendError, GraphicsBackend, MaterialDesc, TextureImage};
use scene::components::{Drawable3D, MeshBinding, RenderLayer};
use scene::entity::NodeId;
use scene::mesh::{MeshData, plane, uv_sphere};
use scene::{NodeKind, SceneGraph};
use tracing::{debug, warn};

use crate::config::SurfaceConfig;
use crate::scene::Scene;
use crate::texture::{TextureLoader, TextureTicket};

/// Nodes making up the current surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceParts {
    pub mode: ProjectionMode,
    pub mesh: NodeId,
    /// Globe only.
    pub atmosphere: Option<NodeId>,
    pub material: MaterialId,
}

/// Builds the surface for `mode`, attaches it to the scene graph and requests
/// `texture_id`.
///
/// The mesh comes back untextured and is already pickable. The load ticket is
/// stored in `scene.pending_texture`; it carries the scene's current
/// generation, so bump the generation before calling this.
pub fn build_surface<B, L>(
    scene: &mut Scene,
    backend: &mut B,
    loader: &mut L,
    mode: ProjectionMode,
    texture_id: &str,
    config: &SurfaceConfig,
) -> Result<SurfaceParts, BackendError>
where
    B: GraphicsBackend + ?Sized,
    L: TextureLoader + ?Sized,
{
    let graph = &mut scene.graph;
    let (mesh_data, drawable, desc) = match mode {
        ProjectionMode::Globe => (
            uv_sphere(config.globe_radius, config.globe_segments, config.globe_segments),
            Drawable3D::sphere(config.globe_radius),
            MaterialDesc::Surface {
                color: [1.0, 1.0, 1.0],
                roughness: config.globe_roughness,
                metalness: config.globe_metalness,
                double_sided: false,
            },
        ),
        ProjectionMode::Map => (
            plane(config.map_width, config.map_height),
            Drawable3D::plane(config.map_width, config.map_height),
            MaterialDesc::Surface {
                color: [1.0, 1.0, 1.0],
                roughness: config.map_roughness,
                metalness: config.map_metalness,
                double_sided: true,
            },
        ),
    };

    let binding = create_binding(backend, &mesh_data, &desc, RenderLayer::Opaque)?;
    let mesh = graph.spawn(NodeKind::Surface, None);
    graph.set_drawable(mesh, drawable);
    graph.set_mesh(mesh, binding);

    let atmosphere = match mode {
        ProjectionMode::Globe => match build_atmosphere(graph, backend, config) {
            Ok(node) => Some(node),
            Err(err) => {
                release_bindings(backend, graph.remove(mesh));
                return Err(err);
            }
        },
        ProjectionMode::Map => None,
    };

    let ticket = TextureTicket {
        generation: scene.generation,
        mode,
        material: binding.material,
    };
    scene.pending_texture = Some(ticket);
    loader.request(ticket, texture_id);

    debug!(%mode, texture = texture_id, generation = scene.generation, "surface built");
    Ok(SurfaceParts {
        mode,
        mesh,
        atmosphere,
        material: binding.material,
    })
}

fn build_atmosphere<B: GraphicsBackend + ?Sized>(
    graph: &mut SceneGraph,
    backend: &mut B,
    config: &SurfaceConfig,
) -> Result<NodeId, BackendError> {
    let radius = config.globe_radius + config.atmosphere_offset;
    let desc = MaterialDesc::Atmosphere {
        color: config.atmosphere_color,
        falloff: config.atmosphere_falloff,
        power: config.atmosphere_power,
    };
    let binding = create_binding(
        backend,
        &uv_sphere(radius, config.globe_segments, config.globe_segments),
        &desc,
        RenderLayer::Additive,
    )?;
    let node = graph.spawn(NodeKind::Atmosphere, None);
    graph.set_mesh(node, binding);
    Ok(node)
}

fn create_binding<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    mesh: &MeshData,
    desc: &MaterialDesc,
    layer: RenderLayer,
) -> Result<MeshBinding, BackendError> {
    let geometry = backend.create_geometry(mesh)?;
    match backend.create_material(desc) {
        Ok(material) => Ok(MeshBinding::owned(geometry, material, layer)),
        Err(err) => {
            let _ = backend.release(ResourceId::Geometry(geometry));
            Err(err)
        }
    }
}

/// Uploads `image`, binds it to the surface material and releases the texture
/// it replaces.
pub fn apply_texture<B: GraphicsBackend + ?Sized>(
    graph: &mut SceneGraph,
    backend: &mut B,
    parts: &SurfaceParts,
    image: &TextureImage,
) -> Result<TextureId, BackendError> {
    let Some(mut binding) = graph.mesh(parts.mesh) else {
        return Err(BackendError::UnknownResource(ResourceId::Material(parts.material)));
    };
    let texture = backend.create_texture(image)?;
    if let Err(err) = backend.bind_texture(parts.material, texture) {
        let _ = backend.release(ResourceId::Texture(texture));
        return Err(err);
    }
    let previous = binding.texture.replace(texture);
    graph.set_mesh(parts.mesh, binding);
    if let Some(old) = previous
        && let Err(err) = backend.release(ResourceId::Texture(old))
    {
        warn!(%err, "failed to release replaced surface texture");
    }
    debug!(
        width = image.width,
        height = image.height,
        mode = %parts.mode,
        "surface texture applied"
    );
    Ok(texture)
}

/// Detaches the surface (and everything parented under it) and releases the
/// owned resources.
pub fn dispose_surface<B: GraphicsBackend + ?Sized>(
    graph: &mut SceneGraph,
    backend: &mut B,
    parts: SurfaceParts,
) {
    let mut bindings = graph.remove(parts.mesh);
    if let Some(atmosphere) = parts.atmosphere {
        bindings.extend(graph.remove(atmosphere));
    }
    release_bindings(backend, bindings);
    debug!(mode = %parts.mode, "surface disposed");
}

pub(crate) fn release_bindings<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    bindings: Vec<MeshBinding>,
) {
    for binding in bindings {
        for id in binding.resources() {
            if let Err(err) = backend.release(id) {
                warn!(%err, "resource release failed");
            }
        }
    }
}
