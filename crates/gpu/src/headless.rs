use std::collections::BTreeMap;

use foundation::ids::{GeometryId, IdAllocator, MaterialId, ResourceId, TextureId};
use scene::mesh::{MeshData, Topology};
use tracing::{debug, warn};

use crate::backend::{BackendError, GraphicsBackend, MaterialDesc, TextureImage};
use crate::renderer::{Camera3D, DrawStats, RenderFrame};

#[derive(Debug, Clone, PartialEq)]
enum Resource {
    Geometry { triangles: u64, points: u64 },
    Material { desc: MaterialDesc, texture: Option<TextureId> },
    Texture { width: u32, height: u32 },
}

/// Backend with no device: keeps a ledger of every resource and draw.
///
/// Rendering validates that each command only references live resources, so
/// use-after-release and leaks surface as errors or non-zero counts in tests
/// and in the headless viewer. Only live resources are stored; ids are issued
/// monotonically, so anything below the high-water mark that is not live has
/// been released.
#[derive(Debug)]
pub struct HeadlessBackend {
    ids: IdAllocator,
    live: BTreeMap<ResourceId, Resource>,
    issued: u64,
    created_total: u64,
    released_total: u64,
    size: (u32, u32),
    frames: u64,
    last_stats: DrawStats,
    disposed: bool,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            ids: IdAllocator::new(),
            live: BTreeMap::new(),
            issued: 0,
            created_total: 0,
            released_total: 0,
            size: (width, height),
            frames: 0,
            last_stats: DrawStats::default(),
            disposed: false,
        }
    }

    pub fn created_total(&self) -> u64 {
        self.created_total
    }

    pub fn released_total(&self) -> u64 {
        self.released_total
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn last_stats(&self) -> DrawStats {
        self.last_stats
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn is_live(&self, id: ResourceId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn live_of_kind(&self, kind: &str) -> usize {
        self.live.keys().filter(|id| id.kind() == kind).count()
    }

    /// Texture currently bound to `material`, if any.
    pub fn material_texture(&self, material: MaterialId) -> Option<TextureId> {
        match self.live.get(&ResourceId::Material(material)) {
            Some(Resource::Material { texture, .. }) => *texture,
            _ => None,
        }
    }

    pub fn material_desc(&self, material: MaterialId) -> Option<MaterialDesc> {
        match self.live.get(&ResourceId::Material(material)) {
            Some(Resource::Material { desc, .. }) => Some(*desc),
            _ => None,
        }
    }

    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        match self.live.get(&ResourceId::Texture(texture)) {
            Some(Resource::Texture { width, height }) => Some((*width, *height)),
            _ => None,
        }
    }

    fn next_raw(&mut self) -> Result<u64, BackendError> {
        if self.disposed {
            return Err(BackendError::Disposed);
        }
        let raw = self.ids.next_raw();
        self.issued = self.issued.max(raw + 1);
        Ok(raw)
    }

    fn insert(&mut self, id: ResourceId, resource: Resource) {
        self.live.insert(id, resource);
        self.created_total += 1;
    }

    fn require(&self, id: ResourceId) -> Result<&Resource, BackendError> {
        self.live.get(&id).ok_or(BackendError::UnknownResource(id))
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn create_geometry(&mut self, mesh: &MeshData) -> Result<GeometryId, BackendError> {
        let (triangles, points) = match mesh.topology {
            Topology::Triangles => (mesh.triangle_count() as u64, 0),
            Topology::Points => (0, mesh.vertex_count() as u64),
        };
        let id = GeometryId(self.next_raw()?);
        self.insert(ResourceId::Geometry(id), Resource::Geometry { triangles, points });
        Ok(id)
    }

    fn create_material(&mut self, desc: &MaterialDesc) -> Result<MaterialId, BackendError> {
        let id = MaterialId(self.next_raw()?);
        self.insert(
            ResourceId::Material(id),
            Resource::Material {
                desc: *desc,
                texture: None,
            },
        );
        Ok(id)
    }

    fn create_texture(&mut self, image: &TextureImage) -> Result<TextureId, BackendError> {
        let id = TextureId(self.next_raw()?);
        self.insert(
            ResourceId::Texture(id),
            Resource::Texture {
                width: image.width,
                height: image.height,
            },
        );
        Ok(id)
    }

    fn bind_texture(&mut self, material: MaterialId, texture: TextureId) -> Result<(), BackendError> {
        self.require(ResourceId::Texture(texture))?;
        match self.live.get_mut(&ResourceId::Material(material)) {
            Some(Resource::Material { texture: slot, .. }) => {
                *slot = Some(texture);
                Ok(())
            }
            _ => Err(BackendError::UnknownResource(ResourceId::Material(material))),
        }
    }

    fn release(&mut self, id: ResourceId) -> Result<(), BackendError> {
        if self.live.remove(&id).is_some() {
            self.released_total += 1;
            return Ok(());
        }
        if self.disposed {
            return Err(BackendError::Disposed);
        }
        if id.raw() < self.issued {
            warn!(?id, "resource released twice");
            return Err(BackendError::DoubleRelease(id));
        }
        Err(BackendError::UnknownResource(id))
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn render(&mut self, _camera: &Camera3D, frame: &RenderFrame) -> Result<DrawStats, BackendError> {
        if self.disposed {
            return Err(BackendError::Disposed);
        }
        let mut stats = DrawStats::default();
        for cmd in &frame.commands {
            for id in cmd.mesh.resources() {
                self.require(id)?;
            }
            if let Resource::Geometry { triangles, points } =
                self.require(ResourceId::Geometry(cmd.mesh.geometry))?
            {
                stats.triangles += triangles;
                stats.points += points;
            }
            stats.draw_calls += 1;
        }
        self.frames += 1;
        self.last_stats = stats;
        Ok(stats)
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if !self.live.is_empty() {
            debug!(live = self.live.len(), "disposing backend with live resources");
        }
        self.live.clear();
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn live_resources(&self) -> usize {
        self.live.len()
    }
}
