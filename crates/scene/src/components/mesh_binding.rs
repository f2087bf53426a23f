use foundation::ids::{GeometryId, MaterialId, ResourceId, TextureId};

/// Draw order bucket. Background first, additive blends last.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderLayer {
    Background,
    Opaque,
    Additive,
}

/// Whether a node's backend resources die with the node.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    /// Resources are owned elsewhere (e.g. shared by every marker) and are not
    /// released when the node is removed.
    Shared,
}

/// Backend resources a node draws with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MeshBinding {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub texture: Option<TextureId>,
    pub layer: RenderLayer,
    pub ownership: Ownership,
}

impl MeshBinding {
    pub fn owned(geometry: GeometryId, material: MaterialId, layer: RenderLayer) -> Self {
        Self {
            geometry,
            material,
            texture: None,
            layer,
            ownership: Ownership::Owned,
        }
    }

    pub fn shared(geometry: GeometryId, material: MaterialId, layer: RenderLayer) -> Self {
        Self {
            ownership: Ownership::Shared,
            ..Self::owned(geometry, material, layer)
        }
    }

    /// Resources to release when this binding is dropped, texture last.
    pub fn resources(&self) -> Vec<ResourceId> {
        let mut out = vec![
            ResourceId::Geometry(self.geometry),
            ResourceId::Material(self.material),
        ];
        if let Some(texture) = self.texture {
            out.push(ResourceId::Texture(texture));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{MeshBinding, Ownership, RenderLayer};
    use foundation::ids::{GeometryId, MaterialId, ResourceId, TextureId};

    #[test]
    fn owned_binding_lists_texture_last() {
        let mut b = MeshBinding::owned(GeometryId(1), MaterialId(2), RenderLayer::Opaque);
        b.texture = Some(TextureId(3));
        assert_eq!(
            b.resources(),
            vec![
                ResourceId::Geometry(GeometryId(1)),
                ResourceId::Material(MaterialId(2)),
                ResourceId::Texture(TextureId(3)),
            ]
        );
    }

    #[test]
    fn shared_binding_keeps_layer() {
        let b = MeshBinding::shared(GeometryId(1), MaterialId(2), RenderLayer::Opaque);
        assert_eq!(b.ownership, Ownership::Shared);
        assert_eq!(b.layer, RenderLayer::Opaque);
    }

    #[test]
    fn layers_order_background_first() {
        assert!(RenderLayer::Background < RenderLayer::Opaque);
        assert!(RenderLayer::Opaque < RenderLayer::Additive);
    }
}
