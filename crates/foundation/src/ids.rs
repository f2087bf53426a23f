//! Typed ids for graphics resources issued by a rendering backend.

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl $name {
            pub fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

resource_id!(
    /// Vertex/index data uploaded to the backend.
    GeometryId
);
resource_id!(
    /// Shading parameters, optionally bound to a texture.
    MaterialId
);
resource_id!(
    /// Decoded image uploaded to the backend.
    TextureId
);

/// Any backend resource, for bookkeeping that spans all three kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceId {
    Geometry(GeometryId),
    Material(MaterialId),
    Texture(TextureId),
}

impl ResourceId {
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceId::Geometry(_) => "geometry",
            ResourceId::Material(_) => "material",
            ResourceId::Texture(_) => "texture",
        }
    }

    pub fn raw(&self) -> u64 {
        match self {
            ResourceId::Geometry(id) => id.raw(),
            ResourceId::Material(id) => id.raw(),
            ResourceId::Texture(id) => id.raw(),
        }
    }
}

/// Monotonic id source shared by all resource kinds; ids are never reused.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_raw(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::{GeometryId, IdAllocator, ResourceId, TextureId};

    #[test]
    fn allocator_is_monotonic() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_raw(), 0);
        assert_eq!(ids.next_raw(), 1);
        assert_eq!(GeometryId(ids.next_raw()).raw(), 2);
    }

    #[test]
    fn resource_kind_names() {
        assert_eq!(ResourceId::Geometry(GeometryId(1)).kind(), "geometry");
        assert_eq!(ResourceId::Texture(TextureId(1)).kind(), "texture");
        assert_eq!(ResourceId::Texture(TextureId(7)).raw(), 7);
    }
}
