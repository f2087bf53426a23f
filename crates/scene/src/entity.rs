use foundation::handles::Handle;

/// A node in the [`SceneGraph`](crate::SceneGraph).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(pub Handle);

impl NodeId {
    pub fn index(&self) -> u32 {
        self.0.index()
    }
}
