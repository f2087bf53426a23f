use crate::components::{Drawable3D, MeshBinding, Ownership, RenderLayer, Transform, Visibility};
use crate::entity::NodeId;
use foundation::handles::Handle;
use tracing::trace;

/// Role of a node; lets the controllers find and count the parts they own.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    AmbientLight { intensity_milli: u32 },
    DirectionalLight { intensity_milli: u32 },
    Stars,
    Surface,
    Atmosphere,
    MarkerGroup,
    Marker,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    transform: Transform,
    visibility: Visibility,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    drawable: Option<Drawable3D>,
    mesh: Option<MeshBinding>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// One drawable node, resolved to world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Renderable {
    pub node: NodeId,
    pub kind: NodeKind,
    pub world: Transform,
    pub mesh: MeshBinding,
}

/// Parent/child scene graph with generational node ids.
///
/// Removing a node removes its whole subtree and hands back the owned
/// [`MeshBinding`]s, so the caller releases backend resources in the same step
/// that detaches them.
#[derive(Debug, Default)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    roots: Vec<NodeId>,
    live: usize,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let parent = parent.filter(|p| self.contains(*p));
        let node = Node {
            kind,
            transform: Transform::identity(),
            visibility: Visibility::visible(),
            parent,
            children: Vec::new(),
            drawable: None,
            mesh: None,
        };

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                slot.node = Some(node);
                NodeId(Handle::new(index, slot.generation))
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId(Handle::new(index, 0))
            }
        };

        match parent {
            Some(p) => {
                if let Some(parent_node) = self.node_mut(p) {
                    parent_node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.live += 1;
        trace!(?kind, index = id.index(), "node spawned");
        id
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn transform(&self, id: NodeId) -> Option<Transform> {
        self.node(id).map(|n| n.transform)
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) {
        if let Some(node) = self.node_mut(id) {
            node.transform = transform;
        }
    }

    pub fn set_visibility(&mut self, id: NodeId, visibility: Visibility) {
        if let Some(node) = self.node_mut(id) {
            node.visibility = visibility;
        }
    }

    /// Visible only if the node and every ancestor are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.node(current) else {
                return false;
            };
            if !node.visibility.visible {
                return false;
            }
            cursor = node.parent;
        }
        true
    }

    pub fn drawable(&self, id: NodeId) -> Option<Drawable3D> {
        self.node(id).and_then(|n| n.drawable)
    }

    pub fn set_drawable(&mut self, id: NodeId, drawable: Drawable3D) {
        if let Some(node) = self.node_mut(id) {
            node.drawable = Some(drawable);
        }
    }

    pub fn mesh(&self, id: NodeId) -> Option<MeshBinding> {
        self.node(id).and_then(|n| n.mesh)
    }

    pub fn set_mesh(&mut self, id: NodeId, mesh: MeshBinding) {
        if let Some(node) = self.node_mut(id) {
            node.mesh = Some(mesh);
        }
    }

    /// Transform from the node's local frame to world space.
    pub fn world_transform(&self, id: NodeId) -> Option<Transform> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            chain.push(node.transform);
            cursor = node.parent;
        }
        let mut world = Transform::identity();
        for t in chain.iter().rev() {
            world = world.then(t);
        }
        Some(world)
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes_of(kind).len()
    }

    pub fn nodes_of(&self, kind: NodeKind) -> Vec<NodeId> {
        self.iter_ids()
            .filter(|id| self.kind(*id) == Some(kind))
            .collect()
    }

    /// Detaches `id` and its subtree. Returns the owned bindings that must now
    /// be released; shared bindings are skipped.
    pub fn remove(&mut self, id: NodeId) -> Vec<MeshBinding> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        match node.parent {
            Some(p) => {
                if let Some(parent) = self.node_mut(p) {
                    parent.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }

        let mut released = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let index = current.index();
            let Some(node) = self.slots[index as usize].node.take() else {
                continue;
            };
            self.free.push(index);
            self.live -= 1;
            stack.extend(node.children.iter().copied());
            if let Some(mesh) = node.mesh
                && mesh.ownership == Ownership::Owned
            {
                released.push(mesh);
            }
        }
        released
    }

    /// Removes every node. Returns all owned bindings.
    pub fn clear(&mut self) -> Vec<MeshBinding> {
        let roots = self.roots.clone();
        roots.into_iter().flat_map(|r| self.remove(r)).collect()
    }

    /// Visible drawable nodes in world space, ordered by layer then insertion.
    pub fn renderables(&self) -> Vec<Renderable> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodeId, Transform)> = self
            .roots
            .iter()
            .rev()
            .map(|r| (*r, Transform::identity()))
            .collect();
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            if !node.visibility.visible {
                continue;
            }
            let world = parent_world.then(&node.transform);
            if let Some(mesh) = node.mesh {
                out.push(Renderable {
                    node: id,
                    kind: node.kind,
                    world,
                    mesh,
                });
            }
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
        out.sort_by_key(|r| layer_rank(r.mesh.layer));
        out
    }

    fn iter_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.node
                .as_ref()
                .map(|_| NodeId(Handle::new(idx as u32, slot.generation)))
        })
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.0.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.0.generation() {
            return None;
        }
        slot.node.as_mut()
    }
}

fn layer_rank(layer: RenderLayer) -> u8 {
    match layer {
        RenderLayer::Background => 0,
        RenderLayer::Opaque => 1,
        RenderLayer::Additive => 2,
    }
}
