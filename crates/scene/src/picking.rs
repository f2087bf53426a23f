use foundation::math::Vec3;

use crate::SceneGraph;
use crate::components::Shape3D;
use crate::entity::NodeId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub node: NodeId,
    pub distance: f64,
    /// Hit point in the node's own frame, before its transform.
    pub local_point: Vec3,
    pub world_point: Vec3,
}

/// Nearest non-negative hit of `ray` with a sphere centred on the origin.
///
/// A ray starting inside the sphere reports the exit point.
pub fn intersect_sphere(ray: Ray, radius: f64) -> Option<f64> {
    let dir = ray.dir.normalize()?;
    let b = ray.origin.dot(dir);
    let c = ray.origin.dot(ray.origin) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t0 = -b - sq;
    let t1 = -b + sq;
    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        Some(t1)
    } else {
        None
    }
}

/// Hit with an origin-centred `width` x `height` rectangle in the z = 0 plane.
/// Both faces count. Degenerate rectangles never hit.
pub fn intersect_rect(ray: Ray, width: f64, height: f64) -> Option<f64> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let dir = ray.dir.normalize()?;
    if dir.z.abs() < 1e-12 {
        return None;
    }
    let t = -ray.origin.z / dir.z;
    if t < 0.0 {
        return None;
    }
    let hit = ray.origin + dir * t;
    if hit.x.abs() <= width * 0.5 && hit.y.abs() <= height * 0.5 {
        Some(t)
    } else {
        None
    }
}

/// Tests `ray` (world space) against one node's analytic shape.
///
/// The ray is moved into the node's local frame first, so a rotated node is
/// hit where it is drawn and `local_point` is independent of the rotation.
/// Hidden nodes and point clouds are never hit.
pub fn pick_node(graph: &SceneGraph, node: NodeId, ray: Ray) -> Option<PickHit> {
    if !graph.is_visible(node) {
        return None;
    }
    let drawable = graph.drawable(node)?;
    let world = graph.world_transform(node)?;
    let dir = ray.dir.normalize()?;
    let local = Ray::new(world.inverse_apply(ray.origin), world.inverse_rotate(dir));

    let t = match drawable.shape {
        Shape3D::Sphere { radius } => intersect_sphere(local, radius)?,
        Shape3D::Plane { width, height } => intersect_rect(local, width, height)?,
        Shape3D::Points { .. } => return None,
    };

    let local_point = local.at(t);
    Some(PickHit {
        node,
        distance: t,
        local_point,
        world_point: world.apply(local_point),
    })
}
