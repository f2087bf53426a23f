use foundation::math::Vec3;

/// Rigid transform: rotation about the local +Z axis, then translation.
///
/// The only rotation the engine applies to nodes is the map plane's spin, so a
/// single angle is enough.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation_z: f64,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation_z: 0.0,
        }
    }

    pub fn translate(position: Vec3) -> Self {
        Self {
            position,
            rotation_z: 0.0,
        }
    }

    /// Maps a point from this transform's local frame into the parent frame.
    pub fn apply(&self, local: Vec3) -> Vec3 {
        local.rotate_z(self.rotation_z) + self.position
    }

    /// Maps a point from the parent frame into this transform's local frame.
    pub fn inverse_apply(&self, parent: Vec3) -> Vec3 {
        (parent - self.position).rotate_z(-self.rotation_z)
    }

    /// Rotates a direction into the local frame (translation does not apply).
    pub fn inverse_rotate(&self, dir: Vec3) -> Vec3 {
        dir.rotate_z(-self.rotation_z)
    }

    /// `self` is the parent, `child` is expressed in the parent's frame.
    pub fn then(&self, child: &Transform) -> Transform {
        Transform {
            position: self.apply(child.position),
            rotation_z: self.rotation_z + child.rotation_z,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
