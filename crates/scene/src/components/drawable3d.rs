/// Analytic shape of a node, used for hit-testing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Shape3D {
    Sphere { radius: f64 },
    /// Axis-aligned rectangle in the local z = 0 plane, centred on the origin.
    Plane { width: f64, height: f64 },
    Points { count: u32 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Drawable3D {
    pub shape: Shape3D,
}

impl Drawable3D {
    pub fn sphere(radius: f64) -> Self {
        Self {
            shape: Shape3D::Sphere { radius },
        }
    }

    pub fn plane(width: f64, height: f64) -> Self {
        Self {
            shape: Shape3D::Plane { width, height },
        }
    }

    pub fn points(count: u32) -> Self {
        Self {
            shape: Shape3D::Points { count },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Drawable3D, Shape3D};

    #[test]
    fn create_sphere_drawable() {
        let drawable = Drawable3D::sphere(1.5);
        assert!(matches!(drawable.shape, Shape3D::Sphere { radius } if radius == 1.5));
    }
}
