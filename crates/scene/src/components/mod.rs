pub mod drawable3d;
pub mod mesh_binding;
pub mod transform;
pub mod visibility;

pub use drawable3d::*;
pub use mesh_binding::*;
pub use transform::*;
pub use visibility::*;
