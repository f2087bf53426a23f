pub mod backend;
pub mod headless;
pub mod renderer;
#[cfg(feature = "wgpu")]
pub mod wgpu_backend;

pub use backend::*;
pub use headless::HeadlessBackend;
pub use renderer::*;
#[cfg(feature = "wgpu")]
pub use wgpu_backend::WgpuBackend;
