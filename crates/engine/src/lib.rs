//! Dual-projection globe/map view: scene lifecycle, camera, markers, picking
//! and the per-frame render loop on top of a [`gpu::GraphicsBackend`].

pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod markers;
pub mod pick;
pub mod scene;
pub mod surface;
pub mod texture;

pub use config::EngineConfig;
pub use engine::{Engine, EngineEvent, FrameStatus, LifecycleState};
pub use error::{ConfigError, EngineError, TextureError};
pub use crate::pick::ContainerRect;
pub use crate::scene::{Scene, Viewport};
