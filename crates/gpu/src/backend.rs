use foundation::ids::{GeometryId, MaterialId, ResourceId, TextureId};
use scene::mesh::MeshData;
use thiserror::Error;

use crate::renderer::{Camera3D, DrawStats, RenderFrame};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("unknown {} resource {:?}", .0.kind(), .0)]
    UnknownResource(ResourceId),
    #[error("{} resource {:?} released twice", .0.kind(), .0)]
    DoubleRelease(ResourceId),
    #[error("backend already disposed")]
    Disposed,
    #[error("texture {width}x{height} expects {expected} bytes, got {actual}")]
    InvalidTexture {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("device error: {0}")]
    Device(String),
}

/// Shading model for one material.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MaterialDesc {
    /// Lit surface, optionally textured through [`GraphicsBackend::bind_texture`].
    Surface {
        color: [f32; 3],
        roughness: f32,
        metalness: f32,
        double_sided: bool,
    },
    /// View-dependent rim glow drawn on back faces with additive blending.
    Atmosphere { color: [f32; 3], falloff: f32, power: f32 },
    /// Flat lit colour shared by every marker.
    Marker { color: [f32; 3] },
    Stars { color: [f32; 3], size: f32 },
}

/// Tightly packed RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, BackendError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(BackendError::InvalidTexture {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self { width, height, rgba })
    }

    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let rgba = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self { width, height, rgba }
    }
}

/// GPU resource owner and draw target.
///
/// Every `create_*` hands out an id that must be passed to [`release`] exactly
/// once; [`dispose`] tears down the device and whatever is still alive.
///
/// [`release`]: GraphicsBackend::release
/// [`dispose`]: GraphicsBackend::dispose
pub trait GraphicsBackend {
    fn create_geometry(&mut self, mesh: &MeshData) -> Result<GeometryId, BackendError>;

    fn create_material(&mut self, desc: &MaterialDesc) -> Result<MaterialId, BackendError>;

    fn create_texture(&mut self, image: &TextureImage) -> Result<TextureId, BackendError>;

    /// Points `material` at `texture`; the material is redrawn with it from the next frame.
    fn bind_texture(&mut self, material: MaterialId, texture: TextureId) -> Result<(), BackendError>;

    fn release(&mut self, id: ResourceId) -> Result<(), BackendError>;

    fn resize(&mut self, width: u32, height: u32);

    fn render(&mut self, camera: &Camera3D, frame: &RenderFrame) -> Result<DrawStats, BackendError>;

    /// Releases the device. Idempotent.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;

    /// Resources created and not yet released.
    fn live_resources(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::{BackendError, TextureImage};
    use foundation::ids::{GeometryId, ResourceId};

    #[test]
    fn texture_image_checks_length() {
        assert!(TextureImage::new(2, 2, vec![0; 16]).is_ok());
        let err = TextureImage::new(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            BackendError::InvalidTexture {
                width: 2,
                height: 2,
                expected: 16,
                actual: 15
            }
        );
        assert!(TextureImage::new(0, 2, Vec::new()).is_err());
    }

    #[test]
    fn solid_fills_every_texel() {
        let img = TextureImage::solid(3, 1, [1, 2, 3, 4]);
        assert_eq!(img.rgba, vec![1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn error_names_resource_kind() {
        let msg = BackendError::DoubleRelease(ResourceId::Geometry(GeometryId(4))).to_string();
        assert!(msg.starts_with("geometry resource"));
    }
}
