use std::path::Path;

use foundation::math::projection::{ProjectionMode, ProjectionParams};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine tuning. Every field has a default, so a partial JSON document only
/// overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_mode: ProjectionMode,
    pub surface: SurfaceConfig,
    pub markers: MarkerConfig,
    pub camera: CameraConfig,
    pub input: InputConfig,
    pub stars: StarConfig,
    pub lights: LightConfig,
    pub textures: TextureConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_mode: ProjectionMode::Globe,
            surface: SurfaceConfig::default(),
            markers: MarkerConfig::default(),
            camera: CameraConfig::default(),
            input: InputConfig::default(),
            stars: StarConfig::default(),
            lights: LightConfig::default(),
            textures: TextureConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn projection_params(&self) -> ProjectionParams {
        ProjectionParams {
            globe_radius: self.surface.globe_radius,
            map_width: self.surface.map_width,
            map_height: self.surface.map_height,
            marker_z_offset: self.surface.marker_z_offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub globe_radius: f64,
    pub globe_segments: u32,
    pub map_width: f64,
    pub map_height: f64,
    pub marker_z_offset: f64,
    pub globe_roughness: f32,
    pub globe_metalness: f32,
    pub map_roughness: f32,
    pub map_metalness: f32,
    /// Shell radius is `globe_radius + atmosphere_offset`.
    pub atmosphere_offset: f64,
    pub atmosphere_color: [f32; 3],
    pub atmosphere_falloff: f32,
    pub atmosphere_power: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            globe_radius: 5.0,
            globe_segments: 64,
            map_width: 20.0,
            map_height: 10.0,
            marker_z_offset: 0.05,
            globe_roughness: 0.9,
            globe_metalness: 0.1,
            map_roughness: 0.7,
            map_metalness: 0.1,
            atmosphere_offset: 0.8,
            atmosphere_color: [0.3, 0.6, 1.0],
            atmosphere_falloff: 0.6,
            atmosphere_power: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub radius: f64,
    pub segments: u32,
    /// Linear RGB of `#00dddd`.
    pub color: [f32; 3],
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            radius: 0.08,
            segments: 16,
            color: [0.0, 221.0 / 255.0, 221.0 / 255.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_deg: f64,
    pub near: f64,
    pub far: f64,
    pub globe_eye: [f64; 3],
    pub map_eye: [f64; 3],
    pub damping_factor: f64,
    pub auto_rotate_speed: f64,
    pub globe_auto_rotate: bool,
    /// Radians per frame the map plane spins while auto-rotate is on.
    pub map_spin_rate: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 45.0,
            near: 0.1,
            far: 2000.0,
            globe_eye: [0.0, 5.0, 20.0],
            map_eye: [0.0, 0.0, 15.0],
            damping_factor: 0.05,
            auto_rotate_speed: 0.5,
            globe_auto_rotate: true,
            map_spin_rate: 0.001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub click_max_ms: f64,
    pub click_max_px: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            click_max_ms: 250.0,
            click_max_px: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarConfig {
    pub count: u32,
    pub half_extent: f64,
    pub depth: f64,
    pub size: f32,
    pub seed: u32,
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            count: 10_000,
            half_extent: 1000.0,
            depth: 2000.0,
            size: 0.7,
            seed: 0x5eed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub ambient: f32,
    pub directional: f32,
    pub directional_position: [f64; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            ambient: 0.5,
            directional: 1.5,
            directional_position: [10.0, 10.0, 10.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub root: String,
    pub default_texture: String,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            root: "assets/textures".to_string(),
            default_texture: "earth.jpg".to_string(),
        }
    }
}
