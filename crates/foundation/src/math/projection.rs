//! Geographic <-> scene-space transforms for the two supported projections.
//!
//! Both directions are pure functions of `(input, mode, params)`. Positions are
//! expressed in the surface mesh's local frame: the globe is centred at the
//! origin with +Y through the north pole, the map lies in the z = 0 plane with
//! +X east and +Y north.

use core::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::Vec3;
use crate::geo::LatLng;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    #[default]
    Globe,
    Map,
}

impl ProjectionMode {
    pub fn other(self) -> Self {
        match self {
            ProjectionMode::Globe => ProjectionMode::Map,
            ProjectionMode::Map => ProjectionMode::Globe,
        }
    }
}

impl std::fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionMode::Globe => write!(f, "globe"),
            ProjectionMode::Map => write!(f, "map"),
        }
    }
}

/// Surface dimensions shared by the transforms, the surface builder and picking.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProjectionParams {
    pub globe_radius: f64,
    pub map_width: f64,
    pub map_height: f64,
    /// Height of map markers above the plane, keeps them out of z-fighting range.
    pub marker_z_offset: f64,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            globe_radius: 5.0,
            map_width: 20.0,
            map_height: 10.0,
            marker_z_offset: 0.05,
        }
    }
}

impl ProjectionParams {
    pub fn half_width(&self) -> f64 {
        self.map_width * 0.5
    }

    pub fn half_height(&self) -> f64 {
        self.map_height * 0.5
    }
}

pub fn to_scene_position(lat: f64, lng: f64, mode: ProjectionMode, params: &ProjectionParams) -> Vec3 {
    match mode {
        ProjectionMode::Globe => {
            let r = params.globe_radius;
            let phi = (90.0 - lat) * (PI / 180.0);
            let theta = (lng + 180.0) * (PI / 180.0);
            Vec3::new(
                -r * phi.sin() * theta.cos(),
                r * phi.cos(),
                r * phi.sin() * theta.sin(),
            )
        }
        ProjectionMode::Map => Vec3::new(
            (lng / 180.0) * params.half_width(),
            (lat / 90.0) * params.half_height(),
            params.marker_z_offset,
        ),
    }
}

/// Inverse of [`to_scene_position`]. The map-mode `z` component is ignored.
///
/// The zero vector has no direction on the globe and maps to `(0, 0)`.
pub fn to_geo(position: Vec3, mode: ProjectionMode, params: &ProjectionParams) -> LatLng {
    match mode {
        ProjectionMode::Globe => {
            let Some(n) = position.normalize() else {
                return LatLng::default();
            };
            let lat = 90.0 - n.y.clamp(-1.0, 1.0).acos() * 180.0 / PI;
            let theta = n.z.atan2(-n.x);
            let mut lng = theta * 180.0 / PI;
            if lng < 0.0 {
                lng += 360.0;
            }
            if lng >= 360.0 {
                lng -= 360.0;
            }
            LatLng::new(lat, lng - 180.0)
        }
        ProjectionMode::Map => LatLng::new(
            (position.y / params.half_height()) * 90.0,
            (position.x / params.half_width()) * 180.0,
        ),
    }
}
