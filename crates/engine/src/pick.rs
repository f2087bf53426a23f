//! Pointer position to geographic coordinate, by casting a camera ray at the
//! surface.

use foundation::geo::LatLng;
use foundation::math::Vec2;
use foundation::math::projection::{ProjectionMode, ProjectionParams, to_geo};
use gpu::Camera3D;
use scene::SceneGraph;
use scene::entity::NodeId;
use scene::picking::pick_node;
use tracing::trace;

use crate::scene::Viewport;

/// Client-space rectangle of the drawing surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ContainerRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Full-window rectangle for a viewport at the origin.
    pub fn from_viewport(viewport: Viewport) -> Self {
        Self::new(0.0, 0.0, viewport.width as f64, viewport.height as f64)
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Normalized device coordinates of `pointer`, +Y up.
pub fn pointer_to_ndc(pointer: Vec2, rect: &ContainerRect) -> Option<Vec2> {
    if rect.is_degenerate() {
        return None;
    }
    Some(Vec2::new(
        (pointer.x - rect.left) / rect.width * 2.0 - 1.0,
        -(pointer.y - rect.top) / rect.height * 2.0 + 1.0,
    ))
}

/// Geographic coordinate under `pointer`, or `None` on a miss.
///
/// Only `surface` is tested; markers, atmosphere and stars never block a
/// pick. The hit is converted in the surface's local frame, so a spun map
/// still reports the coordinate drawn under the cursor.
pub fn resolve_click(
    graph: &SceneGraph,
    camera: &Camera3D,
    surface: NodeId,
    pointer: Vec2,
    rect: &ContainerRect,
    mode: ProjectionMode,
    params: &ProjectionParams,
) -> Option<LatLng> {
    let ndc = pointer_to_ndc(pointer, rect)?;
    let mut camera = *camera;
    camera.set_aspect(rect.width / rect.height);
    let ray = camera.ray_through_ndc(ndc.x, ndc.y)?;
    let hit = pick_node(graph, surface, ray)?;
    let geo = to_geo(hit.local_point, mode, params);
    trace!(?ndc, distance = hit.distance, lat = geo.lat, lng = geo.lng, "surface hit");
    Some(geo)
}
