//! Orbit camera rig with damping, auto-rotate, pan and dolly.
//!
//! The rig keeps the eye on a sphere around a target point. Input only
//! accumulates deltas; [`OrbitRig::update`] applies a fraction of them each
//! frame and decays the rest, which gives the eased glide after a drag.

use core::f64::consts::PI;

use foundation::math::Vec3;
use foundation::math::projection::ProjectionMode;
use tracing::debug;

use crate::config::CameraConfig;

/// Zoom factor per wheel notch.
const DOLLY_STEP: f64 = 0.95;

/// Keeps the polar angle off the poles so the view basis stays defined.
const POLAR_EPS: f64 = 1e-6;

/// Deltas below this are treated as settled.
const SETTLE_EPS: f64 = 1e-9;

/// Per-mode distance range and enabled manipulations.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RigLimits {
    pub min_distance: f64,
    pub max_distance: f64,
    pub enable_rotate: bool,
    pub enable_pan: bool,
}

impl RigLimits {
    pub fn for_mode(mode: ProjectionMode) -> Self {
        match mode {
            ProjectionMode::Globe => Self {
                min_distance: 8.0,
                max_distance: 50.0,
                enable_rotate: true,
                enable_pan: false,
            },
            ProjectionMode::Map => Self {
                min_distance: 5.0,
                max_distance: 30.0,
                enable_rotate: false,
                enable_pan: true,
            },
        }
    }
}

/// Radius, azimuth around +Y (`theta`, measured from +Z) and polar angle from +Y (`phi`).
#[derive(Debug, Copy, Clone, PartialEq)]
struct Spherical {
    radius: f64,
    theta: f64,
    phi: f64,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self {
                radius: 0.0,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct OrbitRig {
    target: Vec3,
    eye: Vec3,
    limits: RigLimits,
    damping_factor: f64,
    auto_rotate_speed: f64,
    auto_rotate: bool,
    fov_y_rad: f64,

    delta_theta: f64,
    delta_phi: f64,
    pan_offset: Vec3,
    scale: f64,
}

impl OrbitRig {
    pub fn new(eye: Vec3, target: Vec3, limits: RigLimits, config: &CameraConfig) -> Self {
        let mut rig = Self {
            target,
            eye,
            limits,
            damping_factor: config.damping_factor,
            auto_rotate_speed: config.auto_rotate_speed,
            auto_rotate: false,
            fov_y_rad: config.fov_deg.to_radians(),
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        };
        // Pull the start position into range.
        rig.update();
        rig
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f64 {
        (self.eye - self.target).length()
    }

    pub fn limits(&self) -> RigLimits {
        self.limits
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
    }

    /// Orbits by a pixel drag; a full viewport height is one full turn.
    pub fn rotate(&mut self, dx_px: f64, dy_px: f64, viewport_height: f64) {
        if !self.limits.enable_rotate || viewport_height <= 0.0 {
            return;
        }
        self.delta_theta -= 2.0 * PI * dx_px / viewport_height;
        self.delta_phi -= 2.0 * PI * dy_px / viewport_height;
    }

    /// Slides target and eye so the drag tracks the cursor at the target depth.
    pub fn pan(&mut self, dx_px: f64, dy_px: f64, viewport_height: f64) {
        if !self.limits.enable_pan || viewport_height <= 0.0 {
            return;
        }
        let offset = self.eye - self.target;
        let Some(forward) = (-offset).normalize() else {
            return;
        };
        let Some(right) = forward.cross(Vec3::Y).normalize() else {
            return;
        };
        let up = right.cross(forward);
        let target_distance = offset.length() * (0.5 * self.fov_y_rad).tan();
        let left = 2.0 * dx_px * target_distance / viewport_height;
        let upward = 2.0 * dy_px * target_distance / viewport_height;
        self.pan_offset += right * -left;
        self.pan_offset += up * upward;
    }

    /// Wheel zoom. Negative `delta_y` (scroll up) moves closer.
    pub fn dolly(&mut self, delta_y: f64) {
        if delta_y < 0.0 {
            self.scale *= DOLLY_STEP;
        } else if delta_y > 0.0 {
            self.scale /= DOLLY_STEP;
        }
    }

    fn auto_rotate_angle(&self) -> f64 {
        2.0 * PI / 60.0 / 60.0 * self.auto_rotate_speed
    }

    /// Advances one frame. Returns `true` if the eye moved.
    pub fn update(&mut self) -> bool {
        let before = self.eye;
        let offset = self.eye - self.target;
        let mut spherical = Spherical::from_offset(offset);

        if self.auto_rotate && self.limits.enable_rotate {
            self.delta_theta -= self.auto_rotate_angle();
        }

        let df = self.damping_factor;
        spherical.theta += self.delta_theta * df;
        spherical.phi += self.delta_phi * df;
        spherical.phi = spherical.phi.clamp(POLAR_EPS, PI - POLAR_EPS);

        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.limits.min_distance, self.limits.max_distance);

        self.target += self.pan_offset * df;
        self.eye = self.target + spherical.to_offset();

        self.delta_theta *= 1.0 - df;
        self.delta_phi *= 1.0 - df;
        self.pan_offset = self.pan_offset * (1.0 - df);
        if self.delta_theta.abs() < SETTLE_EPS {
            self.delta_theta = 0.0;
        }
        if self.delta_phi.abs() < SETTLE_EPS {
            self.delta_phi = 0.0;
        }
        if self.pan_offset.length() < SETTLE_EPS {
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        (self.eye - before).length() > SETTLE_EPS
    }

    /// Drops pending motion; the rig is not used after this.
    pub fn dispose(self) {
        debug!(eye = ?self.eye, "orbit rig disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::{OrbitRig, RigLimits};
    use crate::config::CameraConfig;
    use foundation::math::Vec3;
    use foundation::math::projection::ProjectionMode;

    fn globe_rig() -> OrbitRig {
        OrbitRig::new(
            Vec3::new(0.0, 5.0, 20.0),
            Vec3::ZERO,
            RigLimits::for_mode(ProjectionMode::Globe),
            &CameraConfig::default(),
        )
    }

    fn map_rig() -> OrbitRig {
        OrbitRig::new(
            Vec3::new(0.0, 0.0, 15.0),
            Vec3::ZERO,
            RigLimits::for_mode(ProjectionMode::Map),
            &CameraConfig::default(),
        )
    }

    #[test]
    fn mode_limits_table() {
        let g = RigLimits::for_mode(ProjectionMode::Globe);
        assert_eq!((g.min_distance, g.max_distance), (8.0, 50.0));
        assert!(g.enable_rotate && !g.enable_pan);
        let m = RigLimits::for_mode(ProjectionMode::Map);
        assert_eq!((m.min_distance, m.max_distance), (5.0, 30.0));
        assert!(!m.enable_rotate && m.enable_pan);
    }

    #[test]
    fn start_position_is_kept_when_in_range() {
        let rig = globe_rig();
        assert!((rig.eye() - Vec3::new(0.0, 5.0, 20.0)).length() < 1e-9);
    }

    #[test]
    fn start_position_is_clamped_into_range() {
        let rig = OrbitRig::new(
            Vec3::new(0.0, 0.0, 100.0),
            Vec3::ZERO,
            RigLimits::for_mode(ProjectionMode::Globe),
            &CameraConfig::default(),
        );
        assert!((rig.distance() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn damping_eases_rotation() {
        let mut rig = globe_rig();
        rig.rotate(100.0, 0.0, 600.0);
        assert!(rig.update());
        let first = rig.eye();
        rig.update();
        let second = rig.eye();
        // Still moving after the first frame, with a smaller step.
        let step1 = (first - Vec3::new(0.0, 5.0, 20.0)).length();
        let step2 = (second - first).length();
        assert!(step2 > 0.0 && step2 < step1);
        for _ in 0..2000 {
            rig.update();
        }
        assert!(!rig.update());
    }

    #[test]
    fn distance_clamped_by_dolly() {
        let mut rig = globe_rig();
        for _ in 0..200 {
            rig.dolly(-1.0);
            rig.update();
        }
        assert!((rig.distance() - 8.0).abs() < 1e-9);
        for _ in 0..200 {
            rig.dolly(1.0);
            rig.update();
        }
        assert!((rig.distance() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn map_ignores_rotation_but_pans() {
        let mut rig = map_rig();
        rig.rotate(200.0, 50.0, 600.0);
        assert!(!rig.update());

        rig.pan(60.0, 0.0, 600.0);
        for _ in 0..500 {
            rig.update();
        }
        // Dragging right slides the view left: target moves towards -x.
        assert!(rig.target().x < 0.0);
        assert!(rig.target().y.abs() < 1e-9);
        assert!((rig.eye() - rig.target() - Vec3::new(0.0, 0.0, 15.0)).length() < 1e-6);
    }

    #[test]
    fn globe_does_not_pan() {
        let mut rig = globe_rig();
        rig.pan(60.0, 10.0, 600.0);
        rig.update();
        assert_eq!(rig.target(), Vec3::ZERO);
    }

    #[test]
    fn auto_rotate_spins_globe_only() {
        let mut globe = globe_rig();
        globe.set_auto_rotate(true);
        assert!(globe.update());
        let mut map = map_rig();
        map.set_auto_rotate(true);
        assert!(!map.update());
    }

    #[test]
    fn polar_angle_stays_off_the_pole() {
        let mut rig = globe_rig();
        rig.rotate(0.0, 10_000.0, 600.0);
        for _ in 0..500 {
            rig.update();
        }
        let offset = rig.eye() - rig.target();
        assert!(offset.x.abs() + offset.z.abs() > 0.0);
        assert!(offset.y > 0.0);
    }
}
