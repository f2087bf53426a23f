use foundation::math::Vec3;
use scene::components::{MeshBinding, Transform};
use scene::entity::NodeId;
use scene::picking::Ray;
use scene::{NodeKind, SceneGraph};

/// Perspective camera looking from `position` at `target`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera3D {
    pub fn look_at(position: Vec3, target: Vec3, fov_y_rad: f64, near: f64, far: f64) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            fov_y_rad,
            aspect: 1.0,
            near,
            far,
        }
    }

    /// Width over height. Non-positive or non-finite values are ignored.
    pub fn set_aspect(&mut self, aspect: f64) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// `(forward, right, up)` unit vectors, or `None` if the eye sits on the
    /// target or looks straight along `up`.
    pub fn basis(&self) -> Option<(Vec3, Vec3, Vec3)> {
        let f = (self.target - self.position).normalize()?;
        let s = f.cross(self.up).normalize()?;
        let u = s.cross(f);
        Some((f, s, u))
    }

    /// World-space ray from the eye through normalized device coordinates
    /// (`[-1, 1]` on both axes, +Y up).
    pub fn ray_through_ndc(&self, ndc_x: f64, ndc_y: f64) -> Option<Ray> {
        let (f, s, u) = self.basis()?;
        let t = (0.5 * self.fov_y_rad).tan();
        let dir = f + s * (ndc_x * t * self.aspect) + u * (ndc_y * t);
        Some(Ray::new(self.position, dir.normalize()?))
    }

    pub fn view_matrix(&self) -> [[f32; 4]; 4] {
        mat4_look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_proj(&self) -> [[f32; 4]; 4] {
        let proj = mat4_perspective_rh_z0(self.fov_y_rad, self.aspect, self.near, self.far);
        mat4_mul(proj, self.view_matrix())
    }
}

/// Scene lighting, gathered from the graph's light nodes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub directional: f32,
    /// Direction towards the directional light.
    pub direction: [f32; 3],
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.0,
            directional: 0.0,
            direction: [0.0, 1.0, 0.0],
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderCommand {
    pub node: NodeId,
    pub world: Transform,
    pub mesh: MeshBinding,
}

impl RenderCommand {
    pub fn model_matrix(&self) -> [[f32; 4]; 4] {
        model_matrix(self.world)
    }
}

#[derive(Debug, Default)]
pub struct RenderFrame {
    pub commands: Vec<RenderCommand>,
    pub lighting: Lighting,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DrawStats {
    pub draw_calls: u32,
    pub triangles: u64,
    pub points: u64,
}

pub struct Renderer;

impl Renderer {
    /// Draw list for one frame, background first and additive passes last.
    pub fn collect(graph: &SceneGraph) -> RenderFrame {
        let mut frame = RenderFrame::default();
        for r in graph.renderables() {
            frame.commands.push(RenderCommand {
                node: r.node,
                world: r.world,
                mesh: r.mesh,
            });
        }

        for root in graph.roots() {
            if !graph.is_visible(*root) {
                continue;
            }
            match graph.kind(*root) {
                Some(NodeKind::AmbientLight { intensity_milli }) => {
                    frame.lighting.ambient += intensity_milli as f32 / 1000.0;
                }
                Some(NodeKind::DirectionalLight { intensity_milli }) => {
                    frame.lighting.directional += intensity_milli as f32 / 1000.0;
                    let pos = graph
                        .world_transform(*root)
                        .map(|t| t.position)
                        .unwrap_or(Vec3::Y);
                    if let Some(dir) = pos.normalize() {
                        frame.lighting.direction = dir.as_f32();
                    }
                }
                _ => {}
            }
        }
        frame
    }
}

pub fn model_matrix(t: Transform) -> [[f32; 4]; 4] {
    let (s, c) = t.rotation_z.sin_cos();
    [
        [c as f32, s as f32, 0.0, 0.0],
        [-s as f32, c as f32, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [t.position.x as f32, t.position.y as f32, t.position.z as f32, 1.0],
    ]
}

// Column-major helpers.

pub fn mat4_mul(a: [[f32; 4]; 4], b: [[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut c = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            c[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }
    c
}

pub fn mat4_mul_vec4(m: [[f32; 4]; 4], v: [f32; 4]) -> [f32; 4] {
    let mut out = [0.0f32; 4];
    for (row, o) in out.iter_mut().enumerate() {
        *o = m[0][row] * v[0] + m[1][row] * v[1] + m[2][row] * v[2] + m[3][row] * v[3];
    }
    out
}

fn mat4_perspective_rh_z0(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> [[f32; 4]; 4] {
    let f = 1.0 / (0.5 * fov_y_rad).tan();
    let m00 = (f / aspect) as f32;
    let m11 = f as f32;
    let m22 = (far / (near - far)) as f32;
    let m23 = ((near * far) / (near - far)) as f32;

    [
        [m00, 0.0, 0.0, 0.0],
        [0.0, m11, 0.0, 0.0],
        [0.0, 0.0, m22, -1.0],
        [0.0, 0.0, m23, 0.0],
    ]
}

fn mat4_look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> [[f32; 4]; 4] {
    let Some(f) = (target - eye).normalize() else {
        return IDENTITY;
    };
    let Some(s) = f.cross(up).normalize() else {
        return IDENTITY;
    };
    let u = s.cross(f);

    let ex = -s.dot(eye);
    let ey = -u.dot(eye);
    let ez = f.dot(eye);

    [
        [s.x as f32, u.x as f32, (-f.x) as f32, 0.0],
        [s.y as f32, u.y as f32, (-f.y) as f32, 0.0],
        [s.z as f32, u.z as f32, (-f.z) as f32, 0.0],
        [ex as f32, ey as f32, ez as f32, 1.0],
    ]
}

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];
