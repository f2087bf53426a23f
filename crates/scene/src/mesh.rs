//! CPU-side mesh generation for the surfaces, markers and star field.
//!
//! Vertex layouts match the usual UV-sphere and plane conventions so an
//! equirectangular texture lines up with `to_scene_position`: texture `u`
//! runs west to east from longitude -180, `v` runs north to south.

use core::f64::consts::PI;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Points,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        match self.topology {
            Topology::Triangles => self.indices.len() / 3,
            Topology::Points => 0,
        }
    }
}

/// Sphere with `width_segments` around the equator and `height_segments` from
/// pole to pole. The seam sits at longitude -180.
pub fn uv_sphere(radius: f64, width_segments: u32, height_segments: u32) -> MeshData {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);
    let row = ws + 1;

    let mut positions = Vec::with_capacity(((hs + 1) * row) as usize);
    let mut normals = Vec::with_capacity(positions.capacity());
    let mut uvs = Vec::with_capacity(positions.capacity());

    for iy in 0..=hs {
        let v = iy as f64 / hs as f64;
        let polar = v * PI;
        // Pole rows get a half-step u offset so the texture does not pinch.
        let u_offset = if iy == 0 {
            0.5 / ws as f64
        } else if iy == hs {
            -0.5 / ws as f64
        } else {
            0.0
        };
        for ix in 0..=ws {
            let u = ix as f64 / ws as f64;
            let azimuth = u * 2.0 * PI;
            let n = [
                -azimuth.cos() * polar.sin(),
                polar.cos(),
                azimuth.sin() * polar.sin(),
            ];
            positions.push([
                (radius * n[0]) as f32,
                (radius * n[1]) as f32,
                (radius * n[2]) as f32,
            ]);
            normals.push([n[0] as f32, n[1] as f32, n[2] as f32]);
            uvs.push([(u + u_offset) as f32, (1.0 - v) as f32]);
        }
    }

    let mut indices = Vec::with_capacity((ws * hs * 6) as usize);
    for iy in 0..hs {
        for ix in 0..ws {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != hs - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    MeshData {
        positions,
        normals,
        uvs,
        indices,
        topology: Topology::Triangles,
    }
}

/// Rectangle in the z = 0 plane, centred on the origin, facing +Z.
pub fn plane(width: f64, height: f64) -> MeshData {
    let hw = (width * 0.5) as f32;
    let hh = (height * 0.5) as f32;
    MeshData {
        positions: vec![[-hw, hh, 0.0], [hw, hh, 0.0], [-hw, -hh, 0.0], [hw, -hh, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 4],
        uvs: vec![[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]],
        indices: vec![0, 2, 1, 2, 3, 1],
        topology: Topology::Triangles,
    }
}

/// Box the star field is scattered through.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StarFieldBounds {
    /// x and y are drawn from `[-half_extent, half_extent]`.
    pub half_extent: f64,
    /// z is drawn from `[-depth, 0]`.
    pub depth: f64,
}

impl Default for StarFieldBounds {
    fn default() -> Self {
        Self {
            half_extent: 1000.0,
            depth: 2000.0,
        }
    }
}

/// Deterministic point cloud: the same `seed` always yields the same stars.
pub fn star_field(count: u32, bounds: StarFieldBounds, seed: u32) -> MeshData {
    let mut positions = Vec::with_capacity(count as usize);
    for i in 0..count {
        let base = seed.wrapping_add(i.wrapping_mul(3));
        let x = (unit(base) * 2.0 - 1.0) * bounds.half_extent;
        let y = (unit(base.wrapping_add(1)) * 2.0 - 1.0) * bounds.half_extent;
        let z = -unit(base.wrapping_add(2)) * bounds.depth;
        positions.push([x as f32, y as f32, z as f32]);
    }
    MeshData {
        positions,
        normals: Vec::new(),
        uvs: Vec::new(),
        indices: Vec::new(),
        topology: Topology::Points,
    }
}

fn hash_u32(x_in: u32) -> u32 {
    let mut x = x_in;
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

fn unit(x: u32) -> f64 {
    hash_u32(x) as f64 / u32::MAX as f64
}
