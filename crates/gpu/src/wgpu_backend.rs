//! Offscreen wgpu implementation of [`GraphicsBackend`].
//!
//! Draws into a private colour + depth target sized by [`GraphicsBackend::resize`].
//! One pipeline per shading model; per-draw data lives in a small uniform
//! buffer rebuilt every frame.

use std::borrow::Cow;
use std::collections::HashMap;

use ::wgpu::util::DeviceExt;
use foundation::ids::{GeometryId, IdAllocator, MaterialId, ResourceId, TextureId};
use scene::mesh::{MeshData, Topology};
use tracing::{debug, info};

use crate::backend::{BackendError, GraphicsBackend, MaterialDesc, TextureImage};
use crate::renderer::{Camera3D, DrawStats, RenderFrame};

const COLOR_FORMAT: ::wgpu::TextureFormat = ::wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: ::wgpu::TextureFormat = ::wgpu::TextureFormat::Depth24Plus;

const SURFACE_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    light_dir: vec4<f32>,
    ambient: vec4<f32>,
};

struct Draw {
    model: mat4x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
@group(1) @binding(0) var<uniform> draw: Draw;
@group(2) @binding(0) var albedo: texture_2d<f32>;
@group(2) @binding(1) var albedo_sampler: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
) -> VsOut {
    let world = draw.model * vec4<f32>(position, 1.0);
    let n = (draw.model * vec4<f32>(normal, 0.0)).xyz;
    return VsOut(globals.view_proj * world, n, uv);
}

@fragment
fn fs_main(in: VsOut, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var n = normalize(in.normal);
    if (!front) {
        n = -n;
    }
    let l = normalize(globals.light_dir.xyz);
    let ndotl = max(dot(n, l), 0.0);
    let base = textureSample(albedo, albedo_sampler, in.uv).rgb * draw.color.rgb;
    // params: x = roughness, y = metalness.
    let diffuse = globals.light_dir.w * ndotl * (1.0 - draw.params.y);
    let spec = globals.light_dir.w * pow(ndotl, 16.0) * (1.0 - draw.params.x) * 0.25;
    return vec4<f32>(base * (globals.ambient.x + diffuse) + vec3<f32>(spec), 1.0);
}
"#;

const ATMOSPHERE_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    light_dir: vec4<f32>,
    ambient: vec4<f32>,
};

struct Draw {
    model: mat4x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
@group(1) @binding(0) var<uniform> draw: Draw;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) view_normal: vec3<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
) -> VsOut {
    let world = draw.model * vec4<f32>(position, 1.0);
    let vn = (globals.view * draw.model * vec4<f32>(normal, 0.0)).xyz;
    return VsOut(globals.view_proj * world, vn);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    // params: x = falloff, y = power.
    let facing = dot(normalize(in.view_normal), vec3<f32>(0.0, 0.0, 1.0));
    let intensity = pow(max(draw.params.x - facing, 0.0), draw.params.y);
    return vec4<f32>(draw.color.rgb * intensity, 1.0);
}
"#;

const FLAT_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    light_dir: vec4<f32>,
    ambient: vec4<f32>,
};

struct Draw {
    model: mat4x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
@group(1) @binding(0) var<uniform> draw: Draw;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) normal: vec3<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
) -> VsOut {
    let world = draw.model * vec4<f32>(position, 1.0);
    let n = (draw.model * vec4<f32>(normal, 0.0)).xyz;
    return VsOut(globals.view_proj * world, n);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    // params.z = 1 for lit geometry; points carry no normals.
    let l = normalize(globals.light_dir.xyz);
    let ndotl = max(dot(normalize(in.normal + vec3<f32>(1e-6)), l), 0.0);
    let lit = globals.ambient.x + globals.light_dir.w * ndotl;
    let shade = mix(1.0, lit, draw.params.z);
    return vec4<f32>(draw.color.rgb * shade, draw.color.a);
}
"#;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    light_dir: [f32; 4],
    ambient: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum PipelineKind {
    Surface,
    SurfaceDoubleSided,
    Atmosphere,
    Marker,
    Stars,
}

struct GpuGeometry {
    vertex_buffer: ::wgpu::Buffer,
    index_buffer: Option<::wgpu::Buffer>,
    count: u32,
    topology: Topology,
}

struct GpuMaterial {
    desc: MaterialDesc,
    texture_bind_group: Option<::wgpu::BindGroup>,
}

struct GpuTexture {
    texture: ::wgpu::Texture,
    view: ::wgpu::TextureView,
}

struct Target {
    _color: ::wgpu::Texture,
    color_view: ::wgpu::TextureView,
    depth_view: ::wgpu::TextureView,
}

pub struct WgpuBackend {
    device: ::wgpu::Device,
    queue: ::wgpu::Queue,
    target: Target,
    size: (u32, u32),
    globals_buffer: ::wgpu::Buffer,
    globals_bind_group: ::wgpu::BindGroup,
    draw_layout: ::wgpu::BindGroupLayout,
    texture_layout: ::wgpu::BindGroupLayout,
    sampler: ::wgpu::Sampler,
    fallback_texture: GpuTexture,
    fallback_bind_group: ::wgpu::BindGroup,
    pipelines: HashMap<PipelineKind, ::wgpu::RenderPipeline>,
    ids: IdAllocator,
    geometries: HashMap<GeometryId, GpuGeometry>,
    materials: HashMap<MaterialId, GpuMaterial>,
    textures: HashMap<TextureId, GpuTexture>,
    disposed: bool,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("size", &self.size)
            .field("geometries", &self.geometries.len())
            .field("materials", &self.materials.len())
            .field("textures", &self.textures.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl WgpuBackend {
    /// Creates a device on the default adapter with an offscreen target.
    pub fn new(width: u32, height: u32) -> Result<Self, BackendError> {
        pollster::block_on(Self::new_async(width, height))
    }

    pub async fn new_async(width: u32, height: u32) -> Result<Self, BackendError> {
        let instance = ::wgpu::Instance::new(&::wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&::wgpu::RequestAdapterOptions {
                power_preference: ::wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| BackendError::Device(format!("adapter error: {e}")))?;

        let (device, queue) = adapter
            .request_device(&::wgpu::DeviceDescriptor {
                label: Some("globe-device"),
                required_features: ::wgpu::Features::empty(),
                required_limits: ::wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .map_err(|e| BackendError::Device(format!("device error: {e}")))?;
        info!(adapter = ?adapter.get_info().name, "wgpu device ready");

        let size = (width.max(1), height.max(1));
        let target = create_target(&device, size);

        let globals_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("globe-globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_layout = uniform_layout(&device, "globe-globals-bgl");
        let draw_layout = uniform_layout(&device, "globe-draw-bgl");
        let texture_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-texture-bgl"),
            entries: &[
                ::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ::wgpu::ShaderStages::FRAGMENT,
                    ty: ::wgpu::BindingType::Texture {
                        sample_type: ::wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: ::wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                ::wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ::wgpu::ShaderStages::FRAGMENT,
                    ty: ::wgpu::BindingType::Sampler(::wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let globals_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("globe-globals-bg"),
            layout: &globals_layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&::wgpu::SamplerDescriptor {
            label: Some("globe-sampler"),
            address_mode_u: ::wgpu::AddressMode::Repeat,
            mag_filter: ::wgpu::FilterMode::Linear,
            min_filter: ::wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let fallback_texture = upload_texture(&device, &queue, &TextureImage::solid(1, 1, [255; 4]));
        let fallback_bind_group =
            texture_bind_group(&device, &texture_layout, &fallback_texture.view, &sampler);

        let lit_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some("globe-surface-pipeline-layout"),
            bind_group_layouts: &[&globals_layout, &draw_layout, &texture_layout],
            immediate_size: 0,
        });
        let plain_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some("globe-plain-pipeline-layout"),
            bind_group_layouts: &[&globals_layout, &draw_layout],
            immediate_size: 0,
        });

        let surface_shader = shader(&device, "globe-surface-shader", SURFACE_SHADER);
        let atmosphere_shader = shader(&device, "globe-atmosphere-shader", ATMOSPHERE_SHADER);
        let flat_shader = shader(&device, "globe-flat-shader", FLAT_SHADER);

        let additive = ::wgpu::BlendState {
            color: ::wgpu::BlendComponent {
                src_factor: ::wgpu::BlendFactor::One,
                dst_factor: ::wgpu::BlendFactor::One,
                operation: ::wgpu::BlendOperation::Add,
            },
            alpha: ::wgpu::BlendComponent {
                src_factor: ::wgpu::BlendFactor::One,
                dst_factor: ::wgpu::BlendFactor::One,
                operation: ::wgpu::BlendOperation::Add,
            },
        };

        let mut pipelines = HashMap::new();
        pipelines.insert(
            PipelineKind::Surface,
            pipeline(&device, PipelineSpec {
                label: "globe-surface-pipeline",
                layout: &lit_layout,
                shader: &surface_shader,
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(::wgpu::Face::Back),
                blend: ::wgpu::BlendState::REPLACE,
                depth_write: true,
            }),
        );
        pipelines.insert(
            PipelineKind::SurfaceDoubleSided,
            pipeline(&device, PipelineSpec {
                label: "globe-plane-pipeline",
                layout: &lit_layout,
                shader: &surface_shader,
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                blend: ::wgpu::BlendState::REPLACE,
                depth_write: true,
            }),
        );
        pipelines.insert(
            PipelineKind::Atmosphere,
            pipeline(&device, PipelineSpec {
                label: "globe-atmosphere-pipeline",
                layout: &plain_layout,
                shader: &atmosphere_shader,
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(::wgpu::Face::Front),
                blend: additive,
                depth_write: false,
            }),
        );
        pipelines.insert(
            PipelineKind::Marker,
            pipeline(&device, PipelineSpec {
                label: "globe-marker-pipeline",
                layout: &plain_layout,
                shader: &flat_shader,
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(::wgpu::Face::Back),
                blend: ::wgpu::BlendState::REPLACE,
                depth_write: true,
            }),
        );
        pipelines.insert(
            PipelineKind::Stars,
            pipeline(&device, PipelineSpec {
                label: "globe-stars-pipeline",
                layout: &plain_layout,
                shader: &flat_shader,
                topology: ::wgpu::PrimitiveTopology::PointList,
                cull_mode: None,
                blend: ::wgpu::BlendState::ALPHA_BLENDING,
                depth_write: false,
            }),
        );

        Ok(Self {
            device,
            queue,
            target,
            size,
            globals_buffer,
            globals_bind_group,
            draw_layout,
            texture_layout,
            sampler,
            fallback_texture,
            fallback_bind_group,
            pipelines,
            ids: IdAllocator::new(),
            geometries: HashMap::new(),
            materials: HashMap::new(),
            textures: HashMap::new(),
            disposed: false,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    fn ensure_live(&self) -> Result<(), BackendError> {
        if self.disposed {
            Err(BackendError::Disposed)
        } else {
            Ok(())
        }
    }
}

impl GraphicsBackend for WgpuBackend {
    fn create_geometry(&mut self, mesh: &MeshData) -> Result<GeometryId, BackendError> {
        self.ensure_live()?;
        let vertices: Vec<Vertex> = mesh
            .positions
            .iter()
            .enumerate()
            .map(|(i, p)| Vertex {
                position: *p,
                normal: mesh.normals.get(i).copied().unwrap_or([0.0; 3]),
                uv: mesh.uvs.get(i).copied().unwrap_or([0.0; 2]),
            })
            .collect();
        let vertex_buffer = self
            .device
            .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some("globe-vertices"),
                contents: bytemuck::cast_slice(&vertices),
                usage: ::wgpu::BufferUsages::VERTEX,
            });
        let (index_buffer, count) = if mesh.indices.is_empty() {
            (None, vertices.len() as u32)
        } else {
            let buffer = self
                .device
                .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                    label: Some("globe-indices"),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: ::wgpu::BufferUsages::INDEX,
                });
            (Some(buffer), mesh.indices.len() as u32)
        };

        let id = GeometryId(self.ids.next_raw());
        self.geometries.insert(
            id,
            GpuGeometry {
                vertex_buffer,
                index_buffer,
                count,
                topology: mesh.topology,
            },
        );
        Ok(id)
    }

    fn create_material(&mut self, desc: &MaterialDesc) -> Result<MaterialId, BackendError> {
        self.ensure_live()?;
        let id = MaterialId(self.ids.next_raw());
        self.materials.insert(
            id,
            GpuMaterial {
                desc: *desc,
                texture_bind_group: None,
            },
        );
        Ok(id)
    }

    fn create_texture(&mut self, image: &TextureImage) -> Result<TextureId, BackendError> {
        self.ensure_live()?;
        let texture = upload_texture(&self.device, &self.queue, image);
        let id = TextureId(self.ids.next_raw());
        self.textures.insert(id, texture);
        Ok(id)
    }

    fn bind_texture(&mut self, material: MaterialId, texture: TextureId) -> Result<(), BackendError> {
        self.ensure_live()?;
        let tex = self
            .textures
            .get(&texture)
            .ok_or(BackendError::UnknownResource(ResourceId::Texture(texture)))?;
        let bind_group = texture_bind_group(&self.device, &self.texture_layout, &tex.view, &self.sampler);
        let mat = self
            .materials
            .get_mut(&material)
            .ok_or(BackendError::UnknownResource(ResourceId::Material(material)))?;
        mat.texture_bind_group = Some(bind_group);
        Ok(())
    }

    fn release(&mut self, id: ResourceId) -> Result<(), BackendError> {
        let found = match id {
            ResourceId::Geometry(g) => self.geometries.remove(&g).map(|geom| {
                geom.vertex_buffer.destroy();
                if let Some(index) = geom.index_buffer {
                    index.destroy();
                }
            }),
            ResourceId::Material(m) => self.materials.remove(&m).map(|_| ()),
            ResourceId::Texture(t) => self.textures.remove(&t).map(|tex| tex.texture.destroy()),
        };
        found.ok_or(BackendError::UnknownResource(id))
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.disposed {
            return;
        }
        let size = (width.max(1), height.max(1));
        if size == self.size {
            return;
        }
        debug!(width = size.0, height = size.1, "resizing offscreen target");
        self.size = size;
        self.target = create_target(&self.device, size);
    }

    fn render(&mut self, camera: &Camera3D, frame: &RenderFrame) -> Result<DrawStats, BackendError> {
        self.ensure_live()?;
        let l = frame.lighting;
        let globals = Globals {
            view_proj: camera.view_proj(),
            view: camera.view_matrix(),
            light_dir: [l.direction[0], l.direction[1], l.direction[2], l.directional],
            ambient: [l.ambient, 0.0, 0.0, 0.0],
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        struct Prepared<'a> {
            pipeline: &'a ::wgpu::RenderPipeline,
            geometry: &'a GpuGeometry,
            draw_bind_group: ::wgpu::BindGroup,
            texture_bind_group: Option<&'a ::wgpu::BindGroup>,
        }

        let mut stats = DrawStats::default();
        let mut prepared = Vec::with_capacity(frame.commands.len());
        for cmd in &frame.commands {
            let geometry = self
                .geometries
                .get(&cmd.mesh.geometry)
                .ok_or(BackendError::UnknownResource(ResourceId::Geometry(cmd.mesh.geometry)))?;
            let material = self
                .materials
                .get(&cmd.mesh.material)
                .ok_or(BackendError::UnknownResource(ResourceId::Material(cmd.mesh.material)))?;

            let (kind, color, params) = match material.desc {
                MaterialDesc::Surface {
                    color,
                    roughness,
                    metalness,
                    double_sided,
                } => (
                    if double_sided {
                        PipelineKind::SurfaceDoubleSided
                    } else {
                        PipelineKind::Surface
                    },
                    [color[0], color[1], color[2], 1.0],
                    [roughness, metalness, 1.0, 0.0],
                ),
                MaterialDesc::Atmosphere { color, falloff, power } => (
                    PipelineKind::Atmosphere,
                    [color[0], color[1], color[2], 1.0],
                    [falloff, power, 0.0, 0.0],
                ),
                MaterialDesc::Marker { color } => (
                    PipelineKind::Marker,
                    [color[0], color[1], color[2], 1.0],
                    [0.0, 0.0, 1.0, 0.0],
                ),
                // Point size is fixed at one pixel on wgpu.
                MaterialDesc::Stars { color, .. } => (
                    PipelineKind::Stars,
                    [color[0], color[1], color[2], 1.0],
                    [0.0, 0.0, 0.0, 0.0],
                ),
            };
            let Some(pipeline) = self.pipelines.get(&kind) else {
                continue;
            };

            let uniforms = DrawUniforms {
                model: cmd.model_matrix(),
                color,
                params,
            };
            let buffer = self
                .device
                .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                    label: Some("globe-draw"),
                    contents: bytemuck::bytes_of(&uniforms),
                    usage: ::wgpu::BufferUsages::UNIFORM,
                });
            let draw_bind_group = self.device.create_bind_group(&::wgpu::BindGroupDescriptor {
                label: Some("globe-draw-bg"),
                layout: &self.draw_layout,
                entries: &[::wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            let texture_bind_group = match kind {
                PipelineKind::Surface | PipelineKind::SurfaceDoubleSided => Some(
                    material
                        .texture_bind_group
                        .as_ref()
                        .unwrap_or(&self.fallback_bind_group),
                ),
                _ => None,
            };

            match geometry.topology {
                Topology::Triangles => stats.triangles += u64::from(geometry.count / 3),
                Topology::Points => stats.points += u64::from(geometry.count),
            }
            stats.draw_calls += 1;
            prepared.push(Prepared {
                pipeline,
                geometry,
                draw_bind_group,
                texture_bind_group,
            });
        }

        let mut encoder = self
            .device
            .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                label: Some("globe-frame-encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                label: Some("globe-frame-pass"),
                color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                    view: &self.target.color_view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: ::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(::wgpu::Color::BLACK),
                        store: ::wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                    view: &self.target.depth_view,
                    depth_ops: Some(::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(1.0),
                        store: ::wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            rpass.set_bind_group(0, &self.globals_bind_group, &[]);
            for p in &prepared {
                rpass.set_pipeline(p.pipeline);
                rpass.set_bind_group(1, &p.draw_bind_group, &[]);
                if let Some(bg) = p.texture_bind_group {
                    rpass.set_bind_group(2, bg, &[]);
                }
                rpass.set_vertex_buffer(0, p.geometry.vertex_buffer.slice(..));
                match &p.geometry.index_buffer {
                    Some(index) => {
                        rpass.set_index_buffer(index.slice(..), ::wgpu::IndexFormat::Uint32);
                        rpass.draw_indexed(0..p.geometry.count, 0, 0..1);
                    }
                    None => rpass.draw(0..p.geometry.count, 0..1),
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(stats)
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for (_, geom) in self.geometries.drain() {
            geom.vertex_buffer.destroy();
            if let Some(index) = geom.index_buffer {
                index.destroy();
            }
        }
        for (_, tex) in self.textures.drain() {
            tex.texture.destroy();
        }
        self.materials.clear();
        self.fallback_texture.texture.destroy();
        self.globals_buffer.destroy();
        self.device.destroy();
        self.disposed = true;
        debug!("wgpu backend disposed");
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn live_resources(&self) -> usize {
        self.geometries.len() + self.materials.len() + self.textures.len()
    }
}

struct PipelineSpec<'a> {
    label: &'a str,
    layout: &'a ::wgpu::PipelineLayout,
    shader: &'a ::wgpu::ShaderModule,
    topology: ::wgpu::PrimitiveTopology,
    cull_mode: Option<::wgpu::Face>,
    blend: ::wgpu::BlendState,
    depth_write: bool,
}

fn pipeline(device: &::wgpu::Device, spec: PipelineSpec<'_>) -> ::wgpu::RenderPipeline {
    device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(spec.layout),
        vertex: ::wgpu::VertexState {
            module: spec.shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[::wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as ::wgpu::BufferAddress,
                step_mode: ::wgpu::VertexStepMode::Vertex,
                attributes: &[
                    ::wgpu::VertexAttribute {
                        format: ::wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    },
                    ::wgpu::VertexAttribute {
                        format: ::wgpu::VertexFormat::Float32x3,
                        offset: 12,
                        shader_location: 1,
                    },
                    ::wgpu::VertexAttribute {
                        format: ::wgpu::VertexFormat::Float32x2,
                        offset: 24,
                        shader_location: 2,
                    },
                ],
            }],
        },
        fragment: Some(::wgpu::FragmentState {
            module: spec.shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(::wgpu::ColorTargetState {
                format: COLOR_FORMAT,
                blend: Some(spec.blend),
                write_mask: ::wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: ::wgpu::PrimitiveState {
            topology: spec.topology,
            strip_index_format: None,
            front_face: ::wgpu::FrontFace::Ccw,
            cull_mode: spec.cull_mode,
            polygon_mode: ::wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(::wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: ::wgpu::CompareFunction::LessEqual,
            stencil: ::wgpu::StencilState::default(),
            bias: ::wgpu::DepthBiasState::default(),
        }),
        multisample: ::wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn shader(device: &::wgpu::Device, label: &str, source: &'static str) -> ::wgpu::ShaderModule {
    device.create_shader_module(::wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
    })
}

fn uniform_layout(device: &::wgpu::Device, label: &str) -> ::wgpu::BindGroupLayout {
    device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[::wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: ::wgpu::BindingType::Buffer {
                ty: ::wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn texture_bind_group(
    device: &::wgpu::Device,
    layout: &::wgpu::BindGroupLayout,
    view: &::wgpu::TextureView,
    sampler: &::wgpu::Sampler,
) -> ::wgpu::BindGroup {
    device.create_bind_group(&::wgpu::BindGroupDescriptor {
        label: Some("globe-texture-bg"),
        layout,
        entries: &[
            ::wgpu::BindGroupEntry {
                binding: 0,
                resource: ::wgpu::BindingResource::TextureView(view),
            },
            ::wgpu::BindGroupEntry {
                binding: 1,
                resource: ::wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn upload_texture(device: &::wgpu::Device, queue: &::wgpu::Queue, image: &TextureImage) -> GpuTexture {
    let size = ::wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&::wgpu::TextureDescriptor {
        label: Some("globe-texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: ::wgpu::TextureDimension::D2,
        format: ::wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: ::wgpu::TextureUsages::TEXTURE_BINDING | ::wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        ::wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: ::wgpu::Origin3d::ZERO,
            aspect: ::wgpu::TextureAspect::All,
        },
        &image.rgba,
        ::wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width),
            rows_per_image: Some(image.height),
        },
        size,
    );
    let view = texture.create_view(&::wgpu::TextureViewDescriptor::default());
    GpuTexture { texture, view }
}

fn create_target(device: &::wgpu::Device, size: (u32, u32)) -> Target {
    let extent = ::wgpu::Extent3d {
        width: size.0,
        height: size.1,
        depth_or_array_layers: 1,
    };
    let color = device.create_texture(&::wgpu::TextureDescriptor {
        label: Some("globe-color"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: ::wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT | ::wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let depth = device.create_texture(&::wgpu::TextureDescriptor {
        label: Some("globe-depth"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: ::wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Target {
        color_view: color.create_view(&::wgpu::TextureViewDescriptor::default()),
        depth_view: depth.create_view(&::wgpu::TextureViewDescriptor::default()),
        _color: color,
    }
}
