//! GPU state: surface bootstrap, the instanced mesh pipeline, the pyramid
//! edge pipeline, and the dialogue overlay pass.

use std::sync::Arc;

use anyhow::{Context, Result};
use bytemuck::cast_slice;
use glam::Mat4;
use orion_scene::OrionScene;
use wgpu::util::DeviceExt;
use wgpu::{self, SurfaceError};
use winit::{dpi::PhysicalSize, window::Window};

use crate::mesh::{
    MeshInstance, MeshPrimitive, MeshUniforms, MeshVertex, PrimitiveKind, build_instances,
    primitive, pyramid_edges, view_projection_uniform,
};
use crate::overlay::{QUAD_INDICES, QuadVertex, TextOverlay};
use crate::shaders::{MESH_SHADER_SOURCE, OVERLAY_SHADER_SOURCE};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Cube yaw increment per rendered frame, cosmetic only.
const CUBE_SPIN_PER_FRAME: f32 = 0.001;
/// Edges stay fully opaque even though the pyramid faces are translucent.
const EDGE_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 1.0];

struct PrimitiveBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

fn upload_primitive(
    device: &wgpu::Device,
    label: &str,
    primitive: MeshPrimitive,
) -> PrimitiveBuffers {
    let vertex_label = format!("{label}-vertices");
    let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(vertex_label.as_str()),
        contents: cast_slice(&primitive.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_label = format!("{label}-indices");
    let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(index_label.as_str()),
        contents: cast_slice(&primitive.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    PrimitiveBuffers {
        vertex,
        index,
        index_count: primitive.indices.len() as u32,
    }
}

#[derive(Clone, Copy)]
struct InstanceRange {
    offset: u32,
    count: u32,
}

fn append_instances(combined: &mut Vec<MeshInstance>, group: &[MeshInstance]) -> InstanceRange {
    let offset = combined.len() as u32;
    combined.extend_from_slice(group);
    InstanceRange {
        offset,
        count: group.len() as u32,
    }
}

pub struct ViewerState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    mesh_pipeline: wgpu::RenderPipeline,
    edge_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    plane: PrimitiveBuffers,
    cube: PrimitiveBuffers,
    pyramid: PrimitiveBuffers,
    sphere: PrimitiveBuffers,
    edge_vertex_buffer: wgpu::Buffer,
    edge_vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    quad_index_buffer: wgpu::Buffer,
    quad_index_count: u32,
    overlay: TextOverlay,
    scene: Arc<OrionScene>,
    spin_angle: f32,
}

impl ViewerState {
    pub async fn new(window: Arc<Window>, scene: Arc<OrionScene>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("creating wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .context("requesting wgpu adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("orion-viewer-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .context("requesting wgpu device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let present_mode = surface_caps
            .present_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::PresentMode::Mailbox)
            .unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Opaque);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("mesh-uniform-bind-group-layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<MeshUniforms>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

        let initial_uniform = view_projection_uniform(Mat4::IDENTITY);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh-uniform-buffer"),
            contents: cast_slice(&[initial_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh-uniform-bind-group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh-shader"),
            source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(MESH_SHADER_SOURCE)),
        });

        let mesh_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("mesh-pipeline-layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
        };

        let instance_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![
                2 => Float32x4,
                3 => Float32x4,
                4 => Float32x4,
                5 => Float32x4,
                6 => Float32x4,
            ],
        };

        let mesh_targets = [Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        // The ground plane and the translucent pyramid are both visible from
        // either side, so culling stays off.
        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh-pipeline"),
            layout: Some(&mesh_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &mesh_shader,
                entry_point: "mesh_vs_main",
                buffers: &[vertex_layout.clone(), instance_layout.clone()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: "mesh_fs_main",
                targets: &mesh_targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let edge_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("edge-pipeline"),
            layout: Some(&mesh_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &mesh_shader,
                entry_point: "mesh_vs_main",
                buffers: &[vertex_layout, instance_layout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: "mesh_fs_main",
                targets: &mesh_targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                cull_mode: None,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let overlay_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("overlay-bind-group-layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let overlay_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("overlay-shader"),
            source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(OVERLAY_SHADER_SOURCE)),
        });

        let overlay_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("overlay-pipeline-layout"),
                bind_group_layouts: &[&overlay_bind_group_layout],
                push_constant_ranges: &[],
            });

        let quad_vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
        };

        let overlay_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("overlay-pipeline"),
            layout: Some(&overlay_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &overlay_shader,
                entry_point: "vs_main",
                buffers: &[quad_vertex_layout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &overlay_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let plane = upload_primitive(&device, "mesh-plane", primitive(PrimitiveKind::Plane));
        let cube = upload_primitive(&device, "mesh-cube", primitive(PrimitiveKind::Cube));
        let pyramid = upload_primitive(&device, "mesh-pyramid", primitive(PrimitiveKind::Pyramid));
        let sphere = upload_primitive(&device, "mesh-sphere", primitive(PrimitiveKind::Sphere));

        let edges = pyramid_edges();
        let edge_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("pyramid-edge-vertices"),
            contents: cast_slice(&edges),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let edge_vertex_count = edges.len() as u32;

        // One extra slot for the opaque edge instance appended each frame.
        let instance_capacity = scene.objects().len() + 1;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh-instance-buffer"),
            size: (instance_capacity * std::mem::size_of::<MeshInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let (depth_texture, depth_view) = create_depth_texture(&device, size);

        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay-quad-indices"),
            contents: cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let overlay = TextOverlay::new(&device, &queue, &overlay_bind_group_layout, size)?;

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            mesh_pipeline,
            edge_pipeline,
            overlay_pipeline,
            uniform_buffer,
            uniform_bind_group,
            plane,
            cube,
            pyramid,
            sphere,
            edge_vertex_buffer,
            edge_vertex_count,
            instance_buffer,
            instance_capacity,
            _depth_texture: depth_texture,
            depth_view,
            quad_index_buffer,
            quad_index_count: QUAD_INDICES.len() as u32,
            overlay,
            scene,
            spin_angle: 0.0,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            let (depth_texture, depth_view) = create_depth_texture(&self.device, new_size);
            self._depth_texture = depth_texture;
            self.depth_view = depth_view;
            self.overlay.update_layout(&self.device, new_size);
        }
    }

    pub fn set_guide_lines(&mut self, lines: &[String]) {
        self.overlay.set_lines(lines);
    }

    pub fn overlay_columns(&self) -> usize {
        self.overlay.max_columns()
    }

    fn ensure_instance_capacity(&mut self, required: usize) {
        if required <= self.instance_capacity {
            return;
        }
        let capacity = required.next_power_of_two();
        self.instance_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh-instance-buffer"),
            size: (capacity * std::mem::size_of::<MeshInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.instance_capacity = capacity;
    }

    pub fn render(&mut self, view_projection: Mat4) -> Result<(), SurfaceError> {
        self.spin_angle = (self.spin_angle + CUBE_SPIN_PER_FRAME) % std::f32::consts::TAU;

        let groups = build_instances(&self.scene, self.spin_angle);
        let mut combined = Vec::with_capacity(groups.total() + 1);
        let plane_range = append_instances(&mut combined, &groups.plane);
        let cube_range = append_instances(&mut combined, &groups.cube);
        let sphere_range = append_instances(&mut combined, &groups.sphere);
        // Translucent geometry draws after the opaque buckets.
        let pyramid_range = append_instances(&mut combined, &groups.pyramid);
        let edge_instances: Vec<MeshInstance> = groups
            .pyramid
            .iter()
            .map(|instance| MeshInstance {
                model: instance.model,
                color: EDGE_COLOR,
            })
            .collect();
        let edge_range = append_instances(&mut combined, &edge_instances);

        self.ensure_instance_capacity(combined.len());
        self.queue
            .write_buffer(&self.instance_buffer, 0, cast_slice(&combined));

        let uniform = view_projection_uniform(view_projection);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, cast_slice(&[uniform]));

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("orion-viewer-encoder"),
            });

        {
            let mut mesh_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mesh-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            mesh_pass.set_pipeline(&self.mesh_pipeline);
            mesh_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            let instance_bytes = (combined.len() * std::mem::size_of::<MeshInstance>()) as u64;
            mesh_pass.set_vertex_buffer(1, self.instance_buffer.slice(0..instance_bytes));

            draw_bucket(&mut mesh_pass, &self.plane, plane_range);
            draw_bucket(&mut mesh_pass, &self.cube, cube_range);
            draw_bucket(&mut mesh_pass, &self.sphere, sphere_range);
            draw_bucket(&mut mesh_pass, &self.pyramid, pyramid_range);

            if edge_range.count > 0 {
                mesh_pass.set_pipeline(&self.edge_pipeline);
                mesh_pass.set_vertex_buffer(0, self.edge_vertex_buffer.slice(..));
                mesh_pass.draw(
                    0..self.edge_vertex_count,
                    edge_range.offset..(edge_range.offset + edge_range.count),
                );
            }
        }

        self.overlay.upload(&self.queue);
        if self.overlay.is_visible() {
            let mut overlay_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("overlay-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            overlay_pass.set_pipeline(&self.overlay_pipeline);
            overlay_pass.set_bind_group(0, self.overlay.bind_group(), &[]);
            overlay_pass.set_vertex_buffer(0, self.overlay.vertex_buffer().slice(..));
            overlay_pass
                .set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            overlay_pass.draw_indexed(0..self.quad_index_count, 0, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn draw_bucket<'a>(
    pass: &mut wgpu::RenderPass<'a>,
    buffers: &'a PrimitiveBuffers,
    range: InstanceRange,
) {
    if range.count == 0 {
        return;
    }
    pass.set_vertex_buffer(0, buffers.vertex.slice(..));
    pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint16);
    pass.draw_indexed(
        0..buffers.index_count,
        0,
        range.offset..(range.offset + range.count),
    );
}

fn create_depth_texture(
    device: &wgpu::Device,
    size: PhysicalSize<u32>,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("mesh-depth-texture"),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
