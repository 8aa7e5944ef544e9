use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::config::DemoConfig;
use crate::renderer::camera::{Camera, CameraUniform};
use crate::renderer::passes::{self, STAGES, StageDesc, StageGeometry};
use crate::scene::mesh::{self, Mesh};

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("failed to create rendering surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible graphics adapter found")]
    AdapterNotFound,
    #[error("failed to acquire graphics device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

fn position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

/// GPU-resident vertex and index data for a mesh uploaded once at startup.
struct GeometryBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GeometryBuffers {
    fn upload(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, mesh: &Mesh) -> Self {
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (mesh.vertices.len() * 4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (mesh.indices.len() * 4) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        queue.write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&mesh.vertices));
        queue.write_buffer(&index_buffer, 0, bytemuck::cast_slice(&mesh.indices));

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}

/// Fixed set of per-hole vertex slots plus the fan index buffer they share.
///
/// The slots are acquired once and rewritten every frame from a reused
/// scratch vector; nothing is allocated or freed inside the frame loop.
pub struct HoleBufferPool {
    slots: Vec<wgpu::Buffer>,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    scratch: Vec<f32>,
    radius: f32,
    segments: u32,
}

impl HoleBufferPool {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue, config: &DemoConfig) -> Self {
        let vertex_floats = ((config.hole_segments + 1) * 3) as usize;

        let slots = (0..config.hole_centers.len())
            .map(|_| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Hole Vertex Buffer"),
                    size: (vertex_floats * 4) as u64,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        // The fan triangulation is identical for every hole.
        let indices = mesh::fan_indices(config.hole_segments);
        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Hole Index Buffer"),
            size: (indices.len() * 4) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&index_buffer, 0, bytemuck::cast_slice(&indices));

        Self {
            slots,
            index_buffer,
            index_count: indices.len() as u32,
            scratch: Vec::with_capacity(vertex_floats),
            radius: config.hole_radius,
            segments: config.hole_segments,
        }
    }

    fn rewrite(&mut self, queue: &wgpu::Queue, slot: usize, center: Vec3) {
        self.scratch.clear();
        mesh::fan_points_into(&mut self.scratch, center, self.radius, self.segments);
        queue.write_buffer(&self.slots[slot], 0, bytemuck::cast_slice(&self.scratch));
    }
}

/// Per-object uniform buffer (model matrix + flat color) and its bind group.
struct ObjectSlot {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    color: [f32; 4],
}

impl ObjectSlot {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        color: [f32; 4],
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<ObjectUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            uniform_buffer,
            bind_group,
            color,
        }
    }
}

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    pipeline_silhouette: wgpu::RenderPipeline,
    pipeline_holes: wgpu::RenderPipeline,
    pipeline_overlay: wgpu::RenderPipeline,

    camera_bind_group: wgpu::BindGroup,

    silhouette_object: ObjectSlot,
    holes_object: ObjectSlot,
    overlay_object: ObjectSlot,

    tetrahedron: GeometryBuffers,
    torus: GeometryBuffers,
    holes: HoleBufferPool,

    hole_centers: Vec<Vec3>,
    clear_color: wgpu::Color,

    depth_stencil: wgpu::TextureView,
}

impl GpuState {
    pub async fn new(
        window: Arc<winit::window::Window>,
        config: &DemoConfig,
    ) -> Result<Self, RendererError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::AdapterNotFound)?;

        log::info!("using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let object_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Object Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // The camera never moves; its matrices are written once.
        let camera = Camera::from_config(config);
        queue.write_buffer(
            &camera_buffer,
            0,
            bytemuck::cast_slice(&[CameraUniform::from_camera(&camera)]),
        );

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let silhouette_object = ObjectSlot::new(
            &device,
            &object_bind_group_layout,
            "Silhouette Uniforms",
            config.silhouette_color,
        );
        let holes_object = ObjectSlot::new(
            &device,
            &object_bind_group_layout,
            "Hole Uniforms",
            config.hole_color,
        );
        let overlay_object = ObjectSlot::new(
            &device,
            &object_bind_group_layout,
            "Overlay Uniforms",
            config.overlay_color,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Stage Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &object_bind_group_layout],
            push_constant_ranges: &[],
        });

        // Shader and pipeline validation failures are reported and survived;
        // the frame loop then runs with whatever the driver handed back.
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let pipeline_silhouette =
            build_stage_pipeline(&device, &pipeline_layout, &shader, surface_format, &STAGES[0]);
        let pipeline_holes =
            build_stage_pipeline(&device, &pipeline_layout, &shader, surface_format, &STAGES[1]);
        let pipeline_overlay =
            build_stage_pipeline(&device, &pipeline_layout, &shader, surface_format, &STAGES[3]);

        if let Some(error) = device.pop_error_scope().await {
            log::error!("shader compilation failed:\n{error}");
        }

        let torus_mesh = mesh::torus(&config.torus);
        log::debug!(
            "torus mesh: {} vertices, {} indices",
            torus_mesh.vertex_count(),
            torus_mesh.index_count()
        );

        let tetrahedron =
            GeometryBuffers::upload(&device, &queue, "Tetrahedron", &mesh::tetrahedron());
        let torus = GeometryBuffers::upload(&device, &queue, "Torus", &torus_mesh);
        let holes = HoleBufferPool::new(&device, &queue, config);

        let depth_stencil = create_depth_stencil_texture(&device, &surface_config);

        Ok(Self {
            surface,
            device,
            queue,
            config: surface_config,
            size,
            pipeline_silhouette,
            pipeline_holes,
            pipeline_overlay,
            camera_bind_group,
            silhouette_object,
            holes_object,
            overlay_object,
            tetrahedron,
            torus,
            holes,
            hole_centers: config.hole_centers.iter().map(|&c| Vec3::from(c)).collect(),
            clear_color: wgpu::Color {
                r: config.clear_color[0],
                g: config.clear_color[1],
                b: config.clear_color[2],
                a: config.clear_color[3],
            },
            depth_stencil,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_stencil = create_depth_stencil_texture(&self.device, &self.config);
        }
    }

    /// Writes the frame's model/color uniforms and refreshes the hole slots.
    pub fn prepare_frame(&mut self, model: Mat4) {
        let model = model.to_cols_array_2d();

        for object in [
            &self.silhouette_object,
            &self.holes_object,
            &self.overlay_object,
        ] {
            let uniform = ObjectUniform {
                model,
                color: object.color,
            };
            self.queue
                .write_buffer(&object.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
        }

        for (slot, center) in self.hole_centers.iter().enumerate() {
            self.holes.rewrite(&self.queue, slot, *center);
        }
    }

    /// Runs the four stages of the masked sequence, in table order, inside a
    /// single render pass.
    pub fn render(&self, view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Frame Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_stencil,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        for stage in &STAGES {
            match stage.geometry {
                StageGeometry::Tetrahedron => {
                    render_pass.set_pipeline(&self.pipeline_silhouette);
                    render_pass.set_stencil_reference(stage.stencil_ref);
                    render_pass.set_bind_group(1, &self.silhouette_object.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, self.tetrahedron.vertex_buffer.slice(..));
                    render_pass.set_index_buffer(
                        self.tetrahedron.index_buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    );
                    render_pass.draw_indexed(0..self.tetrahedron.index_count, 0, 0..1);
                }
                StageGeometry::Holes => {
                    render_pass.set_pipeline(&self.pipeline_holes);
                    render_pass.set_stencil_reference(stage.stencil_ref);
                    render_pass.set_bind_group(1, &self.holes_object.bind_group, &[]);
                    render_pass.set_index_buffer(
                        self.holes.index_buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    );
                    for slot in &self.holes.slots {
                        render_pass.set_vertex_buffer(0, slot.slice(..));
                        render_pass.draw_indexed(0..self.holes.index_count, 0, 0..1);
                    }
                }
                // The restored write masks travel with the pipeline bound by
                // the next stage.
                StageGeometry::None => {}
                StageGeometry::Torus => {
                    render_pass.set_pipeline(&self.pipeline_overlay);
                    render_pass.set_stencil_reference(stage.stencil_ref);
                    render_pass.set_bind_group(1, &self.overlay_object.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, self.torus.vertex_buffer.slice(..));
                    render_pass.set_index_buffer(
                        self.torus.index_buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    );
                    render_pass.draw_indexed(0..self.torus.index_count, 0, 0..1);
                }
            }
        }
    }
}

fn build_stage_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    stage: &StageDesc,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(stage.name),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[position_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: stage.color_writes,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(passes::depth_stencil_state(stage)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_depth_stencil_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: config.width.max(1),
        height: config.height.max(1),
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Stencil Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: passes::DEPTH_STENCIL_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
