use std::sync::Arc;

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::error::RenderError;
use crate::math::mesh::PrimitiveKind;
use crate::renderer::context::{
    GraphicsContext, IndexType, ProgramId, UNIFORM_VIEW, UniformLocation,
    builtin_attrib_location, builtin_uniform_location,
};
use crate::renderer::shaders::{FRAGMENT_ENTRY, VERTEX_ENTRY};

const INITIAL_DRAW_CAPACITY: u64 = 16;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniforms {
    u_view: [[f32; 4]; 4],
    u_model: [[f32; 4]; 4],
    u_color: [f32; 4],
}

fn position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 16,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x4,
        }],
    }
}

struct Program {
    lines: wgpu::RenderPipeline,
    triangles: wgpu::RenderPipeline,
}

impl Program {
    fn pipeline(&self, primitive: PrimitiveKind) -> &wgpu::RenderPipeline {
        match primitive {
            PrimitiveKind::Lines => &self.lines,
            PrimitiveKind::Triangles => &self.triangles,
        }
    }
}

struct DrawCommand {
    program: usize,
    primitive: PrimitiveKind,
    vertices: usize,
    indices: usize,
    count: u32,
    uniforms: DrawUniforms,
}

/// Draws recorded between `begin_frame` and `end_frame`.
struct Frame {
    clear_color: [f32; 4],
    vertex_buffers: Vec<wgpu::Buffer>,
    index_buffers: Vec<(wgpu::Buffer, u32)>,
    draws: Vec<DrawCommand>,
}

struct Bound {
    program: Option<usize>,
    vertices: Option<usize>,
    indices: Option<usize>,
    view: Mat4,
    model: Mat4,
    color: [f32; 4],
}

impl Default for Bound {
    fn default() -> Self {
        Self {
            program: None,
            vertices: None,
            indices: None,
            view: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            color: [1.0; 4],
        }
    }
}

/// wgpu implementation of [`GraphicsContext`] rendering into a winit window.
///
/// Uploads and draws are recorded into a [`Frame`]; `end_frame` writes every
/// draw's uniforms into one buffer at aligned offsets and replays them in a
/// single render pass.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    uniform_capacity: u64,

    programs: Vec<Program>,
    viewport: Option<(f32, f32, f32, f32)>,
    frame: Option<Frame>,
    bound: Bound,

    depth_texture: wgpu::TextureView,
}

impl GpuContext {
    pub async fn new(window: Arc<winit::window::Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::backend(format!("create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| RenderError::backend("no compatible GPU adapter"))?;

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
            .await
            .map_err(|e| RenderError::backend(format!("request device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::backend("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Uniforms Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<DrawUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride =
            (std::mem::size_of::<DrawUniforms>() as u64).next_multiple_of(alignment);

        let (uniform_buffer, uniform_bind_group) = Self::create_uniforms(
            &device,
            &bind_group_layout,
            uniform_stride,
            INITIAL_DRAW_CAPACITY,
        );

        let depth_texture = Self::create_depth_texture(&device, &config);

        log::info!(
            "gpu ready: {} ({:?}), surface {:?} {}x{}",
            adapter.get_info().name,
            adapter.get_info().backend,
            surface_format,
            config.width,
            config.height
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            bind_group_layout,
            pipeline_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            uniform_capacity: INITIAL_DRAW_CAPACITY,
            programs: Vec::new(),
            viewport: None,
            frame: None,
            bound: Bound::default(),
            depth_texture,
        })
    }

    fn create_uniforms(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniforms Buffer"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Uniforms Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });

        (buffer, bind_group)
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn create_pipeline(
        &self,
        label: &str,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        topology: wgpu::PrimitiveTopology,
    ) -> wgpu::RenderPipeline {
        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some(VERTEX_ENTRY),
                    buffers: &[position_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: Some(FRAGMENT_ENTRY),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: wgpu::TextureFormat::Depth32Float,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Self::create_depth_texture(&self.device, &self.config);
            self.viewport = None;
        }
    }

    fn frame_mut(&mut self) -> Result<&mut Frame, RenderError> {
        self.frame
            .as_mut()
            .ok_or_else(|| RenderError::backend("no frame in progress"))
    }

    fn ensure_uniform_capacity(&mut self, draws: u64) {
        if draws <= self.uniform_capacity {
            return;
        }

        let capacity = draws.next_power_of_two();
        log::debug!("growing draw uniforms to {capacity} slots");
        let (buffer, bind_group) = Self::create_uniforms(
            &self.device,
            &self.bind_group_layout,
            self.uniform_stride,
            capacity,
        );
        self.uniform_buffer = buffer;
        self.uniform_bind_group = bind_group;
        self.uniform_capacity = capacity;
    }
}

impl GraphicsContext for GpuContext {
    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Scene Vertex Shader"),
                source: wgpu::ShaderSource::Wgsl(vertex_source.into()),
            });
        let fragment = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Scene Fragment Shader"),
                source: wgpu::ShaderSource::Wgsl(fragment_source.into()),
            });

        let lines = self.create_pipeline(
            "Scene Lines Pipeline",
            &vertex,
            &fragment,
            wgpu::PrimitiveTopology::LineList,
        );
        let triangles = self.create_pipeline(
            "Scene Triangles Pipeline",
            &vertex,
            &fragment,
            wgpu::PrimitiveTopology::TriangleList,
        );

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ShaderCompile(err.to_string()));
        }

        self.programs.push(Program { lines, triangles });
        Ok(ProgramId(self.programs.len() as u32 - 1))
    }

    fn use_program(&mut self, program: ProgramId) {
        self.bound.program = Some(program.0 as usize);
    }

    fn drawable_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = Some((x as f32, y as f32, width as f32, height as f32));
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> Result<(), RenderError> {
        if self.frame.is_some() {
            return Err(RenderError::backend("frame already in progress"));
        }

        self.bound.vertices = None;
        self.bound.indices = None;
        self.frame = Some(Frame {
            clear_color,
            vertex_buffers: Vec::new(),
            index_buffers: Vec::new(),
            draws: Vec::new(),
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        let frame = self
            .frame
            .take()
            .ok_or_else(|| RenderError::backend("no frame in progress"))?;

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.resize(self.size);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, dropping frame");
                return Ok(());
            }
            Err(e) => return Err(RenderError::backend(format!("acquire frame: {e}"))),
        };

        self.ensure_uniform_capacity(frame.draws.len() as u64);
        let stride = self.uniform_stride as usize;
        let mut uniform_bytes = vec![0u8; stride * frame.draws.len()];
        for (slot, draw) in uniform_bytes.chunks_exact_mut(stride).zip(&frame.draws) {
            let bytes = bytemuck::bytes_of(&draw.uniforms);
            slot[..bytes.len()].copy_from_slice(bytes);
        }
        if !uniform_bytes.is_empty() {
            self.queue
                .write_buffer(&self.uniform_buffer, 0, &uniform_bytes);
        }

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });

        {
            let [r, g, b, a] = frame.clear_color.map(f64::from);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some((x, y, w, h)) = self.viewport {
                let w = w.min(self.config.width as f32 - x);
                let h = h.min(self.config.height as f32 - y);
                if w > 0.0 && h > 0.0 {
                    render_pass.set_viewport(x, y, w, h, 0.0, 1.0);
                }
            }

            for (slot, draw) in frame.draws.iter().enumerate() {
                let Some(program) = self.programs.get(draw.program) else {
                    continue;
                };
                let (index_buffer, _) = &frame.index_buffers[draw.indices];

                render_pass.set_pipeline(program.pipeline(draw.primitive));
                render_pass.set_bind_group(
                    0,
                    &self.uniform_bind_group,
                    &[(slot * stride) as u32],
                );
                render_pass.set_vertex_buffer(0, frame.vertex_buffers[draw.vertices].slice(..));
                render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..draw.count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn abort_frame(&mut self) {
        if self.frame.take().is_some() {
            log::debug!("frame aborted");
        }
        self.bound.vertices = None;
        self.bound.indices = None;
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.programs.get(program.0 as usize)?;
        builtin_attrib_location(name)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.programs.get(program.0 as usize)?;
        builtin_uniform_location(name)
    }

    fn upload_vertices(
        &mut self,
        attrib: u32,
        components: u32,
        data: &[f32],
    ) -> Result<(), RenderError> {
        if attrib != 0 || components != 4 {
            return Err(RenderError::backend(format!(
                "unsupported vertex layout: attribute {attrib} with {components} components"
            )));
        }

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Scene Vertex Buffer"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let frame = self.frame_mut()?;
        frame.vertex_buffers.push(buffer);
        let slot = frame.vertex_buffers.len() - 1;
        self.bound.vertices = Some(slot);
        Ok(())
    }

    fn upload_indices(&mut self, data: &[u16]) -> Result<(), RenderError> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Scene Index Buffer"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::INDEX,
            });

        let frame = self.frame_mut()?;
        frame.index_buffers.push((buffer, data.len() as u32));
        let slot = frame.index_buffers.len() - 1;
        self.bound.indices = Some(slot);
        Ok(())
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, matrix: &Mat4) {
        if builtin_uniform_location(UNIFORM_VIEW) == Some(location) {
            self.bound.view = *matrix;
        } else {
            self.bound.model = *matrix;
        }
    }

    fn set_uniform_vec4(&mut self, _location: UniformLocation, value: [f32; 4]) {
        self.bound.color = value;
    }

    fn draw_elements(
        &mut self,
        primitive: PrimitiveKind,
        count: u32,
        index_type: IndexType,
    ) -> Result<(), RenderError> {
        let IndexType::U16 = index_type;

        let (Some(program), Some(vertices), Some(indices)) =
            (self.bound.program, self.bound.vertices, self.bound.indices)
        else {
            return Err(RenderError::backend(
                "draw needs a program, vertices and indices bound",
            ));
        };

        let uniforms = DrawUniforms {
            u_view: self.bound.view.to_cols_array_2d(),
            u_model: self.bound.model.to_cols_array_2d(),
            u_color: self.bound.color,
        };

        let frame = self.frame_mut()?;
        let available = frame.index_buffers[indices].1;
        if count > available {
            return Err(RenderError::backend(format!(
                "draw of {count} indexes with only {available} bound"
            )));
        }

        frame.draws.push(DrawCommand {
            program,
            primitive,
            vertices,
            indices,
            count,
            uniforms,
        });
        Ok(())
    }
}
