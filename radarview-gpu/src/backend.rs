//! wgpu implementation of the scene graph's render backend

use crate::device::GpuContext;
use crate::shaders::shader_source;
use bytemuck::{Pod, Zeroable};
use radarview_core::{Color, Error, Result};
use radarview_scene::{BufferHandle, Primitive, ProgramHandle, RenderBackend, ShaderSet, Uniform, VertexLayout};
use std::collections::HashMap;
use std::sync::Arc;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Vertices emitted per detection marker
const QUAD_VERTICES: u32 = 6;

const DETECTION_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x3, 1 => Float32x4, 2 => Float32x4, 3 => Float32, 4 => Float32
];
const LINE_ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];
const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

/// Uniform block of one program, mirrored by `shaders::UNIFORMS`
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ProgramUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub scale: f32,
    pub linewidth: f32,
    pub antialias: f32,
    pub _pad0: f32,
    pub viewport: [f32; 2],
    pub _pad1: [f32; 2],
}

impl Default for ProgramUniforms {
    fn default() -> Self {
        let identity: [[f32; 4]; 4] = nalgebra::Matrix4::<f32>::identity().into();
        Self {
            model: identity,
            view: identity,
            projection: identity,
            scale: 1.0,
            linewidth: 1.0,
            antialias: 0.0,
            _pad0: 0.0,
            viewport: [1.0, 1.0],
            _pad1: [0.0; 2],
        }
    }
}

impl ProgramUniforms {
    pub fn apply(&mut self, uniform: Uniform) {
        match uniform {
            Uniform::Model(m) => self.model = m.into(),
            Uniform::View(m) => self.view = m.into(),
            Uniform::Projection(m) => self.projection = m.into(),
            Uniform::Scale(v) => self.scale = v,
            Uniform::LineWidth(v) => self.linewidth = v,
            Uniform::Antialias(v) => self.antialias = v,
        }
    }
}

/// How a primitive/layout pair is realised on wgpu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// Instanced quads, one instance per vertex of the buffer
    Sprites,
    /// Plain vertex draw with the given topology
    Direct(wgpu::PrimitiveTopology),
    /// Line strip over a buffer whose first vertex is repeated at the end
    ClosedStrip,
}

impl DrawMode {
    pub fn for_primitive(primitive: Primitive, layout: VertexLayout) -> Self {
        match (primitive, layout) {
            (Primitive::Points, VertexLayout::Detection) => DrawMode::Sprites,
            (Primitive::Points, _) => DrawMode::Direct(wgpu::PrimitiveTopology::PointList),
            (Primitive::Lines, _) => DrawMode::Direct(wgpu::PrimitiveTopology::LineList),
            (Primitive::LineLoop, _) => DrawMode::ClosedStrip,
            (Primitive::Triangles, _) => DrawMode::Direct(wgpu::PrimitiveTopology::TriangleList),
        }
    }

    fn topology(&self) -> wgpu::PrimitiveTopology {
        match self {
            DrawMode::Sprites => wgpu::PrimitiveTopology::TriangleList,
            DrawMode::Direct(topology) => *topology,
            DrawMode::ClosedStrip => wgpu::PrimitiveTopology::LineStrip,
        }
    }

    fn step_mode(&self) -> wgpu::VertexStepMode {
        match self {
            DrawMode::Sprites => wgpu::VertexStepMode::Instance,
            _ => wgpu::VertexStepMode::Vertex,
        }
    }

    /// Vertices stored on the GPU for `capacity` scene vertices
    pub fn gpu_vertices(&self, capacity: usize) -> usize {
        match self {
            DrawMode::ClosedStrip if capacity > 0 => capacity + 1,
            _ => capacity,
        }
    }
}

fn vertex_attributes(layout: VertexLayout) -> &'static [wgpu::VertexAttribute] {
    match layout {
        VertexLayout::Detection => &DETECTION_ATTRIBUTES,
        VertexLayout::Line => &LINE_ATTRIBUTES,
        VertexLayout::Mesh => &MESH_ATTRIBUTES,
    }
}

struct Program {
    pipeline: wgpu::RenderPipeline,
    mode: DrawMode,
    uniforms: ProgramUniforms,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    dirty: bool,
}

struct VertexBuffer {
    buffer: wgpu::Buffer,
    mode: DrawMode,
    stride: usize,
    capacity: usize,
}

struct QueuedDraw {
    program: ProgramHandle,
    buffer: BufferHandle,
    count: u32,
}

/// Render backend drawing into a window surface
pub struct WgpuBackend {
    pub gpu_context: GpuContext,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    programs: HashMap<ProgramHandle, Program>,
    buffers: HashMap<BufferHandle, VertexBuffer>,
    next_program: u32,
    next_buffer: u32,
    frame: Option<wgpu::SurfaceTexture>,
    queued: Vec<QueuedDraw>,
}

impl WgpuBackend {
    /// Create a backend presenting to `window`
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let (gpu_context, surface) = GpuContext::for_window(window).await?;

        let surface_caps = surface.get_capabilities(&gpu_context.adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| Error::Gpu("Surface reports no supported formats".to_string()))?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes.first().copied().unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu_context.device, &surface_config);

        let bind_group_layout = gpu_context.create_bind_group_layout(
            "program uniforms layout",
            &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        );

        let pipeline_layout = gpu_context.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("program pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let depth_view = create_depth_view(&gpu_context.device, &surface_config);

        log::info!(
            "Surface configured: {}x{} {:?}",
            surface_config.width,
            surface_config.height,
            surface_config.format
        );

        Ok(Self {
            gpu_context,
            surface,
            surface_config,
            depth_view,
            bind_group_layout,
            pipeline_layout,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            next_program: 0,
            next_buffer: 0,
            frame: None,
            queued: Vec::new(),
        })
    }

    /// Current surface size in physical pixels
    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.surface_config.width as f32 / self.surface_config.height.max(1) as f32
    }

    /// Resize the surface and depth buffer
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.gpu_context.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.gpu_context.device, &self.surface_config);

        for program in self.programs.values_mut() {
            program.uniforms.viewport = [width as f32, height as f32];
            program.dirty = true;
        }
        log::debug!("Surface resized to {}x{}", width, height);
    }

    /// Acquire the next surface texture. Draw calls are queued until `end_frame`.
    pub fn begin_frame(&mut self) -> Result<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.surface.configure(&self.gpu_context.device, &self.surface_config);
                self.surface
                    .get_current_texture()
                    .map_err(|e| Error::Gpu(format!("Failed to get surface texture: {:?}", e)))?
            }
            Err(e) => return Err(Error::Gpu(format!("Failed to get surface texture: {:?}", e))),
        };
        self.frame = Some(frame);
        self.queued.clear();
        Ok(())
    }

    /// Encode every queued draw into one render pass and present the frame
    pub fn end_frame(&mut self, clear_color: Color) -> Result<()> {
        let frame = self
            .frame
            .take()
            .ok_or_else(|| Error::Gpu("end_frame called without begin_frame".to_string()))?;

        for program in self.programs.values_mut().filter(|p| p.dirty) {
            self.gpu_context
                .queue
                .write_buffer(&program.uniform_buffer, 0, bytemuck::bytes_of(&program.uniforms));
            program.dirty = false;
        }

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.gpu_context.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear_color[0] as f64,
                            g: clear_color[1] as f64,
                            b: clear_color[2] as f64,
                            a: clear_color[3] as f64,
                        }),
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

            for draw in &self.queued {
                let (Some(program), Some(buffer)) = (self.programs.get(&draw.program), self.buffers.get(&draw.buffer))
                else {
                    continue;
                };
                let count = draw.count.min(buffer.capacity as u32);
                if count == 0 {
                    continue;
                }
                render_pass.set_pipeline(&program.pipeline);
                render_pass.set_bind_group(0, &program.bind_group, &[]);
                render_pass.set_vertex_buffer(0, buffer.buffer.slice(..));
                match program.mode {
                    DrawMode::Sprites => render_pass.draw(0..QUAD_VERTICES, 0..count),
                    DrawMode::ClosedStrip => render_pass.draw(0..count + 1, 0..1),
                    DrawMode::Direct(_) => render_pass.draw(0..count, 0..1),
                }
            }
        }

        self.gpu_context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.queued.clear();
        Ok(())
    }

    fn create_module(&self, name: &str) -> Result<wgpu::ShaderModule> {
        let source = shader_source(name).ok_or_else(|| Error::Shader {
            name: name.to_string(),
            message: "no shader source with this name".to_string(),
        })?;
        self.gpu_context
            .validated(|ctx| ctx.create_shader_module(name, &source))
            .map_err(|message| Error::Shader { name: name.to_string(), message })
    }
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

impl RenderBackend for WgpuBackend {
    fn compile_program(
        &mut self,
        shaders: &ShaderSet,
        layout: VertexLayout,
        primitive: Primitive,
    ) -> Result<ProgramHandle> {
        if let Some(geometry) = shaders.geometry {
            return Err(Error::Shader {
                name: geometry.to_string(),
                message: "geometry shaders are not supported by the wgpu backend".to_string(),
            });
        }

        let vertex_module = self.create_module(shaders.vertex)?;
        let fragment_module = self.create_module(shaders.fragment)?;
        let mode = DrawMode::for_primitive(primitive, layout);
        let label = format!("{}+{}", shaders.vertex, shaders.fragment);

        let surface_format = self.surface_config.format;
        let pipeline_layout = &self.pipeline_layout;
        let pipeline = self
            .gpu_context
            .validated(|ctx| {
                ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(&label),
                    layout: Some(pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &vertex_module,
                        entry_point: "vs_main",
                        buffers: &[wgpu::VertexBufferLayout {
                            array_stride: layout.stride() as wgpu::BufferAddress,
                            step_mode: mode.step_mode(),
                            attributes: vertex_attributes(layout),
                        }],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &fragment_module,
                        entry_point: "fs_main",
                        targets: &[Some(wgpu::ColorTargetState {
                            format: surface_format,
                            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: mode.topology(),
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: None,
                        unclipped_depth: false,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        conservative: false,
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DEPTH_FORMAT,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::LessEqual,
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState {
                        count: 1,
                        mask: !0,
                        alpha_to_coverage_enabled: false,
                    },
                    multiview: None,
                })
            })
            .map_err(|message| Error::Shader { name: label.clone(), message })?;

        let mut uniforms = ProgramUniforms::default();
        uniforms.viewport = [self.surface_config.width as f32, self.surface_config.height as f32];
        let uniform_buffer = self.gpu_context.create_buffer_init(
            &format!("{} uniforms", label),
            bytemuck::bytes_of(&uniforms),
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let bind_group = self.gpu_context.create_bind_group(
            &format!("{} bind group", label),
            &self.bind_group_layout,
            &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        );

        let handle = ProgramHandle(self.next_program);
        self.next_program += 1;
        self.programs.insert(
            handle,
            Program {
                pipeline,
                mode,
                uniforms,
                uniform_buffer,
                bind_group,
                dirty: false,
            },
        );
        log::debug!("Compiled program {:?} ({}, {:?})", handle, label, mode);
        Ok(handle)
    }

    fn create_vertex_buffer(
        &mut self,
        program: ProgramHandle,
        layout: VertexLayout,
        capacity: usize,
        data: &[u8],
    ) -> Result<BufferHandle> {
        let mode = self
            .programs
            .get(&program)
            .map(|p| p.mode)
            .ok_or(Error::NoShaderProgram)?;
        let stride = layout.stride();
        if data.len() > capacity * stride {
            return Err(Error::CapacityExceeded {
                requested: data.len() / stride,
                capacity,
            });
        }

        // Zero-sized buffers cannot be bound, keep room for one vertex
        let mut contents = vec![0u8; mode.gpu_vertices(capacity).max(1) * stride];
        contents[..data.len()].copy_from_slice(data);
        if mode == DrawMode::ClosedStrip && capacity > 0 {
            let end = capacity * stride;
            contents.copy_within(0..stride, end);
        }

        let buffer = self.gpu_context.create_buffer_init(
            "node vertex buffer",
            &contents,
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        );

        let handle = BufferHandle(self.next_buffer);
        self.next_buffer += 1;
        self.buffers.insert(handle, VertexBuffer { buffer, mode, stride, capacity });
        Ok(handle)
    }

    fn upload(&mut self, buffer: BufferHandle, data: &[u8]) -> Result<()> {
        let target = self
            .buffers
            .get(&buffer)
            .ok_or_else(|| Error::Gpu(format!("upload to unknown buffer {:?}", buffer)))?;
        if data.len() > target.capacity * target.stride {
            return Err(Error::CapacityExceeded {
                requested: data.len() / target.stride,
                capacity: target.capacity,
            });
        }

        let queue = &self.gpu_context.queue;
        queue.write_buffer(&target.buffer, 0, data);
        if target.mode == DrawMode::ClosedStrip && data.len() >= target.stride {
            let end = (target.capacity * target.stride) as wgpu::BufferAddress;
            queue.write_buffer(&target.buffer, end, &data[..target.stride]);
        }
        Ok(())
    }

    fn set_uniform(&mut self, program: ProgramHandle, uniform: Uniform) {
        match self.programs.get_mut(&program) {
            Some(p) => {
                p.uniforms.apply(uniform);
                p.dirty = true;
            }
            None => log::warn!("Uniform {} set on unknown program {:?}", uniform.name(), program),
        }
    }

    fn draw(&mut self, program: ProgramHandle, buffer: BufferHandle, _primitive: Primitive, count: u32) {
        if self.frame.is_none() {
            log::trace!("draw outside of a frame ignored");
            return;
        }
        self.queued.push(QueuedDraw { program, buffer, count });
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if let Some(released) = self.buffers.remove(&buffer) {
            released.buffer.destroy();
        }
    }

    fn release_program(&mut self, program: ProgramHandle) {
        if let Some(released) = self.programs.remove(&program) {
            released.uniform_buffer.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_block_size() {
        assert_eq!(std::mem::size_of::<ProgramUniforms>(), 224);
    }

    #[test]
    fn test_detection_points_become_sprites() {
        assert_eq!(DrawMode::for_primitive(Primitive::Points, VertexLayout::Detection), DrawMode::Sprites);
        assert_eq!(
            DrawMode::for_primitive(Primitive::Points, VertexLayout::Line),
            DrawMode::Direct(wgpu::PrimitiveTopology::PointList)
        );
    }

    #[test]
    fn test_line_loop_stores_closing_vertex() {
        let mode = DrawMode::for_primitive(Primitive::LineLoop, VertexLayout::Line);
        assert_eq!(mode, DrawMode::ClosedStrip);
        assert_eq!(mode.gpu_vertices(500), 501);
        assert_eq!(mode.gpu_vertices(0), 0);
    }

    #[test]
    fn test_attribute_offsets_match_vertex_structs() {
        let detection = vertex_attributes(VertexLayout::Detection);
        assert_eq!(detection[3].offset, 44);
        assert_eq!(detection[4].offset, 48);
        assert_eq!(VertexLayout::Detection.stride(), 52);

        let mesh = vertex_attributes(VertexLayout::Mesh);
        assert_eq!(mesh[2].offset, 24);
        assert_eq!(VertexLayout::Mesh.stride(), 40);
    }

    #[test]
    fn test_uniforms_apply() {
        let mut uniforms = ProgramUniforms::default();
        uniforms.apply(Uniform::Scale(0.5));
        uniforms.apply(Uniform::Model(nalgebra::Matrix4::new_translation(&nalgebra::Vector3::new(1.0, 2.0, 3.0))));
        assert_eq!(uniforms.scale, 0.5);
        // column-major: translation sits in the last column
        assert_eq!(uniforms.model[3][0], 1.0);
        assert_eq!(uniforms.model[3][2], 3.0);
    }
}
