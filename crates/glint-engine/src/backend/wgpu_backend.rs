use std::collections::{HashMap, HashSet};

use image::RgbaImage;
use winit::dpi::PhysicalSize;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::pipeline::{DrawMode, Filter, Sampling, TextureSlot, Wrap};

use super::{
    BackendError, BufferHandle, Destination, DestinationKind, DrawCall, ProgramHandle, ProgramSource,
    RenderBackend, ResolveHandle, TextureHandle, RESOLVE_SAMPLES,
};

/// Format of texture and resolve targets.
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Sampling of texture targets.
const TARGET_SAMPLING: Sampling = Sampling {
    wrap_s: Wrap::Repeat,
    wrap_t: Wrap::Repeat,
    min: Filter::Nearest,
    mag: Filter::Nearest,
};

// ── resources ─────────────────────────────────────────────────────────────

struct GpuBuffer {
    buffer: wgpu::Buffer,
    size: u64,
}

struct GpuTexture {
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    size: [u32; 2],
}

struct GpuResolve {
    view: wgpu::TextureView,
    size: [u32; 2],
}

struct GpuProgram {
    label: String,
    pipelines: HashMap<DestinationKind, wgpu::RenderPipeline>,
    bind_group_layout: wgpu::BindGroupLayout,
    uniforms: Option<(u32, wgpu::Buffer)>,
    textures: Vec<TextureSlot>,
}

// ── backend ───────────────────────────────────────────────────────────────

/// [`RenderBackend`] drawing to a window surface through wgpu.
///
/// Every draw is its own render pass on the frame encoder. Uniform and
/// vertex writes go through the queue and land before the frame's commands.
pub struct WgpuBackend {
    gpu: Gpu,
    next_id: u32,
    programs: HashMap<ProgramHandle, GpuProgram>,
    buffers: HashMap<BufferHandle, GpuBuffer>,
    textures: HashMap<TextureHandle, GpuTexture>,
    resolves: HashMap<ResolveHandle, GpuResolve>,
    placeholder: GpuTexture,
    clear_color: wgpu::Color,
    frame: Option<crate::device::GpuFrame>,
    feedback_warned: HashSet<ProgramHandle>,
    lost: bool,
}

impl WgpuBackend {
    pub fn new(gpu: Gpu) -> Self {
        let placeholder = placeholder_texture(&gpu);
        Self {
            gpu,
            next_id: 0,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            resolves: HashMap::new(),
            placeholder,
            clear_color: wgpu::Color::TRANSPARENT,
            frame: None,
            feedback_warned: HashSet::new(),
            lost: false,
        }
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    /// Reconfigures the surface. Targets keep the pipeline resolution.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.gpu.resize(size);
    }

    /// Whether the surface failed beyond recovery.
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn create_buffer(&mut self, label: &str, bytes: &[u8], usage: wgpu::BufferUsages) -> BufferHandle {
        let size = aligned(bytes.len() as u64);
        let buffer = self.gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        if !bytes.is_empty() {
            self.gpu.queue().write_buffer(&buffer, 0, &padded(bytes));
        }

        let handle = BufferHandle(self.next());
        self.buffers.insert(handle, GpuBuffer { buffer, size });
        handle
    }

    fn write_buffer(&mut self, handle: BufferHandle, bytes: &[u8]) -> Result<(), BackendError> {
        let buffer = self.buffers.get(&handle).ok_or(BackendError::UnknownHandle {
            kind: "buffer",
            id: handle.0,
        })?;
        let data = padded(bytes);
        if data.len() as u64 > buffer.size {
            return Err(BackendError::BufferOverflow {
                id: handle.0,
                capacity: buffer.size,
                len: bytes.len() as u64,
            });
        }
        if !data.is_empty() {
            self.gpu.queue().write_buffer(&buffer.buffer, 0, &data);
        }
        Ok(())
    }

    fn create_color_texture(
        &self,
        label: &str,
        size: [u32; 2],
        sample_count: u32,
        usage: wgpu::TextureUsages,
    ) -> Result<wgpu::Texture, BackendError> {
        if size[0] == 0 || size[1] == 0 {
            return Err(BackendError::Texture {
                label: label.to_string(),
                reason: format!("size {}x{} is empty", size[0], size[1]),
            });
        }
        let device = self.gpu.device();
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(size),
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage,
            view_formats: &[],
        });
        match pollster::block_on(scope.pop()) {
            Some(error) => Err(BackendError::Texture {
                label: label.to_string(),
                reason: error.to_string(),
            }),
            None => Ok(texture),
        }
    }

    fn target_format(&self, kind: DestinationKind) -> (wgpu::TextureFormat, u32) {
        match kind {
            DestinationKind::Screen => (self.gpu.surface_format(), 1),
            DestinationKind::Texture => (TARGET_FORMAT, 1),
            DestinationKind::Resolve => (TARGET_FORMAT, RESOLVE_SAMPLES),
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn create_program(&mut self, source: &ProgramSource<'_>) -> Result<ProgramHandle, BackendError> {
        let device = self.gpu.device();
        let reflection = &source.compiled.reflection;
        let pipeline_error = |reason: String| BackendError::Pipeline {
            label: source.label.to_string(),
            reason,
        };

        let max_buffers = device.limits().max_vertex_buffers as usize;
        if source.layout.bindings.len() > max_buffers {
            return Err(pipeline_error(format!(
                "{} vertex inputs exceed the device limit of {max_buffers}",
                source.layout.bindings.len()
            )));
        }

        // Validation failures come back as an error instead of reaching the
        // device's uncaptured error handler.
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = |suffix: &str, wgsl: &str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{} {suffix}", source.label)),
                source: wgpu::ShaderSource::Wgsl(wgsl.into()),
            })
        };
        let vertex = module("vertex", &source.compiled.vertex_wgsl);
        let offscreen_vertex = module("offscreen vertex", &source.compiled.offscreen_vertex_wgsl);
        let fragment = module("fragment", &source.compiled.fragment_wgsl);

        // ── bind group layout ─────────────────────────────────────────────

        let mut entries = Vec::new();
        if let Some(block) = &reflection.uniform_block {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: block.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            });
        }
        for slot in &reflection.textures {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: slot.texture_binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: slot.sampler_binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} bgl", source.label)),
            entries: &entries,
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} pipeline layout", source.label)),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        // ── vertex layout: one buffer slot per input ───────────────────────

        let attributes: Vec<[wgpu::VertexAttribute; 1]> = source
            .layout
            .bindings
            .iter()
            .map(|b| {
                [wgpu::VertexAttribute {
                    format: vertex_format(b.components),
                    offset: 0,
                    shader_location: b.location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = source
            .layout
            .bindings
            .iter()
            .zip(&attributes)
            .map(|(b, attrs)| wgpu::VertexBufferLayout {
                array_stride: b.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let mut pipelines = HashMap::new();
        for &kind in source.destinations {
            let (format, samples) = self.target_format(kind);
            let (vertex_module, front_face) = match kind {
                DestinationKind::Screen => (&vertex, wgpu::FrontFace::Ccw),
                DestinationKind::Texture | DestinationKind::Resolve => (&offscreen_vertex, wgpu::FrontFace::Cw),
            };

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("{} {kind:?} pipeline", source.label)),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex_module,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: topology(source.draw_mode),
                    strip_index_format: source.draw_mode.is_strip().then_some(wgpu::IndexFormat::Uint16),
                    front_face,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: samples,
                    ..Default::default()
                },
                multiview_mask: None,
                cache: None,
            });
            pipelines.insert(kind, pipeline);
        }

        let uniforms = reflection.uniform_block.as_ref().map(|block| {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{} uniforms", source.label)),
                size: u64::from(block.size).max(16).next_multiple_of(16),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            (block.binding, buffer)
        });

        if let Some(error) = pollster::block_on(scope.pop()) {
            return Err(pipeline_error(error.to_string()));
        }

        let handle = ProgramHandle(self.next());
        log::debug!(
            "program '{}': {} pipeline(s), {} vertex buffer(s), {} texture slot(s)",
            source.label,
            pipelines.len(),
            buffers.len(),
            reflection.textures.len()
        );
        self.programs.insert(
            handle,
            GpuProgram {
                label: source.label.to_string(),
                pipelines,
                bind_group_layout,
                uniforms,
                textures: reflection.textures.clone(),
            },
        );
        Ok(handle)
    }

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> Result<BufferHandle, BackendError> {
        Ok(self.create_buffer(label, bytemuck::cast_slice(data), wgpu::BufferUsages::VERTEX))
    }

    fn create_index_buffer(&mut self, label: &str, data: &[u16]) -> Result<BufferHandle, BackendError> {
        Ok(self.create_buffer(label, bytemuck::cast_slice(data), wgpu::BufferUsages::INDEX))
    }

    fn write_vertex_buffer(&mut self, buffer: BufferHandle, data: &[f32]) -> Result<(), BackendError> {
        self.write_buffer(buffer, bytemuck::cast_slice(data))
    }

    fn write_index_buffer(&mut self, buffer: BufferHandle, data: &[u16]) -> Result<(), BackendError> {
        self.write_buffer(buffer, bytemuck::cast_slice(data))
    }

    fn create_texture_target(&mut self, label: &str, size: [u32; 2]) -> Result<TextureHandle, BackendError> {
        let texture = self.create_color_texture(
            label,
            size,
            1,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        )?;
        let target = GpuTexture {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            sampler: create_sampler(&self.gpu, label, TARGET_SAMPLING),
            size,
        };
        let handle = TextureHandle(self.next());
        self.textures.insert(handle, target);
        Ok(handle)
    }

    fn create_resolve_target(&mut self, label: &str, size: [u32; 2]) -> Result<ResolveHandle, BackendError> {
        let texture =
            self.create_color_texture(label, size, RESOLVE_SAMPLES, wgpu::TextureUsages::RENDER_ATTACHMENT)?;
        let handle = ResolveHandle(self.next());
        self.resolves.insert(
            handle,
            GpuResolve {
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
                size,
            },
        );
        Ok(handle)
    }

    fn create_texture(
        &mut self,
        label: &str,
        image: &RgbaImage,
        sampling: Sampling,
    ) -> Result<TextureHandle, BackendError> {
        let size = [image.width(), image.height()];
        let texture = self.create_color_texture(
            label,
            size,
            1,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        )?;

        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size[0]),
                rows_per_image: Some(size[1]),
            },
            extent(size),
        );

        let handle = TextureHandle(self.next());
        self.textures.insert(
            handle,
            GpuTexture {
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
                sampler: create_sampler(&self.gpu, label, sampling),
                size,
            },
        );
        Ok(handle)
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = wgpu::Color {
            r: f64::from(color[0]),
            g: f64::from(color[1]),
            b: f64::from(color[2]),
            a: f64::from(color[3]),
        };
    }

    fn begin_frame(&mut self) -> bool {
        if self.lost {
            return false;
        }
        let size = self.gpu.size();
        if size.width == 0 || size.height == 0 {
            return false;
        }

        match self.gpu.begin_frame() {
            Ok(frame) => {
                self.frame = Some(frame);
                true
            }
            Err(e) => {
                match self.gpu.handle_surface_error(e) {
                    SurfaceErrorAction::Fatal => {
                        log::error!("surface lost beyond recovery");
                        self.lost = true;
                    }
                    action => log::debug!("frame skipped: {action:?}"),
                }
                false
            }
        }
    }

    fn draw(&mut self, destination: Destination, call: &DrawCall<'_>) -> Result<(), BackendError> {
        let Some(frame) = self.frame.as_mut() else {
            return Err(BackendError::Surface(String::from("draw outside of a frame")));
        };
        let program = self.programs.get(&call.program).ok_or(BackendError::UnknownHandle {
            kind: "program",
            id: call.program.0,
        })?;
        let kind = destination.kind();
        let pipeline = program.pipelines.get(&kind).ok_or_else(|| BackendError::Pipeline {
            label: program.label.clone(),
            reason: format!("no pipeline for {kind:?} destination"),
        })?;

        // ── bindings ──────────────────────────────────────────────────────

        let mut entries = Vec::new();
        if let Some((binding, buffer)) = &program.uniforms {
            if !call.uniforms.is_empty() {
                self.gpu.queue().write_buffer(buffer, 0, &padded(call.uniforms));
            }
            entries.push(wgpu::BindGroupEntry {
                binding: *binding,
                resource: buffer.as_entire_binding(),
            });
        }
        for (i, slot) in program.textures.iter().enumerate() {
            let mut handle = call.textures.get(i).copied().flatten();
            if let (Destination::Texture(target), Some(bound)) = (destination, handle)
                && bound == target
            {
                if self.feedback_warned.insert(call.program) {
                    log::warn!(
                        "program '{}': '{}' samples the texture being drawn; it reads the placeholder during the offscreen draw",
                        program.label,
                        slot.name
                    );
                }
                handle = None;
            }
            let texture = handle
                .and_then(|h| self.textures.get(&h))
                .unwrap_or(&self.placeholder);
            entries.push(wgpu::BindGroupEntry {
                binding: slot.texture_binding,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: slot.sampler_binding,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }
        let bind_group = self.gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&program.label),
            layout: &program.bind_group_layout,
            entries: &entries,
        });

        // ── attachment ────────────────────────────────────────────────────

        let (view, size, load) = match destination {
            Destination::Screen { clear } => {
                let size = self.gpu.size();
                let load = if clear {
                    wgpu::LoadOp::Clear(self.clear_color)
                } else {
                    wgpu::LoadOp::Load
                };
                (&frame.view, [size.width, size.height], load)
            }
            Destination::Texture(handle) => {
                let target = self.textures.get(&handle).ok_or(BackendError::UnknownHandle {
                    kind: "texture",
                    id: handle.0,
                })?;
                (&target.view, target.size, wgpu::LoadOp::Load)
            }
            Destination::Resolve(handle) => {
                let target = self.resolves.get(&handle).ok_or(BackendError::UnknownHandle {
                    kind: "resolve target",
                    id: handle.0,
                })?;
                (&target.view, target.size, wgpu::LoadOp::Load)
            }
        };

        let mut vertex_buffers = Vec::with_capacity(call.layout.bindings.len());
        for binding in &call.layout.bindings {
            let buffer = self.buffers.get(&binding.buffer).ok_or(BackendError::UnknownHandle {
                kind: "buffer",
                id: binding.buffer.0,
            })?;
            if binding.offset >= buffer.size {
                return Err(BackendError::BufferOverflow {
                    id: binding.buffer.0,
                    capacity: buffer.size,
                    len: binding.offset,
                });
            }
            vertex_buffers.push(buffer.buffer.slice(binding.offset..));
        }
        let index_buffer = match call.index_buffer {
            Some(handle) => Some(self.buffers.get(&handle).ok_or(BackendError::UnknownHandle {
                kind: "index buffer",
                id: handle.0,
            })?),
            None => None,
        };

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&program.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let viewport = [call.viewport[0].min(size[0]), call.viewport[1].min(size[1])];
        if call.count == 0 || viewport[0] == 0 || viewport[1] == 0 {
            return Ok(());
        }
        rpass.set_viewport(0.0, 0.0, viewport[0] as f32, viewport[1] as f32, 0.0, 1.0);
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        for (slot, slice) in vertex_buffers.into_iter().enumerate() {
            rpass.set_vertex_buffer(slot as u32, slice);
        }
        match index_buffer {
            Some(indices) => {
                rpass.set_index_buffer(indices.buffer.slice(..), wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(0..call.count, 0, 0..1);
            }
            None => rpass.draw(0..call.count, 0..1),
        }
        log::trace!("draw '{}' -> {destination:?}: {} vertices", program.label, call.count);
        Ok(())
    }

    fn resolve(&mut self, source: ResolveHandle, target: TextureHandle) -> Result<(), BackendError> {
        let Some(frame) = self.frame.as_mut() else {
            return Err(BackendError::Surface(String::from("resolve outside of a frame")));
        };
        let resolve = self.resolves.get(&source).ok_or(BackendError::UnknownHandle {
            kind: "resolve target",
            id: source.0,
        })?;
        let texture = self.textures.get(&target).ok_or(BackendError::UnknownHandle {
            kind: "texture",
            id: target.0,
        })?;

        // An empty pass whose only effect is the resolve at its end.
        frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("glint resolve"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &resolve.view,
                resolve_target: Some(&texture.view),
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        Ok(())
    }

    fn end_frame(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.gpu.submit(frame);
        }
    }
}

// ── helpers ───────────────────────────────────────────────────────────────

/// Buffer sizes are kept at a multiple of 4 bytes, never zero.
fn aligned(len: u64) -> u64 {
    len.max(4).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
}

fn padded(bytes: &[u8]) -> Vec<u8> {
    let mut data = bytes.to_vec();
    data.resize(bytes.len().next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT as usize), 0);
    data
}

fn extent(size: [u32; 2]) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size[0],
        height: size[1],
        depth_or_array_layers: 1,
    }
}

fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn topology(mode: DrawMode) -> wgpu::PrimitiveTopology {
    match mode {
        DrawMode::Points => wgpu::PrimitiveTopology::PointList,
        DrawMode::Lines => wgpu::PrimitiveTopology::LineList,
        DrawMode::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        DrawMode::Triangles => wgpu::PrimitiveTopology::TriangleList,
        DrawMode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

/// `SRC_ALPHA, ONE_MINUS_SRC_ALPHA` on every channel.
fn alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

fn address_mode(wrap: Wrap) -> wgpu::AddressMode {
    match wrap {
        Wrap::Repeat => wgpu::AddressMode::Repeat,
        Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        Wrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

fn filter_mode(filter: Filter) -> wgpu::FilterMode {
    match filter {
        Filter::Nearest => wgpu::FilterMode::Nearest,
        Filter::Linear => wgpu::FilterMode::Linear,
    }
}

fn create_sampler(gpu: &Gpu, label: &str, sampling: Sampling) -> wgpu::Sampler {
    gpu.device().create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address_mode(sampling.wrap_s),
        address_mode_v: address_mode(sampling.wrap_t),
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter_mode(sampling.mag),
        min_filter: filter_mode(sampling.min),
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

/// 1x1 opaque black, sampled by units that have no texture yet.
fn placeholder_texture(gpu: &Gpu) -> GpuTexture {
    let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("glint placeholder"),
        size: extent([1, 1]),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    gpu.queue().write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &[0, 0, 0, 255],
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: Some(1),
        },
        extent([1, 1]),
    );

    GpuTexture {
        view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        sampler: create_sampler(gpu, "glint placeholder", Sampling::default()),
        size: [1, 1],
    }
}
