//! The wgpu implementation of [`Gpu`].
//!
//! [`Context`] is built in stages that follow the setup calls of the
//! [`Gpu`] trait: the adapter is picked by `choose_pixel_format`, the device
//! is requested by `create_context` and the surface is configured by
//! `make_current`. Every creation call after that runs inside a pair of wgpu
//! error scopes so a failure comes back as a value instead of a panic in the
//! uncaptured error handler.
//!
//! Per-frame calls only record state. [`Gpu::present`] replays the recorded
//! draws in a single render pass and presents the frame.

use std::{collections::HashMap, sync::Arc};

use tokio::runtime::Handle;
use winit::window::Window;

use crate::{
    config::{MAX_INSTANCES, PixelFormatRequest, TEXTURE_HEIGHT, TEXTURE_WIDTH},
    data_structures::{instance::InstanceScale, mesh::MeshVertex, texture::Texture, uniform::Globals},
    error::{GpuFault, ShaderFault},
    gpu::{BufferId, BufferKind, Gpu, ProgramId, ShaderId, ShaderStage, TextureId, VertexArrayId, VertexStream},
    pipelines::stress::{mk_stress_pipeline, stress_bind_group, stress_bind_group_layout},
};

/// Formats and presentation settings picked for the window surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfacePixelFormat {
    pub color: wgpu::TextureFormat,
    pub depth: wgpu::TextureFormat,
    pub present_mode: wgpu::PresentMode,
    pub alpha_mode: wgpu::CompositeAlphaMode,
    pub frame_latency: u32,
}

#[derive(Debug)]
struct Program {
    layout: wgpu::BindGroupLayout,
    globals: wgpu::Buffer,
    /// Indexed by the depth test flag.
    pipelines: [wgpu::RenderPipeline; 2],
    bind_groups: HashMap<TextureId, wgpu::BindGroup>,
}

#[derive(Debug, Default)]
struct VertexArray {
    mesh: Option<BufferId>,
    instances: Option<BufferId>,
}

#[derive(Clone, Copy, Debug)]
struct DrawCall {
    program: ProgramId,
    texture: TextureId,
    vertex_array: VertexArrayId,
    depth_test: bool,
    vertices: u32,
    instances: u32,
}

#[derive(Debug, Default)]
struct Frame {
    clear: Option<wgpu::Color>,
    depth_test: bool,
    texture: Option<TextureId>,
    program: Option<ProgramId>,
    draws: Vec<DrawCall>,
}

/// Everything that lives on the device.
#[derive(Debug)]
struct Live {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_format: wgpu::TextureFormat,
    depth_texture: Option<Texture>,
    shaders: Vec<Option<wgpu::ShaderModule>>,
    programs: Vec<Program>,
    buffers: Vec<Option<wgpu::Buffer>>,
    textures: Vec<Texture>,
    vertex_arrays: Vec<Option<VertexArray>>,
    frame: Frame,
}

impl Live {
    fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.0 as usize)
    }

    fn reconfigure(&mut self, surface: &wgpu::Surface<'static>) {
        surface.configure(&self.device, &self.config);
        self.depth_texture = Some(Texture::create_depth_texture(
            &self.device,
            [self.config.width, self.config.height],
            self.depth_format,
            "depth_texture",
        ));
    }
}

pub struct Context {
    window: Arc<Window>,
    runtime: Handle,
    vsync: bool,
    instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    adapter: Option<wgpu::Adapter>,
    pixel_format: Option<SurfacePixelFormat>,
    live: Option<Live>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("vsync", &self.vsync)
            .field("pixel_format", &self.pixel_format)
            .field("live", &self.live.is_some())
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Creates the instance and the window surface. Nothing else touches the
    /// GPU until the setup calls of [`Gpu`] run.
    ///
    /// `runtime` drives the futures wgpu hands back during setup.
    pub fn new(window: Arc<Window>, runtime: Handle, vsync: bool) -> anyhow::Result<Self> {
        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });
        let surface = instance.create_surface(window.clone())?;

        Ok(Self {
            window,
            runtime,
            vsync,
            instance,
            surface,
            adapter: None,
            pixel_format: None,
            live: None,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    fn live(&self) -> Result<&Live, GpuFault> {
        self.live.as_ref().ok_or_else(|| GpuFault::new("no device"))
    }

    fn live_mut(&mut self) -> Result<&mut Live, GpuFault> {
        self.live.as_mut().ok_or_else(|| GpuFault::new("no device"))
    }

    fn adapter(&self) -> Result<&wgpu::Adapter, GpuFault> {
        self.adapter.as_ref().ok_or_else(|| GpuFault::new("no adapter"))
    }
}

/// Runs `op` inside validation and out-of-memory error scopes.
fn scoped<T>(runtime: &Handle, device: &wgpu::Device, op: impl FnOnce(&wgpu::Device) -> T) -> Result<T, wgpu::Error> {
    let out_of_memory = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let validation = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = op(device);
    let validation = runtime.block_on(validation.pop());
    let out_of_memory = runtime.block_on(out_of_memory.pop());
    match validation.or(out_of_memory) {
        Some(error) => Err(error),
        None => Ok(value),
    }
}

fn fault(error: wgpu::Error) -> GpuFault {
    GpuFault::new(error.to_string())
}

fn vendor_name(vendor: u32) -> String {
    match vendor {
        0x1002 => "AMD".to_owned(),
        0x10DE => "NVIDIA".to_owned(),
        0x8086 => "Intel".to_owned(),
        0x106B => "Apple".to_owned(),
        0x13B5 => "ARM".to_owned(),
        0x5143 => "Qualcomm".to_owned(),
        0 => "Unknown vendor".to_owned(),
        other => format!("Vendor {other:#06x}"),
    }
}

impl Gpu for Context {
    type PixelFormat = SurfacePixelFormat;

    fn choose_pixel_format(&mut self, request: &PixelFormatRequest) -> Result<SurfacePixelFormat, GpuFault> {
        let adapter = self
            .runtime
            .block_on(self.instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&self.surface),
                force_fallback_adapter: false,
            }))
            .map_err(|e| GpuFault::new(e.to_string()))?;

        let caps = self.surface.get_capabilities(&adapter);
        let color = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| GpuFault::new("surface supports no color format"))?;
        let depth = if request.depth_bits <= 16 {
            wgpu::TextureFormat::Depth16Unorm
        } else {
            wgpu::TextureFormat::Depth32Float
        };
        log::debug!(
            "Requested {}-bit color and {}-bit depth, picked {color:?} and {depth:?}",
            request.color_bits,
            request.depth_bits
        );

        self.adapter = Some(adapter);
        Ok(SurfacePixelFormat {
            color,
            depth,
            present_mode: if self.vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            frame_latency: if request.double_buffer { 2 } else { 1 },
        })
    }

    fn set_pixel_format(&mut self, format: SurfacePixelFormat) -> Result<(), GpuFault> {
        let adapter = self.adapter()?;
        let caps = self.surface.get_capabilities(adapter);
        if !caps.formats.contains(&format.color) {
            return Err(GpuFault::new(format!("surface does not support {:?}", format.color)));
        }
        let depth = adapter.get_texture_format_features(format.depth);
        if !depth.allowed_usages.contains(wgpu::TextureUsages::RENDER_ATTACHMENT) {
            return Err(GpuFault::new(format!("{:?} is not renderable", format.depth)));
        }
        self.pixel_format = Some(format);
        Ok(())
    }

    fn create_context(&mut self) -> Result<(), GpuFault> {
        let adapter = self.adapter()?;
        let format = self
            .pixel_format
            .ok_or_else(|| GpuFault::new("no pixel format"))?;

        // Entry points are resolved against what the adapter offers.
        let (device, queue) = self
            .runtime
            .block_on(adapter.request_device(&wgpu::DeviceDescriptor {
                label: Some("gpu-stress device"),
                required_limits: adapter.limits(),
                ..Default::default()
            }))
            .map_err(|e| GpuFault::new(e.to_string()))?;
        device.on_uncaptured_error(Arc::new(|error: wgpu::Error| {
            log::error!("Uncaptured device error: {error}");
        }));

        let size = self.window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: format.color,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: format.present_mode,
            alpha_mode: format.alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: format.frame_latency,
        };

        self.live = Some(Live {
            device,
            queue,
            config,
            depth_format: format.depth,
            depth_texture: None,
            shaders: Vec::new(),
            programs: Vec::new(),
            buffers: Vec::new(),
            textures: Vec::new(),
            vertex_arrays: Vec::new(),
            frame: Frame::default(),
        });
        Ok(())
    }

    fn make_current(&mut self) -> Result<(), GpuFault> {
        let runtime = self.runtime.clone();
        let surface = &self.surface;
        let live = self.live.as_mut().ok_or_else(|| GpuFault::new("no device"))?;
        let device = live.device.clone();
        scoped(&runtime, &device, |_| live.reconfigure(surface)).map_err(fault)
    }

    fn surface_size(&self) -> Result<(u32, u32), GpuFault> {
        let live = self.live()?;
        match (live.config.width, live.config.height) {
            (0, _) | (_, 0) => Err(GpuFault::new("surface has no area")),
            size => Ok(size),
        }
    }

    fn adapter_info(&self) -> Vec<String> {
        let Some(adapter) = &self.adapter else {
            return Vec::new();
        };
        let info = adapter.get_info();
        vec![
            vendor_name(info.vendor),
            info.name,
            format!("{:?} {} {}", info.backend, info.driver, info.driver_info),
            "GLSL 450 via naga".to_owned(),
        ]
    }

    fn resolve_entry_point(&mut self, name: &str) -> bool {
        let Some(live) = &self.live else {
            return false;
        };
        let limits = live.device.limits();
        let resolved = match name {
            "create_shader" | "link_program" | "buffer_data" | "draw_arrays_instanced" => true,
            "create_buffer" => {
                limits.max_buffer_size >= MAX_INSTANCES as u64 * std::mem::size_of::<InstanceScale>() as u64
            }
            "vertex_attrib_pointer" => {
                limits.max_vertex_attributes >= 3
                    && limits.max_vertex_buffer_array_stride >= std::mem::size_of::<MeshVertex>() as u32
            }
            "vertex_attrib_divisor" => limits.max_vertex_buffers >= 2,
            "uniform_block" => limits.max_uniform_buffer_binding_size >= Globals::SIZE,
            "tex_image_2d" => limits.max_texture_dimension_2d >= TEXTURE_WIDTH.max(TEXTURE_HEIGHT),
            "depth_func" => live
                .depth_texture
                .as_ref()
                .is_some_and(|depth| depth.texture.format() == live.depth_format),
            _ => false,
        };
        if !resolved {
            log::warn!("Entry point {name} is not available on this adapter");
        }
        resolved
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, ShaderFault> {
        let runtime = self.runtime.clone();
        let live = self.live.as_mut().ok_or(ShaderFault::Create)?;
        let naga_stage = match stage {
            ShaderStage::Vertex => wgpu::naga::ShaderStage::Vertex,
            ShaderStage::Fragment => wgpu::naga::ShaderStage::Fragment,
        };
        let module = scoped(&runtime, &live.device, |device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(match stage {
                    ShaderStage::Vertex => "stress.vert",
                    ShaderStage::Fragment => "stress.frag",
                }),
                source: wgpu::ShaderSource::Glsl {
                    shader: source.into(),
                    stage: naga_stage,
                    defines: &[],
                },
            })
        })
        .map_err(|e| ShaderFault::Compile(e.to_string()))?;

        live.shaders.push(Some(module));
        Ok(ShaderId(live.shaders.len() as u32 - 1))
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, ShaderFault> {
        let runtime = self.runtime.clone();
        let live = self.live.as_mut().ok_or(ShaderFault::Create)?;
        let module = |id: ShaderId| {
            live.shaders
                .get(id.0 as usize)
                .and_then(Option::as_ref)
                .ok_or_else(|| ShaderFault::Link(format!("shader {} does not exist", id.0)))
        };
        let (vs, fs) = (module(vertex)?, module(fragment)?);
        let color_format = live.config.format;
        let depth_format = live.depth_format;

        let program = scoped(&runtime, &live.device, |device| {
            let layout = stress_bind_group_layout(device);
            let globals = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Globals Buffer"),
                size: Globals::SIZE,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let pipelines = [false, true]
                .map(|depth_test| mk_stress_pipeline(device, &layout, vs, fs, color_format, depth_format, depth_test));
            Program {
                layout,
                globals,
                pipelines,
                bind_groups: HashMap::new(),
            }
        })
        .map_err(|e| ShaderFault::Link(e.to_string()))?;

        live.queue
            .write_buffer(&program.globals, 0, bytemuck::bytes_of(&Globals::new()));
        live.programs.push(program);
        Ok(ProgramId(live.programs.len() as u32 - 1))
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        if let Some(slot) = self
            .live
            .as_mut()
            .and_then(|live| live.shaders.get_mut(shader.0 as usize))
        {
            *slot = None;
        }
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, GpuFault> {
        let live = self.live_mut()?;
        live.vertex_arrays.push(Some(VertexArray::default()));
        Ok(VertexArrayId(live.vertex_arrays.len() as u32 - 1))
    }

    fn create_buffer(&mut self, kind: BufferKind, size: u64) -> Result<BufferId, GpuFault> {
        let runtime = self.runtime.clone();
        let live = self.live_mut()?;
        let max = live.device.limits().max_buffer_size;
        if size > max {
            return Err(GpuFault::new(format!("{size} bytes exceed the {max} byte buffer limit")));
        }
        let buffer = scoped(&runtime, &live.device, |device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(match kind {
                    BufferKind::StaticVertices => "Mesh Buffer",
                    BufferKind::DynamicInstances => "Instance Buffer",
                }),
                size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })
        .map_err(fault)?;

        live.buffers.push(Some(buffer));
        Ok(BufferId(live.buffers.len() as u32 - 1))
    }

    fn upload_buffer(&mut self, buffer: BufferId, data: &[u8]) -> Result<(), GpuFault> {
        let runtime = self.runtime.clone();
        let live = self.live()?;
        let target = live
            .buffer(buffer)
            .ok_or_else(|| GpuFault::new(format!("buffer {} does not exist", buffer.0)))?;
        if data.len() as u64 > target.size() {
            return Err(GpuFault::new(format!(
                "{} bytes do not fit a {} byte buffer",
                data.len(),
                target.size()
            )));
        }
        scoped(&runtime, &live.device, |_| live.queue.write_buffer(target, 0, data)).map_err(fault)
    }

    fn bind_vertex_stream(
        &mut self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
        stream: VertexStream,
    ) -> Result<(), GpuFault> {
        let live = self.live_mut()?;
        if live.buffer(buffer).is_none() {
            return Err(GpuFault::new(format!("buffer {} does not exist", buffer.0)));
        }
        let array = live
            .vertex_arrays
            .get_mut(vertex_array.0 as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| GpuFault::new(format!("vertex array {} does not exist", vertex_array.0)))?;
        match stream {
            VertexStream::Mesh => array.mesh = Some(buffer),
            VertexStream::InstanceScale => array.instances = Some(buffer),
        }
        Ok(())
    }

    fn create_texture(&mut self, width: u32, height: u32) -> Result<TextureId, GpuFault> {
        let runtime = self.runtime.clone();
        let live = self.live_mut()?;
        let max = live.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(GpuFault::new(format!("{width}x{height} exceeds the {max} texel limit")));
        }
        let texture =
            scoped(&runtime, &live.device, |device| Texture::create_atlas(device, width, height, "atlas"))
                .map_err(fault)?;
        live.textures.push(texture);
        Ok(TextureId(live.textures.len() as u32 - 1))
    }

    fn upload_texture(&mut self, texture: TextureId, bgra: &[u8]) -> Result<(), GpuFault> {
        let runtime = self.runtime.clone();
        let live = self.live()?;
        let target = live
            .texture(texture)
            .ok_or_else(|| GpuFault::new(format!("texture {} does not exist", texture.0)))?;
        if bgra.len() != target.byte_len() {
            return Err(GpuFault::new(format!(
                "{} bytes given, {}x{} texture needs {}",
                bgra.len(),
                target.width(),
                target.height(),
                target.byte_len()
            )));
        }
        scoped(&runtime, &live.device, |_| target.write(&live.queue, bgra)).map_err(fault)
    }

    fn attach_texture(&mut self, program: ProgramId, texture: TextureId) -> Result<(), GpuFault> {
        let runtime = self.runtime.clone();
        let live = self.live_mut()?;
        let atlas = live
            .textures
            .get(texture.0 as usize)
            .ok_or_else(|| GpuFault::new(format!("texture {} does not exist", texture.0)))?;
        let sampler = atlas
            .sampler
            .as_ref()
            .ok_or_else(|| GpuFault::new(format!("texture {} has no sampler", texture.0)))?;
        let target = live
            .programs
            .get(program.0 as usize)
            .ok_or_else(|| GpuFault::new(format!("program {} does not exist", program.0)))?;
        let bind_group = scoped(&runtime, &live.device, |device| {
            stress_bind_group(device, &target.layout, &target.globals, atlas, sampler)
        })
        .map_err(fault)?;
        if let Some(target) = live.programs.get_mut(program.0 as usize) {
            target.bind_groups.insert(texture, bind_group);
        }
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        let surface = &self.surface;
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if width == 0 || height == 0 || (live.config.width, live.config.height) == (width, height) {
            return;
        }
        live.config.width = width;
        live.config.height = height;
        live.reconfigure(surface);
    }

    fn clear(&mut self, color: [f32; 4]) {
        if let Some(live) = self.live.as_mut() {
            let [r, g, b, a] = color.map(f64::from);
            live.frame.clear = Some(wgpu::Color { r, g, b, a });
        }
    }

    fn set_depth_test(&mut self, enabled: bool) {
        if let Some(live) = self.live.as_mut() {
            live.frame.depth_test = enabled;
        }
    }

    fn bind_texture(&mut self, texture: TextureId) {
        if let Some(live) = self.live.as_mut() {
            live.frame.texture = Some(texture);
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        if let Some(live) = self.live.as_mut() {
            live.frame.program = Some(program);
        }
    }

    fn set_model_matrix(&mut self, program: ProgramId, columns: &[[f32; 4]; 4]) {
        if let Some(live) = &self.live
            && let Some(target) = live.programs.get(program.0 as usize)
        {
            live.queue
                .write_buffer(&target.globals, Globals::MODEL_OFFSET, bytemuck::cast_slice(columns));
        }
    }

    fn set_status_text(&mut self, program: ProgramId, words: &[u32]) {
        if let Some(live) = &self.live
            && let Some(target) = live.programs.get(program.0 as usize)
        {
            live.queue
                .write_buffer(&target.globals, Globals::TEXT_OFFSET, bytemuck::cast_slice(words));
        }
    }

    fn write_buffer(&mut self, buffer: BufferId, data: &[u8]) {
        let Some(live) = &self.live else {
            return;
        };
        match live.buffer(buffer) {
            Some(target) if data.len() as u64 <= target.size() => live.queue.write_buffer(target, 0, data),
            _ => log::warn!("Dropped a {} byte write to buffer {}", data.len(), buffer.0),
        }
    }

    fn draw_instanced(&mut self, vertex_array: VertexArrayId, vertices: u32, instances: u32) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        let (Some(program), Some(texture)) = (live.frame.program, live.frame.texture) else {
            log::warn!("Draw without a program or texture skipped");
            return;
        };
        let depth_test = live.frame.depth_test;
        live.frame.draws.push(DrawCall {
            program,
            texture,
            vertex_array,
            depth_test,
            vertices,
            instances,
        });
    }

    fn present(&mut self) {
        let surface = &self.surface;
        let Some(live) = self.live.as_mut() else {
            return;
        };
        let draws = std::mem::take(&mut live.frame.draws);

        let output = match surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(frame) | wgpu::CurrentSurfaceTexture::Suboptimal(frame) => frame,
            wgpu::CurrentSurfaceTexture::Outdated | wgpu::CurrentSurfaceTexture::Lost => {
                live.reconfigure(surface);
                return;
            }
            wgpu::CurrentSurfaceTexture::Timeout | wgpu::CurrentSurfaceTexture::Occluded => return,
            other => {
                log::error!("Failed to acquire the next frame: {other:?}");
                return;
            }
        };
        let Some(depth) = &live.depth_texture else {
            return;
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = live
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: live
                            .frame
                            .clear
                            .map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for draw in &draws {
                let Some(program) = live.programs.get(draw.program.0 as usize) else {
                    continue;
                };
                let Some(bind_group) = program.bind_groups.get(&draw.texture) else {
                    continue;
                };
                let Some(VertexArray {
                    mesh: Some(mesh),
                    instances: Some(instances),
                }) = live
                    .vertex_arrays
                    .get(draw.vertex_array.0 as usize)
                    .and_then(Option::as_ref)
                else {
                    continue;
                };
                let (Some(mesh), Some(instances)) = (live.buffer(*mesh), live.buffer(*instances)) else {
                    continue;
                };
                render_pass.set_pipeline(&program.pipelines[usize::from(draw.depth_test)]);
                render_pass.set_bind_group(0, bind_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.slice(..));
                render_pass.set_vertex_buffer(1, instances.slice(..));
                render_pass.draw(0..draw.vertices, 0..draw.instances);
            }
        }

        live.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if let Some(slot) = self
            .live
            .as_mut()
            .and_then(|live| live.vertex_arrays.get_mut(vertex_array.0 as usize))
        {
            *slot = None;
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(slot) = self
            .live
            .as_mut()
            .and_then(|live| live.buffers.get_mut(buffer.0 as usize))
            && let Some(buffer) = slot.take()
        {
            buffer.destroy();
        }
    }

    fn destroy_context(&mut self) {
        if let Some(live) = self.live.take() {
            log::debug!(
                "Releasing {} programs and {} textures",
                live.programs.len(),
                live.textures.len()
            );
        }
        self.pixel_format = None;
        self.adapter = None;
    }
}
