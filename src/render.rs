//! The render engine.
//!
//! [`Renderer`] owns everything a frame needs: the graphics context behind
//! the [`Gpu`] boundary, the handles it created, the [`Timer`], the transform
//! set, the host copy of the instance buffer and the status grid. The host
//! calls [`Renderer::init`] once and [`Renderer::draw`] on every redraw.
//!
//! # Lifecycle
//!
//! `Uninitialized -> Initializing -> Ready -> Destroyed`. A failed init leaves
//! the renderer in `Uninitialized`; it can only be dropped. Dropping a
//! renderer releases whatever init managed to create.

use crate::{
    config::{
        BACKGROUND, CUBE_VERTEX_COUNT, LoadLevel, MAX_INSTANCES, PixelFormatRequest, TEXTURE_BYTES_PER_PIXEL,
        TEXTURE_HEIGHT, TEXTURE_WIDTH,
    },
    data_structures::{instance::InstanceScales, mesh::CUBE_VERTICES},
    error::InitError,
    gpu::{
        BufferId, BufferKind, Gpu, ProgramId, REQUIRED_ENTRY_POINTS, ShaderStage, TextureId, VertexArrayId,
        VertexStream,
    },
    pipelines::stress::{FRAGMENT_SHADER, VERTEX_SHADER},
    status::StatusGrid,
    timer::{CycleCounter, Timer, Tsc},
    transform::{TransformSet, scale_at},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
    /// Init failed. Terminal: the renderer never draws and only releases
    /// what the failed attempt created.
    Failed,
    Destroyed,
}

/// Handles created by a successful init.
#[derive(Clone, Copy, Debug)]
struct Resources {
    program: ProgramId,
    vertex_array: VertexArrayId,
    instance_buffer: BufferId,
    texture: TextureId,
}

/// Handles created so far, for release on drop.
#[derive(Debug, Default)]
struct Created {
    context: bool,
    vertex_array: Option<VertexArrayId>,
    buffers: Vec<BufferId>,
}

#[derive(Debug)]
pub struct Renderer<G: Gpu, C: CycleCounter = Tsc> {
    gpu: G,
    timer: Timer<C>,
    state: EngineState,
    resources: Option<Resources>,
    created: Created,
    transforms: TransformSet,
    scales: InstanceScales,
    status: StatusGrid,
    load: u32,
    depth_test: bool,
}

impl<G: Gpu, C: CycleCounter> Renderer<G, C> {
    /// Takes ownership of the context and the timer. Nothing is created until
    /// [`init`](Self::init).
    pub fn new(gpu: G, timer: Timer<C>) -> Self {
        Self {
            gpu,
            timer,
            state: EngineState::Uninitialized,
            resources: None,
            created: Created::default(),
            transforms: TransformSet::new(),
            scales: InstanceScales::new(0),
            status: StatusGrid::new(),
            load: LoadLevel::default().instances(),
            depth_test: false,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn timer(&self) -> &Timer<C> {
        &self.timer
    }

    pub fn status(&self) -> &StatusGrid {
        &self.status
    }

    pub fn transforms(&self) -> &TransformSet {
        &self.transforms
    }

    /// Sets up the context, compiles the shaders and creates every buffer,
    /// texture and vertex array the frames need, then starts the timer.
    ///
    /// `atlas` is the raw BGRA atlas at [`TEXTURE_WIDTH`] x [`TEXTURE_HEIGHT`].
    /// Each step is checked; the first failure is returned and the renderer
    /// moves to [`EngineState::Failed`]. Calls in any state other than
    /// [`EngineState::Uninitialized`] are ignored.
    pub fn init(&mut self, pixel_format: &PixelFormatRequest, atlas: &[u8]) -> Result<(), InitError> {
        if self.state != EngineState::Uninitialized {
            log::warn!("Renderer::init called in state {:?}; ignored", self.state);
            return Ok(());
        }
        self.state = EngineState::Initializing;
        match self.init_steps(pixel_format, atlas) {
            Ok(resources) => {
                self.resources = Some(resources);
                self.state = EngineState::Ready;
                Ok(())
            }
            Err(err) => {
                log::error!("Window initialization failed ({:#x}): {err}", err.code());
                self.state = EngineState::Failed;
                Err(err)
            }
        }
    }

    fn init_steps(&mut self, pixel_format: &PixelFormatRequest, atlas: &[u8]) -> Result<Resources, InitError> {
        let gpu = &mut self.gpu;

        let format = gpu
            .choose_pixel_format(pixel_format)
            .map_err(InitError::ChoosePixelFormat)?;
        gpu.set_pixel_format(format).map_err(InitError::SetPixelFormat)?;
        gpu.create_context().map_err(InitError::CreateContext)?;
        self.created.context = true;
        gpu.make_current().map_err(InitError::ActivateContext)?;
        let (width, height) = gpu.surface_size().map_err(InitError::SurfaceSize)?;
        gpu.set_viewport(width, height);

        let info = gpu.adapter_info();
        for line in &info {
            log::info!("{line}");
        }

        if let Some(name) = REQUIRED_ENTRY_POINTS
            .into_iter()
            .find(|name| !gpu.resolve_entry_point(name))
        {
            return Err(InitError::EntryPoint { name });
        }

        let vertex = gpu
            .compile_shader(ShaderStage::Vertex, VERTEX_SHADER)
            .map_err(InitError::vertex_shader)?;
        let fragment = gpu
            .compile_shader(ShaderStage::Fragment, FRAGMENT_SHADER)
            .map_err(InitError::fragment_shader)?;
        let program = gpu.link_program(vertex, fragment).map_err(InitError::program)?;
        gpu.delete_shader(vertex);
        gpu.delete_shader(fragment);

        let vertex_array = gpu.create_vertex_array().map_err(InitError::CreateVertexArray)?;
        self.created.vertex_array = Some(vertex_array);
        let mesh_bytes: &[u8] = bytemuck::cast_slice(&CUBE_VERTICES);
        let mesh_buffer = gpu
            .create_buffer(BufferKind::StaticVertices, mesh_bytes.len() as u64)
            .map_err(InitError::CreateMeshBuffer)?;
        self.created.buffers.push(mesh_buffer);
        gpu.upload_buffer(mesh_buffer, mesh_bytes).map_err(InitError::UploadMesh)?;
        gpu.bind_vertex_stream(vertex_array, mesh_buffer, VertexStream::Mesh)
            .map_err(InitError::MeshLayout)?;

        let texture = gpu
            .create_texture(TEXTURE_WIDTH, TEXTURE_HEIGHT)
            .map_err(InitError::CreateTexture)?;
        let expected = (TEXTURE_WIDTH * TEXTURE_HEIGHT * TEXTURE_BYTES_PER_PIXEL) as usize;
        if atlas.len() != expected {
            log::warn!("Atlas holds {} bytes, expected {expected}", atlas.len());
        }
        gpu.upload_texture(texture, atlas).map_err(InitError::UploadTexture)?;
        gpu.attach_texture(program, texture).map_err(InitError::BindTexture)?;

        self.scales = InstanceScales::new(MAX_INSTANCES);
        let instance_buffer = gpu
            .create_buffer(BufferKind::DynamicInstances, self.scales.all_bytes().len() as u64)
            .map_err(InitError::CreateInstanceBuffer)?;
        self.created.buffers.push(instance_buffer);
        gpu.upload_buffer(instance_buffer, self.scales.all_bytes())
            .map_err(InitError::UploadInstances)?;
        gpu.bind_vertex_stream(vertex_array, instance_buffer, VertexStream::InstanceScale)
            .map_err(InitError::InstanceLayout)?;

        self.transforms = TransformSet::new();
        self.status = StatusGrid::new();
        self.status.write_adapter_info(info.as_slice());
        self.status.write_labels();

        self.timer.reset_statistics();
        self.timer.start_application();
        self.timer.start_performance();

        Ok(Resources {
            program,
            vertex_array,
            instance_buffer,
            texture,
        })
    }

    /// Renders one frame of `load` cubes plus the status overlay.
    ///
    /// Graphics errors are not checked here. Outside the `Ready` state this
    /// does nothing.
    pub fn draw(&mut self, load: LoadLevel, depth_test: bool) {
        let Some(res) = self.resources.filter(|_| self.state == EngineState::Ready) else {
            log::debug!("draw skipped in state {:?}", self.state);
            return;
        };
        let seconds = self.timer.application_seconds();
        self.load = load.instances();
        self.depth_test = depth_test;

        self.gpu.clear(BACKGROUND);
        self.gpu.set_depth_test(depth_test);
        self.gpu.bind_texture(res.texture);
        self.gpu.use_program(res.program);

        self.transforms.update(seconds);
        self.scales.fill(self.load, scale_at(seconds));
        self.gpu.set_model_matrix(res.program, &self.transforms.model_columns());

        let bytes = self.scales.bytes(self.load);
        self.timer.start_transfer();
        self.gpu.write_buffer(res.instance_buffer, bytes);
        let mbps_current = self.timer.stop_transfer(bytes.len() as u64);

        self.gpu.draw_instanced(res.vertex_array, CUBE_VERTEX_COUNT, self.load);
        self.gpu.present();

        self.status
            .compose_frame(&mut self.timer, self.load, self.depth_test, mbps_current);
        self.gpu.set_status_text(res.program, &self.status.pack());
    }

    /// Forwards a new drawable size. Zero-sized surfaces are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || self.state != EngineState::Ready {
            return;
        }
        self.gpu.set_viewport(width, height);
    }

    /// Restarts the frame and throughput statistics, e.g. after the host
    /// changed the load.
    pub fn reset_statistics(&mut self) {
        self.timer.reset_statistics();
    }
}

impl<G: Gpu, C: CycleCounter> Drop for Renderer<G, C> {
    fn drop(&mut self) {
        if let Some(vertex_array) = self.created.vertex_array.take() {
            self.gpu.delete_vertex_array(vertex_array);
        }
        for buffer in self.created.buffers.drain(..) {
            self.gpu.delete_buffer(buffer);
        }
        if std::mem::take(&mut self.created.context) {
            self.gpu.destroy_context();
        }
        self.resources = None;
        self.state = EngineState::Destroyed;
    }
}
