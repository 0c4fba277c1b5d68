use std::{cell::{Cell, RefCell}, rc::Rc};

use gpu_stress::{
    config::PixelFormatRequest,
    error::{GpuFault, ShaderFault},
    gpu::{BufferId, BufferKind, Gpu, ProgramId, ShaderId, ShaderStage, TextureId, VertexArrayId, VertexStream},
    timer::{Calibration, CycleCounter, Timer},
};

/// A cycle counter that only moves when told to.
#[derive(Clone, Debug, Default)]
pub(crate) struct ManualCounter(Rc<Cell<u64>>);

impl ManualCounter {
    pub(crate) fn advance(&self, cycles: u64) {
        self.0.set(self.0.get() + cycles);
    }
}

impl CycleCounter for ManualCounter {
    fn cycles(&self) -> u64 {
        self.0.get()
    }
}

/// Cycles per second of [`millisecond_timer`].
pub(crate) const CYCLES_PER_SECOND: u64 = 1000;

pub(crate) fn millisecond_timer() -> (ManualCounter, Timer<ManualCounter>) {
    let counter = ManualCounter::default();
    let timer = Timer::with_calibration(
        counter.clone(),
        Calibration::from_frequency(CYCLES_PER_SECOND as f64),
    );
    (counter, timer)
}

/// Everything a [`RecordingGpu`] was asked to do.
#[derive(Debug, Default)]
pub(crate) struct GpuLog {
    pub(crate) events: Vec<&'static str>,
    pub(crate) buffers_created: Vec<(BufferKind, u64)>,
    pub(crate) uploads: Vec<(BufferId, Vec<u8>)>,
    pub(crate) textures_created: Vec<(u32, u32)>,
    pub(crate) texture_bytes: usize,
    pub(crate) vertex_arrays_created: u32,
    pub(crate) streams: Vec<(VertexArrayId, BufferId, VertexStream)>,
    pub(crate) viewport: Option<(u32, u32)>,
    pub(crate) clear: Option<[f32; 4]>,
    pub(crate) depth_test: Option<bool>,
    pub(crate) model: Option<[[f32; 4]; 4]>,
    pub(crate) status_text: Option<Vec<u32>>,
    pub(crate) writes: Vec<(BufferId, Vec<u8>)>,
    pub(crate) draws: Vec<(VertexArrayId, u32, u32)>,
    pub(crate) presents: u32,
    pub(crate) deleted_shaders: Vec<ShaderId>,
    pub(crate) deleted_buffers: Vec<BufferId>,
    pub(crate) deleted_vertex_arrays: Vec<VertexArrayId>,
    pub(crate) context_destroyed: bool,
}

/// A [`Gpu`] that records calls into a shared [`GpuLog`] and can be told to
/// fail at a given step.
#[derive(Debug, Default)]
pub(crate) struct RecordingGpu {
    pub(crate) log: Rc<RefCell<GpuLog>>,
    pub(crate) missing_entry_point: Option<&'static str>,
    pub(crate) failing_stage: Option<ShaderStage>,
    pub(crate) link_error: Option<String>,
    pub(crate) fail_texture: bool,
    next_id: u32,
}

impl RecordingGpu {
    pub(crate) fn new() -> (Self, Rc<RefCell<GpuLog>>) {
        let gpu = Self::default();
        let log = gpu.log.clone();
        (gpu, log)
    }

    fn id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn event(&self, name: &'static str) {
        self.log.borrow_mut().events.push(name);
    }
}

impl Gpu for RecordingGpu {
    type PixelFormat = ();

    fn choose_pixel_format(&mut self, _request: &PixelFormatRequest) -> Result<(), GpuFault> {
        self.event("choose_pixel_format");
        Ok(())
    }

    fn set_pixel_format(&mut self, _format: ()) -> Result<(), GpuFault> {
        self.event("set_pixel_format");
        Ok(())
    }

    fn create_context(&mut self) -> Result<(), GpuFault> {
        self.event("create_context");
        Ok(())
    }

    fn make_current(&mut self) -> Result<(), GpuFault> {
        self.event("make_current");
        Ok(())
    }

    fn surface_size(&self) -> Result<(u32, u32), GpuFault> {
        Ok((990, 750))
    }

    fn adapter_info(&self) -> Vec<String> {
        vec![
            "Test vendor".to_owned(),
            "Recording renderer".to_owned(),
            "1.0".to_owned(),
            "GLSL 450".to_owned(),
        ]
    }

    fn resolve_entry_point(&mut self, name: &str) -> bool {
        self.missing_entry_point != Some(name)
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, ShaderFault> {
        assert!(source.starts_with("#version 450"), "{source}");
        if self.failing_stage == Some(stage) {
            return Err(ShaderFault::Compile("0:1: syntax error".to_owned()));
        }
        self.event("compile_shader");
        Ok(ShaderId(self.id()))
    }

    fn link_program(&mut self, _vertex: ShaderId, _fragment: ShaderId) -> Result<ProgramId, ShaderFault> {
        if let Some(log) = &self.link_error {
            return Err(ShaderFault::Link(log.clone()));
        }
        self.event("link_program");
        Ok(ProgramId(self.id()))
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.log.borrow_mut().deleted_shaders.push(shader);
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, GpuFault> {
        self.log.borrow_mut().vertex_arrays_created += 1;
        Ok(VertexArrayId(self.id()))
    }

    fn create_buffer(&mut self, kind: BufferKind, size: u64) -> Result<BufferId, GpuFault> {
        self.log.borrow_mut().buffers_created.push((kind, size));
        Ok(BufferId(self.id()))
    }

    fn upload_buffer(&mut self, buffer: BufferId, data: &[u8]) -> Result<(), GpuFault> {
        self.log.borrow_mut().uploads.push((buffer, data.to_vec()));
        Ok(())
    }

    fn bind_vertex_stream(
        &mut self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
        stream: VertexStream,
    ) -> Result<(), GpuFault> {
        self.log.borrow_mut().streams.push((vertex_array, buffer, stream));
        Ok(())
    }

    fn create_texture(&mut self, width: u32, height: u32) -> Result<TextureId, GpuFault> {
        if self.fail_texture {
            return Err(GpuFault::new("out of texture memory"));
        }
        self.log.borrow_mut().textures_created.push((width, height));
        Ok(TextureId(self.id()))
    }

    fn upload_texture(&mut self, _texture: TextureId, bgra: &[u8]) -> Result<(), GpuFault> {
        self.log.borrow_mut().texture_bytes = bgra.len();
        Ok(())
    }

    fn attach_texture(&mut self, _program: ProgramId, _texture: TextureId) -> Result<(), GpuFault> {
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.log.borrow_mut().viewport = Some((width, height));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.log.borrow_mut().clear = Some(color);
        self.event("clear");
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.log.borrow_mut().depth_test = Some(enabled);
    }

    fn bind_texture(&mut self, _texture: TextureId) {}

    fn use_program(&mut self, _program: ProgramId) {}

    fn set_model_matrix(&mut self, _program: ProgramId, columns: &[[f32; 4]; 4]) {
        self.log.borrow_mut().model = Some(*columns);
        self.event("set_model_matrix");
    }

    fn set_status_text(&mut self, _program: ProgramId, words: &[u32]) {
        self.log.borrow_mut().status_text = Some(words.to_vec());
        self.event("set_status_text");
    }

    fn write_buffer(&mut self, buffer: BufferId, data: &[u8]) {
        self.log.borrow_mut().writes.push((buffer, data.to_vec()));
        self.event("write_buffer");
    }

    fn draw_instanced(&mut self, vertex_array: VertexArrayId, vertices: u32, instances: u32) {
        self.log.borrow_mut().draws.push((vertex_array, vertices, instances));
        self.event("draw_instanced");
    }

    fn present(&mut self) {
        self.log.borrow_mut().presents += 1;
        self.event("present");
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.log.borrow_mut().deleted_vertex_arrays.push(vertex_array);
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.log.borrow_mut().deleted_buffers.push(buffer);
    }

    fn destroy_context(&mut self) {
        self.log.borrow_mut().context_destroyed = true;
    }
}

/// A zeroed atlas of the right size.
pub(crate) fn blank_atlas() -> Vec<u8> {
    use gpu_stress::config::{TEXTURE_BYTES_PER_PIXEL, TEXTURE_HEIGHT, TEXTURE_WIDTH};
    vec![0; (TEXTURE_WIDTH * TEXTURE_HEIGHT * TEXTURE_BYTES_PER_PIXEL) as usize]
}
