//! The graphics boundary.
//!
//! [`Renderer`](crate::render::Renderer) never talks to a graphics API
//! directly. It drives an implementation of [`Gpu`] through a fixed sequence
//! of calls: the setup calls in [`Renderer::init`](crate::render::Renderer::init)
//! are fallible and checked one by one, while the per-frame calls are
//! fire-and-forget. [`crate::context::Context`] is the wgpu implementation.
//!
//! Resources are named by small typed handles, the way a classic graphics API
//! names them, so an implementation is free to store them however it likes.

use crate::{
    config::PixelFormatRequest,
    error::{GpuFault, ShaderFault},
};

/// Names every implementation must resolve before any shader is built.
///
/// Each name stands for one capability the renderer relies on.
pub const REQUIRED_ENTRY_POINTS: [&str; 10] = [
    "create_shader",
    "link_program",
    "create_buffer",
    "buffer_data",
    "vertex_attrib_pointer",
    "vertex_attrib_divisor",
    "uniform_block",
    "tex_image_2d",
    "depth_func",
    "draw_arrays_instanced",
];

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub u32);
    };
}

handle!(
    /// A compiled shader stage.
    ShaderId
);
handle!(
    /// A linked program.
    ProgramId
);
handle!(BufferId);
handle!(TextureId);
handle!(
    /// Binds vertex streams to the attribute slots of the program.
    VertexArrayId
);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Written once at init.
    StaticVertices,
    /// Rewritten every frame.
    DynamicInstances,
}

/// Which attribute slots a buffer feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexStream {
    /// Position and texture coordinate, advancing per vertex.
    Mesh,
    /// One scale per instance.
    InstanceScale,
}

/// A rendering context bound to one presentation surface.
pub trait Gpu {
    /// Backend-specific description of a chosen pixel format.
    type PixelFormat;

    fn choose_pixel_format(&mut self, request: &PixelFormatRequest) -> Result<Self::PixelFormat, GpuFault>;
    fn set_pixel_format(&mut self, format: Self::PixelFormat) -> Result<(), GpuFault>;
    fn create_context(&mut self) -> Result<(), GpuFault>;
    fn make_current(&mut self) -> Result<(), GpuFault>;
    /// Current drawable size in pixels.
    fn surface_size(&self) -> Result<(u32, u32), GpuFault>;
    /// Vendor, renderer, API version and shading language version.
    fn adapter_info(&self) -> Vec<String>;
    /// `true` if the capability behind `name` is available.
    fn resolve_entry_point(&mut self, name: &str) -> bool;

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, ShaderFault>;
    /// Links the two stages. The shader objects may be released afterwards.
    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, ShaderFault>;
    fn delete_shader(&mut self, shader: ShaderId);

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, GpuFault>;
    fn create_buffer(&mut self, kind: BufferKind, size: u64) -> Result<BufferId, GpuFault>;
    /// Checked upload, used during setup.
    fn upload_buffer(&mut self, buffer: BufferId, data: &[u8]) -> Result<(), GpuFault>;
    fn bind_vertex_stream(
        &mut self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
        stream: VertexStream,
    ) -> Result<(), GpuFault>;
    fn create_texture(&mut self, width: u32, height: u32) -> Result<TextureId, GpuFault>;
    /// Uploads tightly packed BGRA rows, first row first.
    fn upload_texture(&mut self, texture: TextureId, bgra: &[u8]) -> Result<(), GpuFault>;
    /// Makes `texture` the one sampled by `program`.
    fn attach_texture(&mut self, program: ProgramId, texture: TextureId) -> Result<(), GpuFault>;

    fn set_viewport(&mut self, width: u32, height: u32);
    fn clear(&mut self, color: [f32; 4]);
    fn set_depth_test(&mut self, enabled: bool);
    fn bind_texture(&mut self, texture: TextureId);
    fn use_program(&mut self, program: ProgramId);
    /// Column-major model matrix.
    fn set_model_matrix(&mut self, program: ProgramId, columns: &[[f32; 4]; 4]);
    /// Packed status grid, four glyphs per word.
    fn set_status_text(&mut self, program: ProgramId, words: &[u32]);
    /// Unchecked upload, used every frame.
    fn write_buffer(&mut self, buffer: BufferId, data: &[u8]);
    fn draw_instanced(&mut self, vertex_array: VertexArrayId, vertices: u32, instances: u32);
    fn present(&mut self);

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);
    fn delete_buffer(&mut self, buffer: BufferId);
    fn destroy_context(&mut self);
}
