//! Error types of the engine.
//!
//! Initialization reports exactly one [`InitError`] naming the step that failed.
//! Every variant maps to a stable numeric code the host can show to the user,
//! and shader failures carry the driver diagnostic text verbatim.
//! Steady-state drawing has no error channel at all; see [`crate::render`].

use thiserror::Error;

/// A failed call across the graphics boundary.
///
/// The message is whatever the backend could tell about the failure, and is
/// only meant for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct GpuFault(pub String);

impl GpuFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A failed shader or program operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderFault {
    /// The object itself could not be created.
    #[error("object could not be created")]
    Create,
    /// The compiler rejected the source. Holds the compiler log.
    #[error("compile error:\n{0}")]
    Compile(String),
    /// The linker rejected the program. Holds the linker log.
    #[error("link error:\n{0}")]
    Link(String),
}

impl ShaderFault {
    fn into_log(self) -> String {
        match self {
            ShaderFault::Create => String::new(),
            ShaderFault::Compile(log) | ShaderFault::Link(log) => log,
        }
    }
}

/// The initialization step that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("no pixel format matches the request: {0}")]
    ChoosePixelFormat(GpuFault),
    #[error("pixel format could not be applied: {0}")]
    SetPixelFormat(GpuFault),
    #[error("rendering context could not be created: {0}")]
    CreateContext(GpuFault),
    #[error("rendering context could not be activated: {0}")]
    ActivateContext(GpuFault),
    #[error("surface size query failed: {0}")]
    SurfaceSize(GpuFault),
    #[error("required entry point `{name}` is unavailable")]
    EntryPoint { name: &'static str },
    #[error("vertex shader could not be created")]
    CreateVertexShader,
    #[error("vertex shader compiling error:\n{log}")]
    CompileVertexShader { log: String },
    #[error("fragment shader could not be created")]
    CreateFragmentShader,
    #[error("fragment shader compiling error:\n{log}")]
    CompileFragmentShader { log: String },
    #[error("shader program could not be created")]
    CreateProgram,
    #[error("shader program linking error:\n{log}")]
    LinkProgram { log: String },
    #[error("vertex array could not be created: {0}")]
    CreateVertexArray(GpuFault),
    #[error("mesh buffer could not be created: {0}")]
    CreateMeshBuffer(GpuFault),
    #[error("mesh upload failed: {0}")]
    UploadMesh(GpuFault),
    #[error("mesh attribute layout failed: {0}")]
    MeshLayout(GpuFault),
    #[error("texture could not be created: {0}")]
    CreateTexture(GpuFault),
    #[error("texture upload failed: {0}")]
    UploadTexture(GpuFault),
    #[error("texture could not be bound to the program: {0}")]
    BindTexture(GpuFault),
    #[error("instance buffer could not be created: {0}")]
    CreateInstanceBuffer(GpuFault),
    #[error("instance upload failed: {0}")]
    UploadInstances(GpuFault),
    #[error("instance attribute layout failed: {0}")]
    InstanceLayout(GpuFault),
}

impl InitError {
    /// Stable code of the failed step, as shown to the user.
    pub fn code(&self) -> u32 {
        match self {
            InitError::ChoosePixelFormat(_) => 0x100,
            InitError::SetPixelFormat(_) => 0x101,
            InitError::CreateContext(_) => 0x102,
            InitError::ActivateContext(_) => 0x103,
            InitError::SurfaceSize(_) => 0x104,
            InitError::EntryPoint { .. } => 0x105,
            InitError::CreateVertexShader => 0x106,
            InitError::CompileVertexShader { .. } => 0x108,
            InitError::CreateFragmentShader => 0x109,
            InitError::CompileFragmentShader { .. } => 0x10B,
            InitError::CreateProgram => 0x10C,
            InitError::LinkProgram { .. } => 0x10E,
            InitError::CreateVertexArray(_) => 0x10F,
            InitError::CreateMeshBuffer(_) => 0x110,
            InitError::UploadMesh(_) => 0x113,
            InitError::MeshLayout(_) => 0x114,
            InitError::CreateTexture(_) => 0x118,
            InitError::UploadTexture(_) => 0x11E,
            InitError::BindTexture(_) => 0x121,
            InitError::CreateInstanceBuffer(_) => 0x124,
            InitError::UploadInstances(_) => 0x126,
            InitError::InstanceLayout(_) => 0x12A,
        }
    }

    /// Compiler or linker output, if this is a shader failure.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            InitError::CompileVertexShader { log }
            | InitError::CompileFragmentShader { log }
            | InitError::LinkProgram { log } => Some(log),
            _ => None,
        }
    }

    pub(crate) fn vertex_shader(fault: ShaderFault) -> Self {
        match fault {
            ShaderFault::Create => InitError::CreateVertexShader,
            other => InitError::CompileVertexShader {
                log: other.into_log(),
            },
        }
    }

    pub(crate) fn fragment_shader(fault: ShaderFault) -> Self {
        match fault {
            ShaderFault::Create => InitError::CreateFragmentShader,
            other => InitError::CompileFragmentShader {
                log: other.into_log(),
            },
        }
    }

    pub(crate) fn program(fault: ShaderFault) -> Self {
        match fault {
            ShaderFault::Create => InitError::CreateProgram,
            other => InitError::LinkProgram {
                log: other.into_log(),
            },
        }
    }
}

/// Why the host gave up before or while running the event loop.
///
/// Each kind maps to the process exit code returned by the binary.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("cycle counter unavailable or calibration failed")]
    Timer,
    #[error("atlas texture unavailable")]
    Texture(#[source] anyhow::Error),
    #[error("event loop could not be created")]
    EventLoop(#[source] anyhow::Error),
    #[error("window could not be created")]
    Window(#[source] anyhow::Error),
    #[error("window initialization failed ({:#x})", .0.code())]
    Init(#[source] InitError),
    #[error("event loop terminated abnormally")]
    Run(#[source] anyhow::Error),
    #[error("async runtime could not be started")]
    Runtime(#[source] anyhow::Error),
}

impl HostError {
    pub fn exit_code(&self) -> u8 {
        match self {
            HostError::Timer => 3,
            HostError::Texture(_) => 4,
            HostError::EventLoop(_) => 5,
            HostError::Window(_) | HostError::Init(_) => 6,
            HostError::Run(_) => 7,
            HostError::Runtime(_) => 8,
        }
    }
}
