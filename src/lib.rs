//! gpu-stress
//!
//! A GPU load generator. It draws up to 1.5 million instanced cubes plus a
//! status overlay rendered by the same shader, re-uploads the instance buffer
//! every frame and reports frame rate and upload throughput measured with a
//! calibrated cycle counter.
//!
//! High-level modules
//! - `config`: workload constants, load levels and runtime settings
//! - `error`: init error codes and host exit kinds
//! - `timer`: cycle counter calibration, latches and running statistics
//! - `transform`: per-frame rotation matrices and the instance scale
//! - `status`: the character grid behind the overlay
//! - `gpu`: the graphics boundary the engine is written against
//! - `render`: the render engine and its lifecycle
//! - `context`: the wgpu implementation of the graphics boundary
//! - `data_structures`: vertex, instance, uniform and texture layouts
//! - `pipelines`: shader sources and pipeline construction
//! - `resources`: atlas loading, the built-in atlas and the status font
//! - `flow`: the winit host and `run()`

pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod gpu;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod status;
pub mod timer;
pub mod transform;

pub use config::{EngineConfig, LoadLevel};
pub use error::{HostError, InitError};
pub use flow::run;
pub use render::{EngineState, Renderer};
