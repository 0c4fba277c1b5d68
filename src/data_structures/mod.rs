//! GPU-facing data layouts.
//!
//! - `mesh` holds the cube vertices and the [`mesh::Vertex`] layout trait
//! - `instance` holds the per-instance scale and its host-side buffer
//! - `uniform` mirrors the shader's uniform block
//! - `texture` wraps wgpu textures for the atlas and the depth buffer

pub mod instance;
pub mod mesh;
pub mod texture;
pub mod uniform;
