//! The uniform block shared by both shader stages.

use crate::config::STATUS_WORDS;

/// Mirrors the `Globals` block in the vertex shader (std140).
///
/// The status words are stored as `uvec4`s because std140 pads every scalar
/// array element to 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    pub model: [[f32; 4]; 4],
    pub show_text: [[u32; 4]; STATUS_WORDS / 4],
}

impl Globals {
    pub const SIZE: wgpu::BufferAddress = std::mem::size_of::<Globals>() as wgpu::BufferAddress;
    pub const MODEL_OFFSET: wgpu::BufferAddress = 0;
    pub const TEXT_OFFSET: wgpu::BufferAddress = std::mem::size_of::<[[f32; 4]; 4]>() as wgpu::BufferAddress;

    pub fn new() -> Self {
        Self {
            model: cgmath::Matrix4::from_scale(1.0).into(),
            show_text: [[0; 4]; STATUS_WORDS / 4],
        }
    }
}

impl Default for Globals {
    fn default() -> Self {
        Self::new()
    }
}
