//! Per-instance data for the cube draw call.
//!
//! Every instance carries a single scale. The whole active range shares one
//! value per frame, so the buffer exists to be uploaded rather than to vary.

use crate::{config::BASELINE_SCALE, data_structures::mesh::Vertex};

/**
 * The raw instance as stored on the GPU.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceScale {
    pub scale: f32,
}

impl Vertex for InstanceScale {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceScale>() as wgpu::BufferAddress,
            // Advance once per instance, not per vertex.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32,
            }],
        }
    }
}

/// Host copy of the instance buffer, allocated once at full capacity.
#[derive(Clone, Debug)]
pub struct InstanceScales {
    scales: Vec<InstanceScale>,
}

impl InstanceScales {
    /// `capacity` slots, each holding the baseline scale.
    pub fn new(capacity: u32) -> Self {
        Self {
            scales: vec![InstanceScale { scale: BASELINE_SCALE }; capacity as usize],
        }
    }

    pub fn capacity(&self) -> u32 {
        self.scales.len() as u32
    }

    /// Sets the first `count` slots to `scale`. Slots past the capacity are
    /// ignored.
    pub fn fill(&mut self, count: u32, scale: f32) {
        let count = (count as usize).min(self.scales.len());
        self.scales[..count].fill(InstanceScale { scale });
    }

    /// The first `count` slots as bytes, ready for upload.
    pub fn bytes(&self, count: u32) -> &[u8] {
        let count = (count as usize).min(self.scales.len());
        bytemuck::cast_slice(&self.scales[..count])
    }

    /// All slots as bytes.
    pub fn all_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.scales)
    }
}
