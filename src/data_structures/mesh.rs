//! The cube mesh and the vertex layout trait.

/// Types that can be fed to the vertex stage from a buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Position plus texture coordinate, interleaved.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

const fn v(x: f32, y: f32, z: f32, u: f32, w: f32) -> MeshVertex {
    MeshVertex {
        position: [x, y, z],
        tex_coords: [u, w],
    }
}

/// Unit cube centred on the origin: 6 faces of 2 triangles, no index buffer.
pub const CUBE_VERTICES: [MeshVertex; 36] = [
    // back
    v(-0.5, -0.5, -0.5, 0.0, 0.0),
    v(0.5, -0.5, -0.5, 1.0, 0.0),
    v(0.5, 0.5, -0.5, 1.0, 1.0),
    v(0.5, 0.5, -0.5, 1.0, 1.0),
    v(-0.5, 0.5, -0.5, 0.0, 1.0),
    v(-0.5, -0.5, -0.5, 0.0, 0.0),
    // front
    v(-0.5, -0.5, 0.5, 0.0, 1.0),
    v(0.5, -0.5, 0.5, 1.0, 1.0),
    v(0.5, 0.5, 0.5, 1.0, 0.0),
    v(0.5, 0.5, 0.5, 1.0, 0.0),
    v(-0.5, 0.5, 0.5, 0.0, 0.0),
    v(-0.5, -0.5, 0.5, 0.0, 1.0),
    // left
    v(-0.5, 0.5, 0.5, 1.0, 1.0),
    v(-0.5, 0.5, -0.5, 1.0, 0.0),
    v(-0.5, -0.5, -0.5, 0.0, 0.0),
    v(-0.5, -0.5, -0.5, 0.0, 0.0),
    v(-0.5, -0.5, 0.5, 0.0, 1.0),
    v(-0.5, 0.5, 0.5, 1.0, 1.0),
    // right
    v(0.5, 0.5, 0.5, 1.0, 0.0),
    v(0.5, 0.5, -0.5, 1.0, 1.0),
    v(0.5, -0.5, -0.5, 0.0, 1.0),
    v(0.5, -0.5, -0.5, 0.0, 1.0),
    v(0.5, -0.5, 0.5, 0.0, 0.0),
    v(0.5, 0.5, 0.5, 1.0, 0.0),
    // bottom
    v(-0.5, -0.5, -0.5, 0.0, 1.0),
    v(0.5, -0.5, -0.5, 1.0, 1.0),
    v(0.5, -0.5, 0.5, 1.0, 0.0),
    v(0.5, -0.5, 0.5, 1.0, 0.0),
    v(-0.5, -0.5, 0.5, 0.0, 0.0),
    v(-0.5, -0.5, -0.5, 0.0, 1.0),
    // top
    v(-0.5, 0.5, -0.5, 0.0, 0.0),
    v(0.5, 0.5, -0.5, 1.0, 0.0),
    v(0.5, 0.5, 0.5, 1.0, 1.0),
    v(0.5, 0.5, 0.5, 1.0, 1.0),
    v(-0.5, 0.5, 0.5, 0.0, 1.0),
    v(-0.5, 0.5, -0.5, 0.0, 0.0),
];

impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}
