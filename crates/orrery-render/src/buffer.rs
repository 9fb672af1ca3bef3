//! Vertex and index buffers for the orrery's meshes.

use bytemuck::{Pod, Zeroable};

use crate::command::ProgramId;

/// Vertex formats the programs consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLayoutKind {
    /// Planets, moons and rings.
    PositionNormalUv,
    /// The skybox cube.
    Position,
    /// The full-screen quad.
    PositionUv,
}

impl VertexLayoutKind {
    pub fn layout(self) -> wgpu::VertexBufferLayout<'static> {
        match self {
            VertexLayoutKind::PositionNormalUv => VertexPositionNormalUv::layout(),
            VertexLayoutKind::Position => VertexPosition::layout(),
            VertexLayoutKind::PositionUv => VertexPositionUv::layout(),
        }
    }

    /// The vertex format a program's vertex stage reads.
    pub fn for_program(program: ProgramId) -> Self {
        match program {
            ProgramId::Planet | ProgramId::ShadowDepth => VertexLayoutKind::PositionNormalUv,
            ProgramId::Skybox => VertexLayoutKind::Position,
            ProgramId::Composite => VertexLayoutKind::PositionUv,
        }
    }
}

pub struct IndexBuffer {
    pub buffer: wgpu::Buffer,
    pub count: u32,
    pub format: wgpu::IndexFormat,
}

/// A mesh uploaded to the GPU. Meshes without indices are drawn as arrays.
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index: Option<IndexBuffer>,
    pub vertex_count: u32,
    pub layout: VertexLayoutKind,
}

impl MeshBuffer {
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        if let Some(index) = &self.index {
            render_pass.set_index_buffer(index.buffer.slice(..), index.format);
        }
    }

    pub fn index_count(&self) -> Option<u32> {
        self.index.as_ref().map(|index| index.count)
    }
}

/// Index data that can be either u16 or u32 format.
pub enum IndexData<'a> {
    U16(&'a [u16]),
    U32(&'a [u32]),
}

impl IndexData<'_> {
    pub fn format(&self) -> wgpu::IndexFormat {
        match self {
            IndexData::U16(_) => wgpu::IndexFormat::Uint16,
            IndexData::U32(_) => wgpu::IndexFormat::Uint32,
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            IndexData::U16(data) => data.len() as u32,
            IndexData::U32(data) => data.len() as u32,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::U16(data) => bytemuck::cast_slice(data),
            IndexData::U32(data) => bytemuck::cast_slice(data),
        }
    }
}

pub struct BufferAllocator<'a> {
    device: &'a wgpu::Device,
}

impl<'a> BufferAllocator<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }

    pub fn create_mesh<V: Pod>(
        &self,
        label: &str,
        vertices: &[V],
        indices: Option<IndexData<'_>>,
        layout: VertexLayoutKind,
    ) -> MeshBuffer {
        let vertex_buffer = self.create_buffer(
            &format!("{label}-vertices"),
            bytemuck::cast_slice(vertices),
            wgpu::BufferUsages::VERTEX,
        );

        let index = indices.map(|indices| IndexBuffer {
            buffer: self.create_buffer(
                &format!("{label}-indices"),
                indices.as_bytes(),
                wgpu::BufferUsages::INDEX,
            ),
            count: indices.count(),
            format: indices.format(),
        });

        MeshBuffer {
            vertex_buffer,
            index,
            vertex_count: vertices.len() as u32,
            layout,
        }
    }

    fn create_buffer(&self, label: &str, data: &[u8], usage: wgpu::BufferUsages) -> wgpu::Buffer {
        use wgpu::util::DeviceExt;

        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: data,
                usage: usage | wgpu::BufferUsages::COPY_DST,
            })
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPosition {
    pub position: [f32; 3],
}

impl VertexPosition {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexPosition>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Clip-space position with a texture coordinate.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPositionUv {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl VertexPositionUv {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexPositionUv>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Standard vertex format with position, normal, and UV coordinates.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPositionNormalUv {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl VertexPositionNormalUv {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        use wgpu::{VertexAttribute, VertexFormat};

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexPositionNormalUv>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: VertexFormat::Float32x3,
                },
                VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: VertexFormat::Float32x3,
                },
                VertexAttribute {
                    offset: (std::mem::size_of::<[f32; 3]>() * 2) as wgpu::BufferAddress,
                    shader_location: 2,
                    format: VertexFormat::Float32x2,
                },
            ],
        }
    }
}
