use wgpu::util::DeviceExt;

use crate::geometry::CubeMesh;

/// GPU-resident cube geometry: one vertex buffer per attribute plus the
/// index buffer. Uploaded once at start-up and immutable afterwards.
pub(crate) struct GeometryBuffers {
    positions: wgpu::Buffer,
    normals: wgpu::Buffer,
    texcoords: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl GeometryBuffers {
    pub(crate) fn upload(device: &wgpu::Device, mesh: &CubeMesh) -> Self {
        let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube positions"),
            contents: bytemuck::cast_slice(&mesh.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let normals = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube normals"),
            contents: bytemuck::cast_slice(&mesh.normals),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let texcoords = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube texcoords"),
            contents: bytemuck::cast_slice(&mesh.texcoords),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            positions,
            normals,
            texcoords,
            indices,
            index_count: mesh.index_count(),
        }
    }

    /// Binds every attribute buffer and the index buffer for one draw.
    ///
    /// Slots 0/1/2 correspond to the vertex buffer layouts the pipeline was
    /// linked with; there is exactly one mesh and one pipeline, both built
    /// from the same reflected interface.
    pub(crate) fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.positions.slice(..));
        pass.set_vertex_buffer(1, self.normals.slice(..));
        pass.set_vertex_buffer(2, self.texcoords.slice(..));
        pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint16);
    }

    pub(crate) fn index_count(&self) -> u32 {
        self.index_count
    }
}
