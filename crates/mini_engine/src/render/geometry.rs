//! Shared immutable geometry
//!
//! All shapes of the scene are concatenated into one vertex buffer and one
//! index buffer. Each shape is then addressed by its [`ShapeKind`] and drawn
//! with the index count, start index and base vertex recorded at build time.

use std::collections::HashMap;

use super::primitives::mesh::{MeshData, Vertex};

/// Shapes the sample knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Axis-aligned box
    Box,
    /// Flat ground grid
    Grid,
    /// Square pyramid
    Pyramid,
}

/// Draw arguments of one sub-mesh inside a [`GeometryBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmeshGeometry {
    /// Number of indices to draw
    pub index_count: u32,
    /// First index in the shared index buffer
    pub start_index: u32,
    /// Value added to each index before fetching the vertex
    pub base_vertex: i32,
}

/// Incrementally concatenates meshes into a [`GeometryBuffer`]
#[derive(Debug, Default)]
pub struct GeometryBuilder {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    submeshes: HashMap<ShapeKind, SubmeshGeometry>,
}

impl GeometryBuilder {
    /// Start an empty geometry with a debug name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a mesh, coloring every vertex, and register it under `kind`
    ///
    /// Adding the same kind twice replaces the earlier draw arguments; the
    /// earlier vertices stay in the buffer unused.
    #[must_use]
    pub fn add(mut self, kind: ShapeKind, mesh: &MeshData, color: [f32; 4]) -> Self {
        let submesh = SubmeshGeometry {
            index_count: mesh.indices.len() as u32,
            start_index: self.indices.len() as u32,
            base_vertex: self.vertices.len() as i32,
        };

        self.vertices
            .extend(mesh.vertices.iter().map(|v| Vertex::from_mesh(v, color)));
        self.indices.extend_from_slice(&mesh.indices);

        if self.submeshes.insert(kind, submesh).is_some() {
            log::warn!("Geometry '{}' replaced draw args for {:?}", self.name, kind);
        }
        self
    }

    /// Freeze the accumulated data
    pub fn build(self) -> GeometryBuffer {
        log::debug!(
            "Built geometry '{}': {} vertices, {} indices, {} submeshes",
            self.name,
            self.vertices.len(),
            self.indices.len(),
            self.submeshes.len()
        );
        GeometryBuffer {
            name: self.name,
            vertices: self.vertices,
            indices: self.indices,
            submeshes: self.submeshes,
        }
    }
}

/// Immutable vertex and index data shared by all render items
#[derive(Debug)]
pub struct GeometryBuffer {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    submeshes: HashMap<ShapeKind, SubmeshGeometry>,
}

impl GeometryBuffer {
    /// Debug name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All vertices
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All indices (32-bit)
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Size of one vertex in bytes
    pub fn vertex_stride(&self) -> usize {
        std::mem::size_of::<Vertex>()
    }

    /// Size of the vertex buffer in bytes
    pub fn vertex_buffer_byte_size(&self) -> usize {
        self.vertices.len() * self.vertex_stride()
    }

    /// Size of the index buffer in bytes
    pub fn index_buffer_byte_size(&self) -> usize {
        self.indices.len() * std::mem::size_of::<u32>()
    }

    /// Raw vertex bytes for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Draw arguments for a shape, if it was added
    pub fn submesh(&self, kind: ShapeKind) -> Option<SubmeshGeometry> {
        self.submeshes.get(&kind).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::primitives::ShapeBuilder;

    #[test]
    fn test_submeshes_are_laid_out_back_to_back() {
        let geometry = GeometryBuilder::new("shapes")
            .add(ShapeKind::Box, &ShapeBuilder::create_box(1.0, 1.0, 1.0), [1.0; 4])
            .add(ShapeKind::Grid, &ShapeBuilder::create_grid(10.0, 10.0, 3, 3), [0.5; 4])
            .build();

        let cube = geometry.submesh(ShapeKind::Box).expect("box added");
        let grid = geometry.submesh(ShapeKind::Grid).expect("grid added");

        assert_eq!(cube, SubmeshGeometry { index_count: 36, start_index: 0, base_vertex: 0 });
        assert_eq!(grid, SubmeshGeometry { index_count: 24, start_index: 36, base_vertex: 24 });
        assert!(geometry.submesh(ShapeKind::Pyramid).is_none());

        assert_eq!(geometry.vertices().len(), 33);
        assert_eq!(geometry.vertex_buffer_byte_size(), 33 * 40);
        assert_eq!(geometry.index_bytes().len(), geometry.index_buffer_byte_size());
    }

    #[test]
    fn test_vertices_take_submesh_color() {
        let geometry = GeometryBuilder::new("colored")
            .add(ShapeKind::Pyramid, &ShapeBuilder::create_pyramid(1.0, 1.0, 1.0), [1.0, 0.0, 0.0, 1.0])
            .build();
        assert!(geometry.vertices().iter().all(|v| v.color == [1.0, 0.0, 0.0, 1.0]));
    }
}
