//! Mesh representation for procedural geometry
//!
//! Two vertex types live here. [`MeshVertex`] is what the shape generators
//! produce: position and normal only. [`Vertex`] is the GPU-facing layout that
//! adds a per-vertex color once a mesh is packed into a geometry buffer.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Vec3;

/// Vertex emitted by the shape generators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    /// Position in object space
    pub position: Vec3,
    /// Unit surface normal
    pub normal: Vec3,
}

impl MeshVertex {
    /// Create a vertex from raw components
    pub fn new(px: f32, py: f32, pz: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Vec3::new(px, py, pz),
            normal: Vec3::new(nx, ny, nz),
        }
    }

    /// Create a vertex from vectors
    pub fn from_vectors(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

/// CPU-side triangle mesh
///
/// Triangles are listed clockwise when viewed from the side the normal points
/// to, which is the front-face winding of the left-handed pipeline.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// Vertex data
    pub vertices: Vec<MeshVertex>,

    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create a new mesh
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of triangles in the index list
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over triangles as vertex triples
    pub fn triangles(&self) -> impl Iterator<Item = [&MeshVertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }
}

/// GPU vertex: position, normal and color
///
/// # Memory Layout
/// `#[repr(C)]` with only `f32` fields, 40 bytes, no padding. The offsets are
/// published in [`VERTEX_LAYOUT`] for the pipeline's input description.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in object space
    pub position: [f32; 3],

    /// Surface normal
    pub normal: [f32; 3],

    /// Linear RGBA color
    pub color: [f32; 4],
}

impl Vertex {
    /// Pack a generated vertex with a color
    pub fn from_mesh(vertex: &MeshVertex, color: [f32; 4]) -> Self {
        Self {
            position: vertex.position.into(),
            normal: vertex.normal.into(),
            color,
        }
    }
}

/// Semantic of one vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexSemantic {
    /// Object-space position
    Position,
    /// Surface normal
    Normal,
    /// Vertex color
    Color,
}

/// One attribute of the vertex input layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// What the attribute carries
    pub semantic: VertexSemantic,
    /// Number of `f32` components
    pub components: u32,
    /// Byte offset inside [`Vertex`]
    pub offset: u32,
}

/// Vertex input layout consumed by the pipeline
pub const VERTEX_LAYOUT: [VertexAttribute; 3] = [
    VertexAttribute {
        semantic: VertexSemantic::Position,
        components: 3,
        offset: 0,
    },
    VertexAttribute {
        semantic: VertexSemantic::Normal,
        components: 3,
        offset: 12,
    },
    VertexAttribute {
        semantic: VertexSemantic::Color,
        components: 4,
        offset: 24,
    },
];
