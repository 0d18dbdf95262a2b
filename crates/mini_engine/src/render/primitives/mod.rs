//! Backend-agnostic rendering primitives: camera, vertex types and shape generators

pub mod builder;
pub mod camera;
pub mod mesh;

pub use builder::ShapeBuilder;
pub use camera::{Camera, CameraBasis, ViewState};
pub use mesh::{MeshData, MeshVertex, Vertex, VertexAttribute, VertexSemantic, VERTEX_LAYOUT};
