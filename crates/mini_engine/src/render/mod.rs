//! Rendering system
//!
//! Backend-agnostic frame pipeline: camera and procedural geometry, the
//! fenced frame resource ring, the render item registry and the renderer
//! that records and submits one frame at a time. GPU access goes through the
//! [`backend::RenderDevice`] seam; [`backend::HeadlessDevice`] implements it
//! with a simulated queue.

pub mod backend;
pub mod commands;
pub mod error;
pub mod frame_resource;
pub mod frame_ring;
pub mod geometry;
pub mod primitives;
pub mod render_item;
pub mod renderer;
pub mod scene;
pub mod sync;

mod renderer_tests;

pub use backend::{GpuBuffer, HeadlessConfig, HeadlessDevice, RenderDevice};
pub use commands::{CommandQueue, PipelineHandle};
pub use error::{RenderError, RenderResult};
pub use frame_resource::{constant_buffer_byte_size, FrameResource, ObjectConstants, PassConstants, SlotState};
pub use frame_ring::{FrameResourceRing, RingStats};
pub use geometry::{GeometryBuffer, ShapeKind, SubmeshGeometry};
pub use primitives::{Camera, MeshData, ShapeBuilder, ViewState};
pub use render_item::{RenderItemId, RenderItemRegistry};
pub use renderer::Renderer;
pub use scene::{Scene, SceneItems};
pub use sync::{CpuFence, Fence};
