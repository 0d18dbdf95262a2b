//! Command recording and submission
//!
//! Recording follows the usual explicit-API shape:
//!
//! ```text
//! allocator.reset(completed)      slot is no longer in flight
//!   -> allocator.begin(pipeline)  CommandList borrows the allocator
//!   -> list.clear / bind / draw
//!   -> list.close()               RecordedCommands, immutable
//!   -> queue.submit(recorded)     ownership moves to the GPU timeline
//! ```
//!
//! A [`CommandList`] cannot be submitted before it is closed because only
//! [`RecordedCommands`] is accepted by [`CommandQueue::submit`].

use std::sync::Arc;

use super::backend::GpuBuffer;
use super::error::RenderResult;
use super::geometry::{GeometryBuffer, SubmeshGeometry};
use super::primitives::mesh::VertexAttribute;

/// Opaque handle to a compiled pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineHandle(pub(crate) u32);

impl PipelineHandle {
    /// Raw handle value
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// How index data is assembled into primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveTopology {
    /// Independent triangles, three indices each
    #[default]
    TriangleList,
}

/// Rasterizer fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    /// Filled triangles
    #[default]
    Solid,
    /// Triangle edges only
    Wireframe,
}

/// Description of a graphics pipeline
///
/// Shader programs are referenced by name only; compiling them belongs to the
/// device layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDesc {
    /// Debug name
    pub name: String,
    /// Vertex shader entry
    pub vertex_shader: String,
    /// Pixel shader entry
    pub pixel_shader: String,
    /// Vertex input layout
    pub vertex_layout: &'static [VertexAttribute],
    /// Primitive topology
    pub topology: PrimitiveTopology,
    /// Fill mode
    pub fill_mode: FillMode,
}

/// One recorded GPU command
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Clear the render target and depth buffer
    Clear {
        /// RGBA clear color
        color: [f32; 4],
        /// Depth clear value
        depth: f32,
    },
    /// Bind the vertex and index buffers
    SetGeometry(Arc<GeometryBuffer>),
    /// Bind the per-pass constant buffer of the current frame slot
    SetPassConstants(GpuBuffer),
    /// Bind the per-object constant buffer of the current frame slot
    SetObjectConstants(GpuBuffer),
    /// Indexed draw of one render item
    DrawIndexed {
        /// Element of the bound object constant buffer
        object_index: u32,
        /// Sub-mesh draw arguments
        args: SubmeshGeometry,
        /// Primitive topology
        topology: PrimitiveTopology,
    },
}

/// Recording memory owned by one frame slot
///
/// Resetting is only valid once the GPU finished every list recorded since the
/// previous reset; the frame ring guarantees it by waiting on the slot fence.
#[derive(Debug)]
pub struct CommandAllocator {
    slot: usize,
    submitted_fence: u64,
    capacity: usize,
    resets: u64,
}

impl CommandAllocator {
    /// Create an allocator for the given frame slot
    pub fn new(slot: usize) -> Self {
        Self {
            slot,
            submitted_fence: 0,
            capacity: 0,
            resets: 0,
        }
    }

    /// Frame slot that owns this allocator
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Number of resets so far
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// Reclaim recording memory
    ///
    /// `completed_fence` is the fence value the GPU has finished.
    pub fn reset(&mut self, completed_fence: u64) {
        debug_assert!(
            completed_fence >= self.submitted_fence,
            "allocator of slot {} reset while fence {} is still in flight",
            self.slot,
            self.submitted_fence
        );
        self.resets += 1;
    }

    /// Record the fence value that retires the allocator's last submission
    pub fn mark_submitted(&mut self, fence: u64) {
        self.submitted_fence = fence;
    }

    /// Start recording a command list with the given pipeline bound
    pub fn begin(&mut self, pipeline: PipelineHandle) -> CommandList<'_> {
        let commands = Vec::with_capacity(self.capacity);
        CommandList {
            allocator: self,
            pipeline,
            commands,
        }
    }
}

/// Command list in the recording state
#[derive(Debug)]
pub struct CommandList<'a> {
    allocator: &'a mut CommandAllocator,
    pipeline: PipelineHandle,
    commands: Vec<DrawCommand>,
}

impl CommandList<'_> {
    /// Clear the render target
    pub fn clear(&mut self, color: [f32; 4], depth: f32) {
        self.commands.push(DrawCommand::Clear { color, depth });
    }

    /// Bind the shared geometry
    pub fn set_geometry(&mut self, geometry: Arc<GeometryBuffer>) {
        self.commands.push(DrawCommand::SetGeometry(geometry));
    }

    /// Bind the per-pass constants
    pub fn set_pass_constants(&mut self, buffer: GpuBuffer) {
        self.commands.push(DrawCommand::SetPassConstants(buffer));
    }

    /// Bind the per-object constants
    pub fn set_object_constants(&mut self, buffer: GpuBuffer) {
        self.commands.push(DrawCommand::SetObjectConstants(buffer));
    }

    /// Record an indexed draw
    pub fn draw_indexed(&mut self, object_index: u32, args: SubmeshGeometry, topology: PrimitiveTopology) {
        self.commands.push(DrawCommand::DrawIndexed {
            object_index,
            args,
            topology,
        });
    }

    /// Number of commands recorded so far
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing was recorded yet
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Finish recording
    pub fn close(self) -> RecordedCommands {
        self.allocator.capacity = self.allocator.capacity.max(self.commands.len());
        RecordedCommands {
            slot: self.allocator.slot,
            pipeline: self.pipeline,
            commands: self.commands,
        }
    }
}

/// Closed command list ready for submission
#[derive(Debug, Clone)]
pub struct RecordedCommands {
    slot: usize,
    pipeline: PipelineHandle,
    commands: Vec<DrawCommand>,
}

impl RecordedCommands {
    /// Frame slot the list was recorded for
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Pipeline bound at the start of the list
    pub fn pipeline(&self) -> PipelineHandle {
        self.pipeline
    }

    /// Recorded commands in order
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of indexed draws in the list
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::DrawIndexed { .. }))
            .count()
    }
}

/// GPU submission queue
///
/// Work and signals execute in submission order on the GPU timeline; both
/// calls return without waiting for execution.
pub trait CommandQueue {
    /// Enqueue a closed command list
    fn submit(&self, commands: RecordedCommands) -> RenderResult<()>;

    /// Enqueue a fence signal that fires after all previously submitted work
    fn signal(&self, value: u64) -> RenderResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_produces_commands_in_order() {
        let mut allocator = CommandAllocator::new(2);
        let mut list = allocator.begin(PipelineHandle(7));
        assert!(list.is_empty());

        list.clear([0.0, 0.0, 0.0, 1.0], 1.0);
        list.draw_indexed(
            3,
            SubmeshGeometry { index_count: 36, start_index: 0, base_vertex: 0 },
            PrimitiveTopology::TriangleList,
        );
        assert_eq!(list.len(), 2);

        let recorded = list.close();
        assert_eq!(recorded.slot(), 2);
        assert_eq!(recorded.pipeline(), PipelineHandle(7));
        assert_eq!(recorded.draw_count(), 1);
        assert!(matches!(recorded.commands()[0], DrawCommand::Clear { .. }));
    }

    #[test]
    fn test_allocator_counts_resets() {
        let mut allocator = CommandAllocator::new(0);
        allocator.mark_submitted(4);
        allocator.reset(4);
        allocator.reset(9);
        assert_eq!(allocator.resets(), 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "still in flight")]
    fn test_reset_while_in_flight_panics_in_debug() {
        let mut allocator = CommandAllocator::new(1);
        allocator.mark_submitted(5);
        allocator.reset(4);
    }
}
