//! Device abstraction
//!
//! The renderer talks to the GPU only through [`RenderDevice`]: it creates
//! CPU-writable upload buffers, command allocators and pipelines, and it
//! obtains the submission queue and the completion fence. Swap chains and
//! device creation stay outside the crate.

pub mod headless;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::commands::{CommandAllocator, CommandQueue, PipelineDesc, PipelineHandle};
use super::error::RenderResult;
use super::sync::Fence;

pub use headless::{HeadlessConfig, HeadlessDevice, HeadlessQueue, QueueControl, QueueStats};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// CPU-visible memory readable by the GPU timeline
///
/// Cloning yields another handle to the same memory. The CPU writes through
/// the owning upload buffer; submitted commands keep clones for the GPU side.
#[derive(Debug, Clone)]
pub struct GpuBuffer {
    id: u64,
    label: &'static str,
    bytes: Arc<RwLock<Vec<u8>>>,
}

impl GpuBuffer {
    /// Allocate a zero-filled buffer
    pub fn zeroed(label: &'static str, byte_size: usize) -> Self {
        Self {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            label,
            bytes: Arc::new(RwLock::new(vec![0; byte_size])),
        }
    }

    /// Unique buffer id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Debug label
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Size in bytes
    pub fn byte_size(&self) -> usize {
        self.bytes.read().len()
    }

    /// Copy `data` into the buffer at `offset`
    ///
    /// # Panics
    /// Panics if the write runs past the end of the buffer.
    pub fn write(&self, offset: usize, data: &[u8]) {
        let mut bytes = self.bytes.write();
        bytes[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Copy `len` bytes starting at `offset`, or `None` when out of range
    pub fn read(&self, offset: usize, len: usize) -> Option<Vec<u8>> {
        let bytes = self.bytes.read();
        bytes.get(offset..offset.checked_add(len)?).map(<[u8]>::to_vec)
    }
}

impl PartialEq for GpuBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Presentation/device layer seam
pub trait RenderDevice {
    /// Submission queue type
    type Queue: CommandQueue;

    /// Queue that executes command lists and fence signals in order
    fn queue(&self) -> &Self::Queue;

    /// Fence advanced by the queue's signals
    fn fence(&self) -> Arc<dyn Fence>;

    /// Allocate an upload buffer of `byte_size` bytes
    fn create_upload_buffer(&self, label: &'static str, byte_size: usize) -> RenderResult<GpuBuffer>;

    /// Create recording memory owned by one frame slot
    fn create_command_allocator(&self, slot: usize) -> RenderResult<CommandAllocator>;

    /// Create a pipeline state object
    fn create_pipeline(&self, desc: &PipelineDesc) -> RenderResult<PipelineHandle>;
}
