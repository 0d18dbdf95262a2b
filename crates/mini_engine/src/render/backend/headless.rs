//! Headless device: a simulated GPU running on a worker thread
//!
//! Submissions and signals travel over an unbounded channel to a single
//! worker that executes them strictly in order, which gives the same timeline
//! semantics as a hardware queue:
//!
//! ```text
//! CPU thread                    worker ("gpu-queue")
//! submit(list k)   ──────────▶  execute list k (sleep `latency`)
//! signal(k)        ──────────▶  fence.signal(k)
//! ```
//!
//! Execution reads the bound constant buffers exactly like a GPU would, so
//! tests can observe what the GPU saw. The worker can be paused to hold the
//! timeline still while the CPU runs ahead.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use flume::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use super::{GpuBuffer, RenderDevice};
use crate::core::config::FrameConfig;
use crate::render::commands::{
    CommandAllocator, CommandQueue, DrawCommand, PipelineDesc, PipelineHandle, RecordedCommands,
};
use crate::render::error::{RenderError, RenderResult};
use crate::render::frame_resource::ObjectConstants;
use crate::render::sync::{CpuFence, Fence};

/// Headless device settings
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessConfig {
    /// Time spent executing each command list
    pub latency: Duration,
    /// Largest buffer the device agrees to allocate
    pub max_buffer_bytes: usize,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            max_buffer_bytes: 64 * 1024 * 1024,
        }
    }
}

impl HeadlessConfig {
    /// Take the simulated latency from the frame configuration
    pub fn from_frame_config(frames: &FrameConfig) -> Self {
        Self {
            latency: frames.simulated_gpu_latency(),
            ..Self::default()
        }
    }

    /// Set the per-list execution time
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Set the allocation limit
    #[must_use]
    pub fn with_max_buffer_bytes(mut self, bytes: usize) -> Self {
        self.max_buffer_bytes = bytes;
        self
    }
}

/// Counters describing what the simulated GPU executed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueStats {
    /// Command lists executed
    pub lists_executed: u64,
    /// Indexed draws executed
    pub draws_executed: u64,
    /// Indices consumed by all draws
    pub indices_drawn: u64,
    /// Draws whose arguments or bindings were invalid
    pub invalid_draws: u64,
    /// Fence signals processed
    pub signals_processed: u64,
    /// Geometry bindings executed
    pub geometry_binds: u64,
    /// World matrix rows read for each object index by the most recent list
    pub last_object_reads: Vec<(u32, [[f32; 4]; 4])>,
}

enum QueueOp {
    Execute(RecordedCommands),
    Signal(u64),
    Shutdown,
}

/// Pause switch for the worker
#[derive(Default)]
struct Gate {
    paused: Mutex<bool>,
    changed: Condvar,
}

impl Gate {
    fn set(&self, paused: bool) {
        *self.paused.lock() = paused;
        self.changed.notify_all();
    }

    fn wait_open(&self) {
        let mut paused = self.paused.lock();
        while *paused {
            self.changed.wait(&mut paused);
        }
    }
}

/// Cloneable handle that pauses and resumes the worker from any thread
#[derive(Clone)]
pub struct QueueControl {
    gate: Arc<Gate>,
}

impl QueueControl {
    /// Stop executing work until [`QueueControl::resume`]
    ///
    /// Work already being executed completes; nothing new starts.
    pub fn pause(&self) {
        log::debug!("Headless queue paused");
        self.gate.set(true);
    }

    /// Resume executing queued work
    pub fn resume(&self) {
        log::debug!("Headless queue resumed");
        self.gate.set(false);
    }
}

/// Submission side of the headless device
pub struct HeadlessQueue {
    sender: Sender<QueueOp>,
    gate: Arc<Gate>,
    stats: Arc<Mutex<QueueStats>>,
}

impl HeadlessQueue {
    /// Handle for pausing the worker
    pub fn control(&self) -> QueueControl {
        QueueControl {
            gate: Arc::clone(&self.gate),
        }
    }

    /// Stop executing work until [`HeadlessQueue::resume`]
    pub fn pause(&self) {
        self.control().pause();
    }

    /// Resume executing queued work
    pub fn resume(&self) {
        self.control().resume();
    }

    /// Snapshot of the execution counters
    pub fn stats(&self) -> QueueStats {
        self.stats.lock().clone()
    }

    /// Operations waiting to be executed
    pub fn pending(&self) -> usize {
        self.sender.len()
    }

    fn send(&self, op: QueueOp) -> RenderResult<()> {
        self.sender.send(op).map_err(|_| RenderError::QueueClosed)
    }
}

impl CommandQueue for HeadlessQueue {
    fn submit(&self, commands: RecordedCommands) -> RenderResult<()> {
        log::trace!(
            "Submitting {} commands for slot {}",
            commands.commands().len(),
            commands.slot()
        );
        self.send(QueueOp::Execute(commands))
    }

    fn signal(&self, value: u64) -> RenderResult<()> {
        self.send(QueueOp::Signal(value))
    }
}

/// Device backed by a simulated GPU queue
pub struct HeadlessDevice {
    config: HeadlessConfig,
    queue: HeadlessQueue,
    fence: Arc<CpuFence>,
    pipelines: Mutex<Vec<PipelineDesc>>,
    next_pipeline: AtomicU32,
    worker: Option<JoinHandle<()>>,
}

impl HeadlessDevice {
    /// Start the worker thread
    pub fn new(config: HeadlessConfig) -> RenderResult<Self> {
        let (sender, receiver) = flume::unbounded();
        let gate = Arc::new(Gate::default());
        let stats = Arc::new(Mutex::new(QueueStats::default()));
        let fence = CpuFence::shared();

        let worker = Worker {
            receiver,
            gate: Arc::clone(&gate),
            stats: Arc::clone(&stats),
            fence: Arc::clone(&fence),
            latency: config.latency,
        };
        let handle = std::thread::Builder::new()
            .name("gpu-queue".to_string())
            .spawn(move || worker.run())
            .map_err(|e| RenderError::ResourceCreation {
                call: "HeadlessDevice::new",
                reason: e.to_string(),
            })?;

        log::info!("Headless device started (latency {:?})", config.latency);

        Ok(Self {
            config,
            queue: HeadlessQueue { sender, gate, stats },
            fence,
            pipelines: Mutex::new(Vec::new()),
            next_pipeline: AtomicU32::new(1),
            worker: Some(handle),
        })
    }

    /// Device settings
    pub fn config(&self) -> &HeadlessConfig {
        &self.config
    }

    /// Pipeline description behind a handle
    pub fn pipeline_desc(&self, handle: PipelineHandle) -> Option<PipelineDesc> {
        let index = handle.raw().checked_sub(1)? as usize;
        self.pipelines.lock().get(index).cloned()
    }
}

impl RenderDevice for HeadlessDevice {
    type Queue = HeadlessQueue;

    fn queue(&self) -> &HeadlessQueue {
        &self.queue
    }

    fn fence(&self) -> Arc<dyn Fence> {
        self.fence.clone()
    }

    fn create_upload_buffer(&self, label: &'static str, byte_size: usize) -> RenderResult<GpuBuffer> {
        if byte_size == 0 || byte_size > self.config.max_buffer_bytes {
            return Err(RenderError::ResourceCreation {
                call: "create_upload_buffer",
                reason: format!(
                    "{label}: {byte_size} bytes outside 1..={}",
                    self.config.max_buffer_bytes
                ),
            });
        }
        log::debug!("Allocated upload buffer '{}' ({} bytes)", label, byte_size);
        Ok(GpuBuffer::zeroed(label, byte_size))
    }

    fn create_command_allocator(&self, slot: usize) -> RenderResult<CommandAllocator> {
        Ok(CommandAllocator::new(slot))
    }

    fn create_pipeline(&self, desc: &PipelineDesc) -> RenderResult<PipelineHandle> {
        if desc.vertex_layout.is_empty() {
            return Err(RenderError::ResourceCreation {
                call: "create_pipeline",
                reason: format!("pipeline '{}' has an empty vertex layout", desc.name),
            });
        }
        let handle = PipelineHandle(self.next_pipeline.fetch_add(1, Ordering::Relaxed));
        self.pipelines.lock().push(desc.clone());
        log::debug!("Created pipeline '{}' as {:?}", desc.name, handle);
        Ok(handle)
    }
}

impl Drop for HeadlessDevice {
    fn drop(&mut self) {
        self.queue.resume();
        // A closed channel already stops the worker
        let _ = self.queue.sender.send(QueueOp::Shutdown);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("Headless queue worker panicked");
            }
        }
        log::info!("Headless device stopped");
    }
}

struct Worker {
    receiver: Receiver<QueueOp>,
    gate: Arc<Gate>,
    stats: Arc<Mutex<QueueStats>>,
    fence: Arc<CpuFence>,
    latency: Duration,
}

impl Worker {
    fn run(self) {
        while let Ok(op) = self.receiver.recv() {
            self.gate.wait_open();
            match op {
                QueueOp::Execute(commands) => self.execute(&commands),
                QueueOp::Signal(value) => {
                    // Counters must be visible to whoever wakes on the fence
                    self.stats.lock().signals_processed += 1;
                    self.fence.signal(value);
                    log::trace!("GPU reached fence {}", value);
                }
                QueueOp::Shutdown => break,
            }
        }
        log::debug!("Headless queue worker exiting");
    }

    fn execute(&self, commands: &RecordedCommands) {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        let object_stride = ObjectConstants::element_byte_size();
        let mut geometry = None;
        let mut objects: Option<&GpuBuffer> = None;
        let mut pass_bound = false;
        let mut reads = Vec::new();
        let mut draws = 0;
        let mut indices = 0;
        let mut invalid = 0;
        let mut binds = 0;

        for command in commands.commands() {
            match command {
                DrawCommand::Clear { .. } => {}
                DrawCommand::SetGeometry(buffer) => {
                    geometry = Some(buffer);
                    binds += 1;
                }
                DrawCommand::SetPassConstants(_) => pass_bound = true,
                DrawCommand::SetObjectConstants(buffer) => objects = Some(buffer),
                DrawCommand::DrawIndexed { object_index, args, .. } => {
                    let in_range = geometry.is_some_and(|g| {
                        args.start_index
                            .checked_add(args.index_count)
                            .is_some_and(|end| end as usize <= g.indices().len())
                    });
                    let world = objects.and_then(|buffer| {
                        buffer.read(*object_index as usize * object_stride, std::mem::size_of::<ObjectConstants>())
                    });

                    match (in_range && pass_bound, world) {
                        (true, Some(bytes)) => {
                            let constants: ObjectConstants = bytemuck::pod_read_unaligned(&bytes);
                            reads.push((*object_index, constants.world));
                            draws += 1;
                            indices += u64::from(args.index_count);
                        }
                        _ => {
                            log::warn!(
                                "Invalid draw of object {} in slot {}",
                                object_index,
                                commands.slot()
                            );
                            invalid += 1;
                        }
                    }
                }
            }
        }

        let mut stats = self.stats.lock();
        stats.lists_executed += 1;
        stats.draws_executed += draws;
        stats.indices_drawn += indices;
        stats.invalid_draws += invalid;
        stats.geometry_binds += binds;
        stats.last_object_reads = reads;
    }
}
