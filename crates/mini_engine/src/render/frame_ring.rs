//! # Frame Resource Ring
//!
//! Lets the CPU record up to N frames ahead of the GPU. Every slot carries
//! the fence value of its last submission; a slot is handed back to the CPU
//! only once the GPU reported that value complete.
//!
//! ```text
//! frame:   1    2    3    4    5
//! slot:    1    2    0    1    2      (N = 3, ring starts before slot 0)
//! fence:   1    2    3    4    5
//!                          ^ begin_frame waits for fence 1
//! ```
//!
//! ## Slot lifecycle
//! - `Idle`: never submitted, or its fence has been reached
//! - `Submitted(f)`: commands reading the slot's buffers may still execute
//!
//! [`FrameResourceRing::begin_frame`] is the only place the frame loop blocks.
//! The wait is bounded by the configured timeout; expiry surfaces as
//! [`RenderError::DeviceLost`].

use std::sync::Arc;
use std::time::Duration;

use super::commands::CommandQueue;
use super::error::{RenderError, RenderResult};
use super::frame_resource::SlotState;
use super::sync::{Fence, WaitOutcome};
use crate::foundation::time::WaitTimer;

/// Counters describing how the ring has been used
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingStats {
    /// Calls to `begin_frame` that returned a slot
    pub frames_begun: u64,
    /// Frames that had to wait for the GPU
    pub stalls: u64,
    /// Total time spent waiting, flushes included
    pub wait_time: Duration,
    /// Longest single wait
    pub longest_wait: Duration,
    /// Most recently issued fence value
    pub last_fence: u64,
}

#[derive(Debug)]
struct Slot<R> {
    resource: R,
    fence: u64,
}

/// Ring of per-frame resources guarded by a fence
pub struct FrameResourceRing<R> {
    slots: Vec<Slot<R>>,
    current: usize,
    next_fence: u64,
    fence: Arc<dyn Fence>,
    timeout: Option<Duration>,
    stats: RingStats,
    waits: WaitTimer,
}

impl<R> FrameResourceRing<R> {
    /// Build a ring over the given slot resources
    ///
    /// The ring size is `resources.len()` and must be at least one. `timeout`
    /// bounds every fence wait; `None` waits forever.
    pub fn new(resources: Vec<R>, fence: Arc<dyn Fence>, timeout: Option<Duration>) -> RenderResult<Self> {
        if resources.is_empty() {
            return Err(RenderError::InvalidConfig(
                "frame resource ring needs at least one slot".to_string(),
            ));
        }

        log::debug!(
            "Creating frame resource ring: {} slots, fence timeout {:?}",
            resources.len(),
            timeout
        );

        Ok(Self {
            slots: resources
                .into_iter()
                .map(|resource| Slot { resource, fence: 0 })
                .collect(),
            current: 0,
            next_fence: 0,
            fence,
            timeout,
            stats: RingStats::default(),
            waits: WaitTimer::new(),
        })
    }

    /// Ring size N
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; a ring has at least one slot
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Advance to the next slot, waiting until the GPU has released it
    ///
    /// # Errors
    /// [`RenderError::DeviceLost`] when the slot's fence is not reached
    /// within the timeout. The ring does not advance; calling `begin_frame`
    /// again waits on the same slot.
    pub fn begin_frame(&mut self) -> RenderResult<&mut R> {
        let next = (self.current + 1) % self.slots.len();
        let target = self.slots[next].fence;

        if target != 0 && self.fence.completed_value() < target {
            self.stats.stalls += 1;
            log::trace!("Slot {} waiting for fence {}", next, target);
            self.wait_for(target)?;
        }

        self.current = next;
        self.stats.frames_begun += 1;
        Ok(&mut self.slots[self.current].resource)
    }

    /// Stamp the current slot with a new fence value and enqueue its signal
    ///
    /// Call after the frame's commands were submitted. Returns the fence value.
    pub fn end_frame<Q: CommandQueue + ?Sized>(&mut self, queue: &Q) -> RenderResult<u64> {
        self.next_fence += 1;
        self.slots[self.current].fence = self.next_fence;
        self.stats.last_fence = self.next_fence;
        queue.signal(self.next_fence)?;
        log::trace!("Slot {} submitted with fence {}", self.current, self.next_fence);
        Ok(self.next_fence)
    }

    /// Wait until the GPU finished everything submitted so far
    pub fn flush<Q: CommandQueue + ?Sized>(&mut self, queue: &Q) -> RenderResult<()> {
        self.next_fence += 1;
        self.stats.last_fence = self.next_fence;
        queue.signal(self.next_fence)?;
        log::debug!("Flushing GPU queue up to fence {}", self.next_fence);
        self.wait_for(self.next_fence)
    }

    fn wait_for(&mut self, target: u64) -> RenderResult<()> {
        let fence = &self.fence;
        let timeout = self.timeout;
        let outcome = self.waits.measure(|| fence.wait_until(target, timeout));
        self.stats.wait_time = self.waits.total();
        self.stats.longest_wait = self.waits.longest();

        match outcome {
            WaitOutcome::Reached => Ok(()),
            WaitOutcome::TimedOut => {
                let timeout = self.timeout.unwrap_or_default();
                log::error!(
                    "Fence {} not reached within {:?} (completed {})",
                    target,
                    timeout,
                    self.fence.completed_value()
                );
                Err(RenderError::DeviceLost {
                    fence: target,
                    timeout,
                })
            }
        }
    }

    /// Index of the current slot
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Resources of the current slot
    pub fn current(&self) -> &R {
        &self.slots[self.current].resource
    }

    /// Mutable resources of the current slot
    pub fn current_mut(&mut self) -> &mut R {
        &mut self.slots[self.current].resource
    }

    /// Fence state of a slot, or `None` for an out-of-range index
    pub fn slot_state(&self, index: usize) -> Option<SlotState> {
        let fence = self.slots.get(index)?.fence;
        if fence == 0 || self.fence.completed_value() >= fence {
            Some(SlotState::Idle)
        } else {
            Some(SlotState::Submitted(fence))
        }
    }

    /// Fence value recorded for a slot (0 = never submitted)
    pub fn slot_fence(&self, index: usize) -> Option<u64> {
        self.slots.get(index).map(|slot| slot.fence)
    }

    /// Highest fence value reported by the GPU
    pub fn completed_fence(&self) -> u64 {
        self.fence.completed_value()
    }

    /// Usage counters
    pub fn stats(&self) -> &RingStats {
        &self.stats
    }

    /// Iterate over every slot's resources
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.slots.iter().map(|slot| &slot.resource)
    }
}
