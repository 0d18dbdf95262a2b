//! CPU/GPU synchronization primitives
//!
//! The renderer coordinates with the GPU through a single monotonically
//! increasing fence counter:
//!
//! ```text
//! CPU: submit frame k -> signal(k) enqueued on the GPU timeline
//! GPU: [executing frame k ...] -> completed_value() becomes k
//! CPU: wait_until(k) returns once completed_value() >= k
//! ```
//!
//! [`Fence`] is the capability the frame ring depends on. [`CpuFence`]
//! implements it with a mutex and condition variable; the GPU side (the
//! headless queue worker, or a test) advances it through [`Fence::signal`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Result of a bounded fence wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The fence reached the requested value
    Reached,
    /// The timeout expired first
    TimedOut,
}

/// Monotonic completion counter shared between the CPU and the GPU timeline
pub trait Fence: Send + Sync {
    /// Report completion of every value up to and including `value`
    ///
    /// Values lower than the current completed value are ignored.
    fn signal(&self, value: u64);

    /// Highest value reported complete so far
    fn completed_value(&self) -> u64;

    /// Block until `completed_value() >= value` or until `timeout` elapses
    ///
    /// `None` waits without bound.
    fn wait_until(&self, value: u64, timeout: Option<Duration>) -> WaitOutcome;
}

/// Fence backed by a mutex-protected counter and a condition variable
#[derive(Debug, Default)]
pub struct CpuFence {
    completed: Mutex<u64>,
    reached: Condvar,
}

impl CpuFence {
    /// Create a fence with completed value 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shareable fence
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Fence for CpuFence {
    fn signal(&self, value: u64) {
        let mut completed = self.completed.lock();
        if value > *completed {
            *completed = value;
            self.reached.notify_all();
        }
    }

    fn completed_value(&self) -> u64 {
        *self.completed.lock()
    }

    fn wait_until(&self, value: u64, timeout: Option<Duration>) -> WaitOutcome {
        let mut completed = self.completed.lock();
        match timeout {
            None => {
                while *completed < value {
                    self.reached.wait(&mut completed);
                }
                WaitOutcome::Reached
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while *completed < value {
                    if self.reached.wait_until(&mut completed, deadline).timed_out() {
                        return if *completed >= value {
                            WaitOutcome::Reached
                        } else {
                            WaitOutcome::TimedOut
                        };
                    }
                }
                WaitOutcome::Reached
            }
        }
    }
}

impl<F: Fence + ?Sized> Fence for Arc<F> {
    fn signal(&self, value: u64) {
        (**self).signal(value);
    }

    fn completed_value(&self) -> u64 {
        (**self).completed_value()
    }

    fn wait_until(&self, value: u64, timeout: Option<Duration>) -> WaitOutcome {
        (**self).wait_until(value, timeout)
    }
}
