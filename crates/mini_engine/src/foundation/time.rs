//! Frame clock and fence-wait accounting

use std::time::{Duration, Instant};

/// Game clock feeding the total/delta time fields of the pass constants
///
/// While stopped, `tick` reports a zero delta and paused time is excluded
/// from the total. Frames per second are measured over whole one-second
/// windows.
#[derive(Debug, Clone)]
pub struct Timer {
    base: Instant,
    last_tick: Instant,
    stopped_at: Option<Instant>,
    paused: Duration,
    delta_time: f32,
    frame_count: u64,
    window_start: Instant,
    window_frames: u32,
    fps: f32,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Running clock starting now
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            base: now,
            last_tick: now,
            stopped_at: None,
            paused: Duration::ZERO,
            delta_time: 0.0,
            frame_count: 0,
            window_start: now,
            window_frames: 0,
            fps: 0.0,
        }
    }

    /// Restart from zero, running
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Pause the clock (window lost focus, minimized, ...)
    pub fn stop(&mut self) {
        if self.stopped_at.is_none() {
            self.stopped_at = Some(Instant::now());
        }
    }

    /// Resume after [`Timer::stop`]
    pub fn start(&mut self) {
        if let Some(stopped_at) = self.stopped_at.take() {
            let now = Instant::now();
            self.paused += now - stopped_at;
            self.last_tick = now;
        }
    }

    /// Whether the clock is paused
    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }

    /// Advance one frame
    pub fn tick(&mut self) {
        if self.is_stopped() {
            self.delta_time = 0.0;
            return;
        }

        let now = Instant::now();
        self.delta_time = now.saturating_duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.frame_count += 1;

        self.window_frames += 1;
        let window = now - self.window_start;
        if window >= Duration::from_secs(1) {
            self.fps = self.window_frames as f32 / window.as_secs_f32();
            self.window_frames = 0;
            self.window_start = now;
        }
    }

    /// Seconds between the two most recent ticks
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Seconds since creation or reset, paused time excluded
    pub fn total_time(&self) -> f32 {
        let end = self.stopped_at.unwrap_or(self.last_tick);
        end.saturating_duration_since(self.base)
            .saturating_sub(self.paused)
            .as_secs_f32()
    }

    /// Ticks counted while running
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second over the last completed one-second window
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

/// Accumulates time the CPU spent blocked on fence waits
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaitTimer {
    waits: u64,
    total: Duration,
    longest: Duration,
}

impl WaitTimer {
    /// No waits recorded
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a blocking wait and record how long it took
    pub fn measure<T>(&mut self, wait: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = wait();
        self.record(start.elapsed());
        result
    }

    /// Record one wait of the given length
    pub fn record(&mut self, waited: Duration) {
        self.waits += 1;
        self.total += waited;
        self.longest = self.longest.max(waited);
    }

    /// Number of waits recorded
    pub fn waits(&self) -> u64 {
        self.waits
    }

    /// Total time spent waiting
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Longest single wait
    pub fn longest(&self) -> Duration {
        self.longest
    }
}
