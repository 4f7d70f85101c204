//! Time management utilities
//!
//! Simulation code never reads the wall clock directly; it asks a [`Clock`]
//! so tests and replays can drive time by hand.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Millisecond time source
pub trait Clock {
    /// Milliseconds elapsed since the clock's epoch
    fn now_ms(&self) -> u64;
}

/// Monotonic clock backed by [`Instant`]
pub struct SystemClock {
    epoch: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Create a clock whose epoch is now
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Manually advanced clock
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give another to the simulation.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Create a clock starting at `start_ms`
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    /// Move time forward
    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }

    /// Jump to an absolute time; going backwards is ignored
    pub fn set(&self, now_ms: u64) {
        if now_ms >= self.now.get() {
            self.now.set(now_ms);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Fixed-rate frame counter for headless loops
pub struct FrameTimer {
    delta_time: f32,
    frame_count: u64,
}

impl FrameTimer {
    /// Create a timer ticking at `rate_hz`
    pub fn fixed(rate_hz: f32) -> Self {
        let delta_time = if rate_hz.is_finite() && rate_hz > 0.0 { 1.0 / rate_hz } else { 0.0 };
        Self {
            delta_time,
            frame_count: 0,
        }
    }

    /// Advance one frame and return its delta time in seconds
    pub fn tick(&mut self) -> f32 {
        self.frame_count += 1;
        self.delta_time
    }

    /// Delta time in whole milliseconds, rounded
    pub fn delta_ms(&self) -> u64 {
        // Non-negative and small by construction.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ms = (self.delta_time * 1000.0).round() as u64;
        ms
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
