//! Frame requests and interval timers, driven by explicit `tick(now)` calls.

use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;

/// A coalescing "render on the next frame" flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameRequest {
    requested: bool,
}

impl FrameRequest {
    pub fn request(&mut self) {
        self.requested = true;
    }

    pub fn cancel(&mut self) {
        self.requested = false;
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// Consume the request, returning whether one was pending.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.requested)
    }
}

/// A repeating timer. It arms on the first poll after `start` and fires
/// once per elapsed interval from then on.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval: Duration,
    running: bool,
    next_due: Option<Instant>,
}

impl IntervalTimer {
    pub fn new(interval: Duration) -> Self {
        Self { interval, running: false, next_due: None }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the timer. Has no effect if it is already running.
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.next_due = None;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of intervals that elapsed up to `now`.
    pub fn poll(&mut self, now: Instant) -> u32 {
        if !self.running {
            return 0;
        }

        let Some(due) = self.next_due else {
            self.next_due = Some(now + self.interval);
            return 0;
        };

        if now < due {
            return 0;
        }

        if self.interval.is_zero() {
            self.next_due = Some(now);
            return 1;
        }

        let behind = now.duration_since(due).as_nanos() / self.interval.as_nanos();
        let fired = u32::try_from(behind.saturating_add(1)).unwrap_or(u32::MAX);
        self.next_due = Some(due + self.interval.saturating_mul(fired));
        fired
    }
}
