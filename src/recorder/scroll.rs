// Scroll schedule for the demo recording
use std::time::Duration;

/// Time between two scroll steps.
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Scrolls the page top-to-bottom once per recording window, two ticks per
/// second, jumping back to the top once the next step would pass the bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPlan {
    page_height: f64,
    ticks_per_sweep: u64,
}

impl ScrollPlan {
    pub fn new(page_height: f64, duration_seconds: u64) -> Self {
        Self {
            page_height: page_height.max(0.0),
            ticks_per_sweep: duration_seconds.saturating_mul(2).max(1),
        }
    }

    /// Pixels scrolled per tick: `page_height / (2 * duration_seconds)`.
    pub fn step(&self) -> f64 {
        self.page_height / self.ticks_per_sweep as f64
    }

    /// Number of ticks that fit in the recording window.
    pub fn expected_ticks(&self) -> u64 {
        self.ticks_per_sweep
    }

    /// Scroll offset applied on the zero-based `tick`.
    ///
    /// Offsets run `step, 2*step, ..., page_height, 0, step, ...`; computed
    /// from the tick index so float error never accumulates.
    pub fn position_at(&self, tick: u64) -> f64 {
        let k = tick % self.ticks_per_sweep.saturating_add(1) + 1;
        if k > self.ticks_per_sweep {
            0.0
        } else if k == self.ticks_per_sweep {
            self.page_height
        } else {
            self.page_height * k as f64 / self.ticks_per_sweep as f64
        }
    }
}
