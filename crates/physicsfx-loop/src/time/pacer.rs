use std::time::Duration;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Fixed-target frame pacing.
///
/// Given the time a tick took, returns how long to wait before the next one.
/// No smoothing and no adaptive rate.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FramePacer {
    target_rate: u32,
    budget: Duration,
}

impl FramePacer {
    /// Creates a pacer for `target_rate` frames per second. A rate of 0 is
    /// treated as 1.
    pub fn new(target_rate: u32) -> Self {
        let target_rate = target_rate.max(1);
        Self {
            target_rate,
            budget: Duration::from_nanos(NANOS_PER_SECOND / u64::from(target_rate)),
        }
    }

    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// Duration of one frame at the target rate.
    pub fn frame_budget(&self) -> Duration {
        self.budget
    }

    /// `max(0, budget - elapsed_this_tick)`.
    pub fn wait_for(&self, elapsed_this_tick: Duration) -> Duration {
        self.budget.saturating_sub(elapsed_this_tick)
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(60)
    }
}
