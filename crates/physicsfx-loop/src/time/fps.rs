use std::time::Duration;

/// Counts frames and yields one rate sample per accumulated second.
///
/// Observability only: nothing in the loop reads the samples back.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    frames: u32,
    accumulated: Duration,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame that took `dt` seconds.
    ///
    /// Returns a frames-per-second sample once at least one second has been
    /// accumulated, then starts a new window.
    pub fn record(&mut self, dt: f32) -> Option<f32> {
        self.frames += 1;
        self.accumulated += Duration::from_secs_f32(dt.max(0.0));

        if self.accumulated < Duration::from_secs(1) {
            return None;
        }

        let sample = self.frames as f32 / self.accumulated.as_secs_f32();
        self.frames = 0;
        self.accumulated = Duration::ZERO;
        Some(sample)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
