use std::time::Duration;

use web_time::Instant;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// One clock per coordinator, so that several coordinators never share
/// delta-time state. Timestamps are supplied by the caller's `Clock`.
///
/// Delta time is reported as measured. A process that was suspended for a
/// minute hands the engine a one-minute delta unless a maximum is configured
/// with [`FrameClock::with_max_delta`].
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_max: Option<Duration>,
}

impl FrameClock {
    /// Creates an unclamped clock whose baseline is `now`.
    pub fn starting_at(now: Instant) -> Self {
        Self {
            last: now,
            frame_index: 0,
            dt_max: None,
        }
    }

    /// Clamps every reported delta to at most `dt_max`.
    pub fn with_max_delta(mut self, dt_max: Option<Duration>) -> Self {
        self.dt_max = dt_max;
        self
    }

    /// Resets the clock baseline and the frame counter.
    ///
    /// Called when a session starts so the first delta does not include
    /// initialization time.
    pub fn reset(&mut self, now: Instant) {
        self.last = now;
        self.frame_index = 0;
    }

    /// Timestamp of the previous tick (or of the last reset).
    pub fn last(&self) -> Instant {
        self.last
    }

    /// Advances the clock to `now` and returns a new `FrameTime`.
    pub fn tick(&mut self, now: Instant) -> FrameTime {
        let mut dt = now.saturating_duration_since(self.last);

        if let Some(max) = self.dt_max {
            dt = dt.min(max);
        }

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_time_since_previous_tick() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);

        let a = clock.tick(t0 + Duration::from_millis(16));
        let b = clock.tick(t0 + Duration::from_millis(40));

        assert!((a.dt - 0.016).abs() < 1e-6);
        assert!((b.dt - 0.024).abs() < 1e-6);
        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
    }

    #[test]
    fn long_gap_is_not_clamped_by_default() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);

        let ft = clock.tick(t0 + Duration::from_secs(120));

        assert!((ft.dt - 120.0).abs() < 1e-3);
    }

    #[test]
    fn max_delta_clamps_long_gap() {
        let t0 = Instant::now();
        let mut clock =
            FrameClock::starting_at(t0).with_max_delta(Some(Duration::from_millis(250)));

        let ft = clock.tick(t0 + Duration::from_secs(120));

        assert!((ft.dt - 0.25).abs() < 1e-6);
    }

    #[test]
    fn time_going_backwards_yields_zero() {
        let t0 = Instant::now() + Duration::from_secs(1);
        let mut clock = FrameClock::starting_at(t0);

        let ft = clock.tick(t0 - Duration::from_millis(5));

        assert_eq!(ft.dt, 0.0);
    }
}
