use std::time::Duration;

use crate::time::{FpsCounter, FrameClock};

/// Lifecycle phase of a coordinator.
///
/// Moves strictly `Idle -> Initializing -> Running -> Stopping -> Idle`; a
/// failed `init` returns `Initializing -> Idle`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Initializing,
    Running,
    Stopping,
}

impl Phase {
    pub(crate) fn can_advance_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::Initializing)
                | (Phase::Initializing, Phase::Running)
                | (Phase::Initializing, Phase::Idle)
                | (Phase::Running, Phase::Stopping)
                | (Phase::Stopping, Phase::Idle)
        )
    }
}

/// Timing handed to one tick. Never outlives it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTiming {
    /// Seconds since the previous tick.
    pub delta_time: f32,
    pub target_frame_duration: Duration,
}

/// Per-coordinator mutable state.
#[derive(Debug)]
pub(crate) struct LoopState {
    pub(crate) phase: Phase,
    pub(crate) frame_clock: FrameClock,
    pub(crate) frame_count: u64,
    pub(crate) fps: FpsCounter,
    pub(crate) last_fps: Option<f32>,
    pub(crate) suspended: bool,
    pub(crate) fault: Option<String>,
}

impl LoopState {
    pub(crate) fn new(frame_clock: FrameClock) -> Self {
        Self {
            phase: Phase::Idle,
            frame_clock,
            frame_count: 0,
            fps: FpsCounter::new(),
            last_fps: None,
            suspended: false,
            fault: None,
        }
    }

    pub(crate) fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal phase transition {:?} -> {:?}",
            self.phase,
            next
        );
        log::trace!("phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    /// Whether ticks, resizes and input may reach the engine.
    pub(crate) fn is_live(&self) -> bool {
        self.phase == Phase::Running && self.fault.is_none()
    }

    pub(crate) fn stats(&self) -> LoopStats {
        LoopStats {
            phase: self.phase,
            frame_count: self.frame_count,
            last_fps: self.last_fps,
            fault: self.fault.clone(),
            suspended: self.suspended,
        }
    }
}

/// Snapshot of a coordinator for hosts and diagnostics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoopStats {
    pub phase: Phase,
    /// Ticks completed in the current session.
    pub frame_count: u64,
    /// Most recent once-per-second rate sample.
    pub last_fps: Option<f32>,
    /// Message of the engine failure that stopped ticking, if any.
    pub fault: Option<String>,
    pub suspended: bool,
}
