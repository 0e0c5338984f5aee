use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::SessionGuard;
use crate::time::{Clock, SystemClock};

/// Coordinator configuration.
#[derive(Clone)]
pub struct LoopConfig {
    /// Frames per second. Zero is treated as one.
    pub target_rate: u32,

    /// Upper bound for the delta handed to `update`. `None` passes the true
    /// elapsed time, including long suspend gaps.
    pub max_delta: Option<Duration>,

    /// Name of the tick thread, where one is spawned.
    pub thread_name: String,

    pub clock: Arc<dyn Clock>,

    /// Guard enforcing one live engine session.
    pub sessions: SessionGuard,
}

impl LoopConfig {
    pub fn with_target_rate(mut self, target_rate: u32) -> Self {
        self.target_rate = target_rate;
        self
    }

    pub fn with_max_delta(mut self, max_delta: Option<Duration>) -> Self {
        self.max_delta = max_delta;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sessions(mut self, sessions: SessionGuard) -> Self {
        self.sessions = sessions;
        self
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_rate: 60,
            max_delta: None,
            thread_name: "physicsfx-tick".to_string(),
            clock: Arc::new(SystemClock),
            sessions: SessionGuard::global(),
        }
    }
}

impl fmt::Debug for LoopConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopConfig")
            .field("target_rate", &self.target_rate)
            .field("max_delta", &self.max_delta)
            .field("thread_name", &self.thread_name)
            .field("clock", &self.clock)
            .field("sessions", &self.sessions)
            .finish()
    }
}
