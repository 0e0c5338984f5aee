use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::config::LoopConfig;
use super::error::LoopError;
use super::state::{FrameTiming, LoopState, LoopStats, Phase};
use crate::engine::{CoordinatorId, EngineBoundary, SessionClaim, SimulationControl};
use crate::input::{KeyEvent, PointerEvent};
use crate::surface::SurfaceHandle;
use crate::time::{Clock, FrameClock, FramePacer};

/// Result of one scheduled tick.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TickOutcome {
    /// `update` and `render` ran; `elapsed` is the wall time they took.
    Rendered { elapsed: Duration },
    /// The session is suspended; no engine call was made.
    Skipped,
    /// The session is over (ended, restarted or faulted). Stop scheduling.
    Halted,
}

impl TickOutcome {
    pub fn keeps_going(self) -> bool {
        !matches!(self, TickOutcome::Halted)
    }
}

/// State machine shared by every scheduling adapter.
///
/// Schedulers only decide *when* `tick` runs. Everything that touches the
/// engine goes through here, under the engine lock, so engine calls never
/// overlap no matter which thread a scheduler ticks from.
///
/// Lock order is engine, then state. The state lock is never held across an
/// engine call.
pub struct LoopCore<E> {
    id: CoordinatorId,
    config: LoopConfig,
    pacer: FramePacer,
    state: Mutex<LoopState>,
    engine: Mutex<E>,
    claim: Mutex<Option<SessionClaim>>,
    cancelled: AtomicBool,
    epoch: AtomicU64,
}

impl<E> LoopCore<E>
where
    E: EngineBoundary,
{
    pub fn new(engine: E, config: LoopConfig) -> Self {
        let pacer = FramePacer::new(config.target_rate);
        let frame_clock =
            FrameClock::starting_at(config.clock.now()).with_max_delta(config.max_delta);

        Self {
            id: CoordinatorId::next(),
            pacer,
            state: Mutex::new(LoopState::new(frame_clock)),
            engine: Mutex::new(engine),
            claim: Mutex::new(None),
            cancelled: AtomicBool::new(true),
            epoch: AtomicU64::new(0),
            config,
        }
    }

    pub fn id(&self) -> CoordinatorId {
        self.id
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn pacer(&self) -> FramePacer {
        self.pacer
    }

    pub fn clock(&self) -> &dyn Clock {
        self.config.clock.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    /// `Running` and not faulted.
    pub fn is_running(&self) -> bool {
        self.state.lock().is_live()
    }

    pub fn stats(&self) -> LoopStats {
        self.state.lock().stats()
    }

    /// Whether ticks scheduled for `epoch` must stop.
    pub fn is_cancelled(&self, epoch: u64) -> bool {
        self.cancelled.load(Ordering::SeqCst) || self.epoch.load(Ordering::SeqCst) != epoch
    }

    pub fn engine_info(&self) -> String {
        self.engine.lock().info()
    }

    /// Validates the request, claims the engine session and runs `init`.
    ///
    /// Returns the epoch that ticks of the new session must carry.
    pub(crate) fn begin_session(
        &self,
        surface: Option<&SurfaceHandle>,
        width: u32,
        height: u32,
    ) -> Result<u64, LoopError> {
        let surface = {
            let mut state = self.state.lock();

            if state.phase != Phase::Idle {
                log::warn!(
                    "coordinator {}: start ignored, loop is {:?}",
                    self.id,
                    state.phase
                );
                return Err(LoopError::DoubleStart { phase: state.phase });
            }

            if width == 0 || height == 0 {
                log::warn!("coordinator {}: start with empty size {width}x{height}", self.id);
                return Err(LoopError::InvalidSize { width, height });
            }

            let surface = match surface {
                Some(surface) if surface.is_valid() => surface,
                other => {
                    log::warn!("coordinator {}: invalid surface {other:?}", self.id);
                    return Err(LoopError::InvalidSurface);
                }
            };

            let claim = self.config.sessions.claim(self.id).inspect_err(|e| {
                log::warn!("coordinator {}: {e}", self.id);
            })?;
            *self.claim.lock() = Some(claim);

            state.advance(Phase::Initializing);
            surface
        };

        log::info!(
            "coordinator {}: initializing engine on {surface} ({width}x{height})",
            self.id
        );

        let initialized = {
            let mut engine = self.engine.lock();
            match catch_unwind(AssertUnwindSafe(|| engine.init(surface, width, height))) {
                Ok(ok) => ok,
                Err(payload) => {
                    log::error!(
                        "coordinator {}: engine init panicked: {}",
                        self.id,
                        panic_message(payload.as_ref())
                    );
                    false
                }
            }
        };

        let mut state = self.state.lock();

        if !initialized {
            state.advance(Phase::Idle);
            drop(state);
            self.claim.lock().take();
            log::error!("coordinator {}: engine initialization failed", self.id);
            return Err(LoopError::InitializationFailed);
        }

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancelled.store(false, Ordering::SeqCst);

        state.frame_clock.reset(self.config.clock.now());
        state.frame_count = 0;
        state.fps.reset();
        state.last_fps = None;
        state.suspended = false;
        state.fault = None;
        state.advance(Phase::Running);

        log::info!(
            "coordinator {}: running at {} Hz (session {epoch})",
            self.id,
            self.pacer.target_rate()
        );
        Ok(epoch)
    }

    /// Runs one `update` + `render` pair for the session identified by `epoch`.
    pub fn tick(&self, epoch: u64) -> TickOutcome {
        if self.is_cancelled(epoch) {
            return TickOutcome::Halted;
        }

        let started = self.config.clock.now();
        let mut engine = self.engine.lock();

        let timing = {
            let mut state = self.state.lock();

            if !state.is_live() || self.is_cancelled(epoch) {
                return TickOutcome::Halted;
            }
            if state.suspended {
                return TickOutcome::Skipped;
            }

            let ft = state.frame_clock.tick(started);
            FrameTiming {
                delta_time: ft.dt,
                target_frame_duration: self.pacer.frame_budget(),
            }
        };

        log::trace!("tick dt={:.5}s", timing.delta_time);

        let result = catch_unwind(AssertUnwindSafe(|| {
            engine.update(timing.delta_time)?;
            engine.render()
        }));

        let failure = match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("{e:#}")),
            Err(payload) => Some(format!("panic: {}", panic_message(payload.as_ref()))),
        };

        let mut state = self.state.lock();

        if let Some(message) = failure {
            log::error!(
                "coordinator {}: engine call failed, loop stopped: {message}",
                self.id
            );
            state.fault = Some(message);
            return TickOutcome::Halted;
        }

        state.frame_count += 1;
        if let Some(fps) = state.fps.record(timing.delta_time) {
            log::debug!("coordinator {}: {fps:.1} fps", self.id);
            state.last_fps = Some(fps);
        }
        drop(state);
        drop(engine);

        TickOutcome::Rendered {
            elapsed: self.config.clock.now().saturating_duration_since(started),
        }
    }

    /// Forwards a resize while running. Zero sizes and other phases are no-ops.
    pub fn resize(&self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            log::debug!("coordinator {}: ignoring resize to {width}x{height}", self.id);
            return false;
        }
        self.with_live_engine("resize", |engine| engine.resize(width, height))
    }

    pub fn pointer(&self, event: PointerEvent) -> bool {
        self.with_live_engine("pointer event", |engine| engine.pointer(event))
    }

    pub fn key(&self, event: KeyEvent) -> bool {
        self.with_live_engine("key event", |engine| engine.key(event))
    }

    pub fn control(&self, control: SimulationControl) -> bool {
        self.with_live_engine("simulation control", |engine| engine.control(control))
    }

    fn with_live_engine(&self, what: &str, f: impl FnOnce(&mut E)) -> bool {
        // `init` holds the engine lock; check first so calls made during
        // `Initializing` are dropped instead of queued behind it.
        if !self.accepts(what) {
            return false;
        }
        let mut engine = self.engine.lock();
        if !self.accepts(what) {
            return false;
        }
        f(&mut engine);
        true
    }

    fn accepts(&self, what: &str) -> bool {
        let state = self.state.lock();
        if !state.is_live() {
            log::debug!(
                "coordinator {}: {what} dropped while {:?}",
                self.id,
                state.phase
            );
        }
        state.is_live()
    }

    /// Marks the session identified by `epoch` as faulted when its scheduler
    /// can no longer deliver ticks. Stale epochs are ignored.
    pub(crate) fn halt(&self, epoch: u64, reason: &str) {
        let mut state = self.state.lock();
        if self.is_cancelled(epoch) || !state.is_live() {
            return;
        }
        log::error!("coordinator {}: ticking stopped: {reason}", self.id);
        state.fault = Some(reason.to_owned());
    }

    pub fn suspend(&self) {
        self.set_suspended(true);
    }

    pub fn resume(&self) {
        self.set_suspended(false);
    }

    fn set_suspended(&self, suspended: bool) {
        let mut state = self.state.lock();
        if state.phase != Phase::Running {
            log::debug!(
                "coordinator {}: suspend={suspended} ignored while {:?}",
                self.id,
                state.phase
            );
            return;
        }
        if state.suspended != suspended {
            log::info!(
                "coordinator {}: {}",
                self.id,
                if suspended { "suspended" } else { "resumed" }
            );
            state.suspended = suspended;
        }
    }

    /// First half of `end`: moves to `Stopping` and cancels future ticks.
    ///
    /// Returns `false` when there is nothing to end. The caller must wait for
    /// its scheduler to quiesce before calling `finish_end`.
    pub(crate) fn begin_end(&self) -> bool {
        let mut state = self.state.lock();
        match state.phase {
            Phase::Idle | Phase::Stopping => {
                log::debug!("coordinator {}: end ignored while {:?}", self.id, state.phase);
                false
            }
            Phase::Initializing => {
                log::warn!("coordinator {}: end ignored during init", self.id);
                false
            }
            Phase::Running => {
                state.advance(Phase::Stopping);
                self.cancelled.store(true, Ordering::SeqCst);
                true
            }
        }
    }

    /// Second half of `end`: shuts the engine down and releases the session.
    pub(crate) fn finish_end(&self) {
        {
            let mut engine = self.engine.lock();
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| engine.shutdown())) {
                log::error!(
                    "coordinator {}: engine shutdown panicked: {}",
                    self.id,
                    panic_message(payload.as_ref())
                );
            }
        }

        let frames = {
            let mut state = self.state.lock();
            state.advance(Phase::Idle);
            state.suspended = false;
            state.frame_count
        };
        self.claim.lock().take();

        log::info!("coordinator {}: stopped after {frames} frames", self.id);
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
