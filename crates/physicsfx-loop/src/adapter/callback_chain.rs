use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Weak};

use crate::core::{Coordinator, LoopConfig, LoopCore, LoopError, TickOutcome, TickScheduler};
use crate::engine::EngineBoundary;

/// Token for a pending frame callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FrameRequest(pub u64);

/// Display-synchronized, single-threaded frame source
/// (`requestAnimationFrame` and the like).
pub trait FrameScheduler: Clone + 'static {
    /// Runs `callback` once at the next frame. `None` if the request failed.
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Option<FrameRequest>;

    fn cancel_frame(&self, request: FrameRequest);
}

/// Coordinator driven by a chain of frame callbacks.
///
/// Each tick requests the next one; the frame source provides the pacing.
/// `end` must be called on the thread that runs the callbacks.
pub type CallbackChainLoop<E, F> = Coordinator<E, CallbackChainScheduler<F>>;

pub struct CallbackChainScheduler<F> {
    frames: F,
    pending: Rc<Cell<Option<FrameRequest>>>,
}

impl<F> CallbackChainScheduler<F>
where
    F: FrameScheduler,
{
    pub fn new(frames: F) -> Self {
        Self {
            frames,
            pending: Rc::new(Cell::new(None)),
        }
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending.get()
    }
}

impl<E, F> TickScheduler<E> for CallbackChainScheduler<F>
where
    E: EngineBoundary + 'static,
    F: FrameScheduler,
{
    fn schedule(&mut self, core: &Arc<LoopCore<E>>, epoch: u64) -> Result<(), LoopError> {
        let link = Link {
            core: Arc::downgrade(core),
            epoch,
            frames: self.frames.clone(),
            pending: Rc::clone(&self.pending),
        };

        if link.request() {
            Ok(())
        } else {
            Err(LoopError::Toolkit("frame source refused the first request".into()))
        }
    }

    fn cancel_and_await(&mut self) {
        // Callbacks run on this thread, so nothing can be mid-tick here.
        if let Some(request) = self.pending.take() {
            self.frames.cancel_frame(request);
        }
    }
}

/// One step of the chain; consumed by the callback it schedules.
struct Link<E, F> {
    core: Weak<LoopCore<E>>,
    epoch: u64,
    frames: F,
    pending: Rc<Cell<Option<FrameRequest>>>,
}

impl<E, F> Link<E, F>
where
    E: EngineBoundary + 'static,
    F: FrameScheduler,
{
    fn request(self) -> bool {
        let frames = self.frames.clone();
        let pending = Rc::clone(&self.pending);
        let core = self.core.clone();
        let epoch = self.epoch;

        match frames.request_frame(Box::new(move || self.fire())) {
            Some(request) => {
                pending.set(Some(request));
                true
            }
            None => {
                if let Some(core) = core.upgrade() {
                    core.halt(epoch, "frame source refused a request");
                }
                false
            }
        }
    }

    fn fire(self) {
        self.pending.set(None);

        let Some(core) = self.core.upgrade() else {
            return;
        };

        match core.tick(self.epoch) {
            TickOutcome::Rendered { .. } | TickOutcome::Skipped => {
                drop(core);
                self.request();
            }
            TickOutcome::Halted => log::debug!("tick chain for session {} stopped", self.epoch),
        }
    }
}

impl<E, F> Coordinator<E, CallbackChainScheduler<F>>
where
    E: EngineBoundary + 'static,
    F: FrameScheduler,
{
    pub fn callback_chain(engine: E, config: LoopConfig, frames: F) -> Self {
        Self::with_scheduler(engine, config, CallbackChainScheduler::new(frames))
    }
}

/// Frame source fired by hand. Clones share the same queue.
#[derive(Clone, Default)]
pub struct ManualFrameScheduler {
    inner: Rc<RefCell<ManualFrames>>,
}

#[derive(Default)]
struct ManualFrames {
    next_id: u64,
    queued: Vec<(FrameRequest, Box<dyn FnOnce()>)>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every callback queued before this call. Returns how many ran.
    pub fn fire(&self) -> usize {
        let batch = std::mem::take(&mut self.inner.borrow_mut().queued);
        let count = batch.len();
        for (_, callback) in batch {
            callback();
        }
        count
    }

    pub fn queued(&self) -> usize {
        self.inner.borrow().queued.len()
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Option<FrameRequest> {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let request = FrameRequest(inner.next_id);
        inner.queued.push((request, callback));
        Some(request)
    }

    fn cancel_frame(&self, request: FrameRequest) {
        self.inner.borrow_mut().queued.retain(|(r, _)| *r != request);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::{LoopCoordinator, Phase};
    use crate::engine::SessionGuard;
    use crate::surface::SurfaceHandle;
    use crate::testing::{FakeEngine, Probe, native};
    use crate::time::ManualClock;

    type ManualChain = CallbackChainLoop<FakeEngine, ManualFrameScheduler>;

    fn chain(probe: &Probe, clock: &ManualClock) -> ManualChain {
        let config = LoopConfig::default()
            .with_sessions(SessionGuard::isolated())
            .with_clock(Arc::new(clock.clone()));
        Coordinator::callback_chain(probe.engine(), config, ManualFrameScheduler::new())
    }

    #[test]
    fn each_frame_ticks_once_and_requests_the_next() {
        let probe = Probe::default();
        let clock = ManualClock::new();
        let mut lp = chain(&probe, &clock);

        lp.start(Some(&SurfaceHandle::canvas("game")), 800, 600).unwrap();
        assert_eq!(lp.scheduler().frames().queued(), 1);

        for _ in 0..60 {
            clock.advance(Duration::from_nanos(16_666_667));
            assert_eq!(lp.scheduler().frames().fire(), 1);
        }

        assert_eq!(probe.renders(), 60);
        assert_eq!(lp.scheduler().frames().queued(), 1);
        let total: f32 = probe.deltas().iter().sum();
        assert!((total - 1.0).abs() < 1e-3);
    }

    #[test]
    fn end_cancels_the_pending_frame() {
        let probe = Probe::default();
        let clock = ManualClock::new();
        let mut lp = chain(&probe, &clock);
        lp.start(Some(&native(1)), 800, 600).unwrap();
        lp.scheduler().frames().fire();

        lp.end();

        assert_eq!(lp.scheduler().frames().queued(), 0);
        assert!(lp.scheduler().pending().is_none());
        assert_eq!(lp.scheduler().frames().fire(), 0);
        assert_eq!(probe.renders(), 1);
        assert_eq!(probe.shutdowns(), 1);
        assert_eq!(lp.phase(), Phase::Idle);
    }

    #[test]
    fn engine_failure_breaks_the_chain() {
        let probe = Probe::default();
        probe.fail_render_after(2);
        let clock = ManualClock::new();
        let mut lp = chain(&probe, &clock);
        lp.start(Some(&native(1)), 800, 600).unwrap();

        while lp.scheduler().frames().fire() > 0 {}

        assert_eq!(probe.renders(), 2);
        assert!(!lp.is_running());
        assert!(lp.scheduler().pending().is_none());
    }

    /// Frame source that refuses every request after the first `allowed`.
    #[derive(Clone)]
    struct Exhausting {
        frames: ManualFrameScheduler,
        allowed: Rc<Cell<usize>>,
    }

    impl FrameScheduler for Exhausting {
        fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Option<FrameRequest> {
            let left = self.allowed.get();
            if left == 0 {
                return None;
            }
            self.allowed.set(left - 1);
            self.frames.request_frame(callback)
        }

        fn cancel_frame(&self, request: FrameRequest) {
            self.frames.cancel_frame(request);
        }
    }

    #[test]
    fn refused_frame_request_faults_the_loop() {
        let probe = Probe::default();
        let frames = ManualFrameScheduler::new();
        let source = Exhausting {
            frames: frames.clone(),
            allowed: Rc::new(Cell::new(3)),
        };
        let config = LoopConfig::default().with_sessions(SessionGuard::isolated());
        let mut lp = Coordinator::callback_chain(probe.engine(), config, source);

        lp.start(Some(&native(1)), 800, 600).unwrap();
        while frames.fire() > 0 {}

        assert_eq!(probe.renders(), 3);
        assert!(!lp.is_running());
        assert!(lp.stats().fault.is_some());

        lp.end();
        assert_eq!(probe.shutdowns(), 1);
        assert_eq!(lp.phase(), Phase::Idle);
    }

    #[test]
    fn suspended_chain_keeps_requesting_without_ticking() {
        let probe = Probe::default();
        let clock = ManualClock::new();
        let mut lp = chain(&probe, &clock);
        lp.start(Some(&native(1)), 800, 600).unwrap();

        lp.suspend();
        lp.scheduler().frames().fire();
        lp.scheduler().frames().fire();
        assert_eq!(probe.updates(), 0);
        assert_eq!(lp.scheduler().frames().queued(), 1);

        clock.advance(Duration::from_secs(30));
        lp.resume();
        lp.scheduler().frames().fire();
        assert_eq!(probe.deltas(), vec![30.0]);
    }

    #[test]
    fn restart_runs_a_single_chain() {
        let probe = Probe::default();
        let clock = ManualClock::new();
        let frames = ManualFrameScheduler::new();
        let config = LoopConfig::default()
            .with_sessions(SessionGuard::isolated())
            .with_clock(Arc::new(clock.clone()));
        let mut lp = Coordinator::callback_chain(probe.engine(), config, frames.clone());

        lp.start(Some(&native(1)), 800, 600).unwrap();
        lp.end();
        lp.start(Some(&native(2)), 800, 600).unwrap();

        assert_eq!(frames.fire(), 1);
        assert_eq!(frames.fire(), 1);
        assert_eq!(probe.renders(), 2);
        assert_eq!(frames.queued(), 1);
    }
}
