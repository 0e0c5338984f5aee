use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::core::{Coordinator, LoopConfig, LoopCore, LoopError, TickOutcome, TickScheduler};
use crate::engine::EngineBoundary;

/// Work item executed on the UI thread.
pub type UiJob = Box<dyn FnOnce() + Send>;

/// Runs closures on the thread that owns the native surface.
pub trait UiDispatcher: Send + Sync + 'static {
    /// Queues `job` for the UI thread. Returns `false` if that thread is gone.
    fn dispatch(&self, job: UiJob) -> bool;
}

/// Coordinator whose ticks execute on a UI-owned thread.
///
/// Engines that bind the surface to one thread must only be touched there;
/// `start` and `end` are expected to be called on that thread as well.
pub type AffinityLoop<E, D = ChannelDispatcher> = Coordinator<E, AffinityScheduler<D>>;

/// Paces frames on a helper thread and dispatches each tick to the UI
/// thread, waiting for it to finish before pacing the next one.
pub struct AffinityScheduler<D> {
    dispatcher: Arc<D>,
    pacer: Option<JoinHandle<()>>,
}

impl<D> AffinityScheduler<D>
where
    D: UiDispatcher,
{
    pub fn new(dispatcher: D) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            pacer: None,
        }
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }
}

impl<E, D> TickScheduler<E> for AffinityScheduler<D>
where
    E: EngineBoundary + Send + 'static,
    D: UiDispatcher,
{
    fn schedule(&mut self, core: &Arc<LoopCore<E>>, epoch: u64) -> Result<(), LoopError> {
        let core = Arc::clone(core);
        let dispatcher = Arc::clone(&self.dispatcher);
        let name = format!("{}-pacer", core.config().thread_name);

        let pacer = thread::Builder::new()
            .name(name)
            .spawn(move || pace(&core, dispatcher.as_ref(), epoch))
            .map_err(LoopError::Spawn)?;

        self.pacer = Some(pacer);
        Ok(())
    }

    fn cancel_and_await(&mut self) {
        // A tick may still be running on the UI thread after the pacer exits;
        // `finish_end` waits for it on the engine lock.
        if let Some(pacer) = self.pacer.take() {
            if pacer.join().is_err() {
                log::error!("frame pacer thread panicked");
            }
        }
    }
}

fn pace<E, D>(core: &Arc<LoopCore<E>>, dispatcher: &D, epoch: u64)
where
    E: EngineBoundary + Send + 'static,
    D: UiDispatcher,
{
    let pacer = core.pacer();
    let budget = pacer.frame_budget();

    while !core.is_cancelled(epoch) {
        let frame_start = core.clock().now();
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let tick_core = Arc::clone(core);

        let queued = dispatcher.dispatch(Box::new(move || {
            let _ = done_tx.send(tick_core.tick(epoch));
        }));
        if !queued {
            core.halt(epoch, "UI thread no longer accepts work");
            break;
        }

        // Never block unconditionally: `end` may be running on the UI thread.
        let outcome = loop {
            match done_rx.recv_timeout(budget) {
                Ok(outcome) => break Some(outcome),
                Err(RecvTimeoutError::Timeout) if core.is_cancelled(epoch) => break None,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    core.halt(epoch, "UI thread dropped a queued tick");
                    break None;
                }
            }
        };

        match outcome {
            Some(TickOutcome::Rendered { .. } | TickOutcome::Skipped) => {
                let spent = core.clock().now().saturating_duration_since(frame_start);
                core.clock().sleep(pacer.wait_for(spent));
            }
            Some(TickOutcome::Halted) | None => break,
        }
    }

    log::debug!("frame pacer for session {epoch} exiting");
}

impl<E, D> Coordinator<E, AffinityScheduler<D>>
where
    E: EngineBoundary + Send + 'static,
    D: UiDispatcher,
{
    pub fn with_affinity(engine: E, config: LoopConfig, dispatcher: D) -> Self {
        Self::with_scheduler(engine, config, AffinityScheduler::new(dispatcher))
    }
}

/// Creates a dispatcher/queue pair. The thread that drains the `UiQueue`
/// becomes the UI thread.
pub fn ui_channel() -> (ChannelDispatcher, UiQueue) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ChannelDispatcher { tx }, UiQueue { rx })
}

#[derive(Clone)]
pub struct ChannelDispatcher {
    tx: Sender<UiJob>,
}

impl UiDispatcher for ChannelDispatcher {
    fn dispatch(&self, job: UiJob) -> bool {
        self.tx.send(job).is_ok()
    }
}

/// Receiving end of `ui_channel`, drained by the UI thread.
pub struct UiQueue {
    rx: Receiver<UiJob>,
}

impl UiQueue {
    /// Runs every job already queued. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Runs jobs as they arrive until `timeout` elapses. Returns how many ran.
    pub fn run_for(&self, timeout: Duration) -> usize {
        self.drain(Instant::now() + timeout, || false).0
    }

    /// Runs jobs as they arrive until `done` holds or `timeout` elapses.
    /// Returns whether `done` held.
    pub fn run_until(&self, timeout: Duration, done: impl Fn() -> bool) -> bool {
        self.drain(Instant::now() + timeout, done).1
    }

    fn drain(&self, deadline: Instant, done: impl Fn() -> bool) -> (usize, bool) {
        let mut ran = 0;
        loop {
            if done() {
                return (ran, true);
            }
            match self.rx.recv_deadline(deadline) {
                Ok(job) => {
                    job();
                    ran += 1;
                }
                Err(_) => return (ran, done()),
            }
        }
    }
}
