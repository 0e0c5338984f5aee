use std::sync::Arc;

use super::config::LoopConfig;
use super::error::LoopError;
use super::loop_core::LoopCore;
use super::state::{LoopStats, Phase};
use crate::engine::{EngineBoundary, SimulationControl};
use crate::input::{KeyEvent, PointerEvent};
use crate::surface::SurfaceHandle;

/// Contract between a UI surface host and whatever drives the engine.
///
/// Identical across scheduling environments; only `start`/`end` differ in
/// how ticks are produced and quiesced.
pub trait LoopCoordinator {
    /// Initializes the engine on `surface` and begins ticking.
    ///
    /// Refuses (and reports) a start while a session is live, a zero size,
    /// an invalid surface and a session held by another coordinator. A
    /// failing `init` leaves the loop `Idle`.
    fn start(
        &mut self,
        surface: Option<&SurfaceHandle>,
        width: u32,
        height: u32,
    ) -> Result<(), LoopError>;

    /// Ticks perform `update` and `render` as one unit; external calls are
    /// accepted and ignored.
    fn update(&mut self, delta_time: f32) {
        log::trace!("external update({delta_time}) ignored, the loop drives itself");
    }

    fn render(&mut self) {
        log::trace!("external render ignored, the loop drives itself");
    }

    /// Forwards to the engine while running. Returns whether it was forwarded.
    fn resize(&mut self, width: u32, height: u32) -> bool;

    /// Stops ticking, waits for an in-flight tick, then shuts the engine down.
    /// No-op when idle.
    fn end(&mut self);

    fn is_running(&self) -> bool;

    fn phase(&self) -> Phase;

    fn suspend(&mut self);

    fn resume(&mut self);

    fn pointer(&mut self, event: PointerEvent) -> bool;

    fn key(&mut self, event: KeyEvent) -> bool;

    fn control(&mut self, control: SimulationControl) -> bool;

    fn stats(&self) -> LoopStats;

    fn engine_info(&self) -> String;
}

/// The two primitives that vary between scheduling environments.
pub trait TickScheduler<E> {
    /// Arranges for `core.tick(epoch)` to run once per frame until it
    /// returns `Halted`.
    fn schedule(&mut self, core: &Arc<LoopCore<E>>, epoch: u64) -> Result<(), LoopError>;

    /// Stops producing ticks and returns once no tick is executing.
    fn cancel_and_await(&mut self);
}

/// A `LoopCoordinator` driven by a `TickScheduler`.
pub struct Coordinator<E, S>
where
    E: EngineBoundary,
    S: TickScheduler<E>,
{
    core: Arc<LoopCore<E>>,
    scheduler: S,
}

impl<E, S> Coordinator<E, S>
where
    E: EngineBoundary,
    S: TickScheduler<E>,
{
    pub fn with_scheduler(engine: E, config: LoopConfig, scheduler: S) -> Self {
        Self {
            core: Arc::new(LoopCore::new(engine, config)),
            scheduler,
        }
    }

    pub fn core(&self) -> &Arc<LoopCore<E>> {
        &self.core
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

impl<E, S> LoopCoordinator for Coordinator<E, S>
where
    E: EngineBoundary,
    S: TickScheduler<E>,
{
    fn start(
        &mut self,
        surface: Option<&SurfaceHandle>,
        width: u32,
        height: u32,
    ) -> Result<(), LoopError> {
        let epoch = self.core.begin_session(surface, width, height)?;

        if let Err(e) = self.scheduler.schedule(&self.core, epoch) {
            log::error!("coordinator {}: could not schedule ticks: {e}", self.core.id());
            if self.core.begin_end() {
                self.scheduler.cancel_and_await();
                self.core.finish_end();
            }
            return Err(e);
        }

        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> bool {
        self.core.resize(width, height)
    }

    fn end(&mut self) {
        if !self.core.begin_end() {
            return;
        }
        self.scheduler.cancel_and_await();
        self.core.finish_end();
    }

    fn is_running(&self) -> bool {
        self.core.is_running()
    }

    fn phase(&self) -> Phase {
        self.core.phase()
    }

    fn suspend(&mut self) {
        self.core.suspend();
    }

    fn resume(&mut self) {
        self.core.resume();
    }

    fn pointer(&mut self, event: PointerEvent) -> bool {
        self.core.pointer(event)
    }

    fn key(&mut self, event: KeyEvent) -> bool {
        self.core.key(event)
    }

    fn control(&mut self, control: SimulationControl) -> bool {
        self.core.control(control)
    }

    fn stats(&self) -> LoopStats {
        self.core.stats()
    }

    fn engine_info(&self) -> String {
        self.core.engine_info()
    }
}

impl<E, S> Drop for Coordinator<E, S>
where
    E: EngineBoundary,
    S: TickScheduler<E>,
{
    fn drop(&mut self) {
        self.end();
    }
}
