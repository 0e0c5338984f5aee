use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::core::{Coordinator, LoopConfig, LoopCore, LoopError, TickOutcome, TickScheduler};
use crate::engine::EngineBoundary;

/// Coordinator ticking on a dedicated OS thread.
pub type ThreadLoop<E> = Coordinator<E, ThreadScheduler>;

/// Runs ticks in a loop on a spawned worker, sleeping the rest of each
/// frame budget. Cancellation is observed at the top of every tick and
/// `cancel_and_await` joins the worker.
#[derive(Debug, Default)]
pub struct ThreadScheduler {
    worker: Option<JoinHandle<()>>,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }
}

impl<E> TickScheduler<E> for ThreadScheduler
where
    E: EngineBoundary + Send + 'static,
{
    fn schedule(&mut self, core: &Arc<LoopCore<E>>, epoch: u64) -> Result<(), LoopError> {
        let core = Arc::clone(core);
        let name = core.config().thread_name.clone();

        let worker = thread::Builder::new()
            .name(name)
            .spawn(move || run_ticks(&core, epoch))
            .map_err(LoopError::Spawn)?;

        self.worker = Some(worker);
        Ok(())
    }

    fn cancel_and_await(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        if worker.thread().id() == thread::current().id() {
            log::error!("end called from the tick thread; cannot wait for it");
            return;
        }

        if worker.join().is_err() {
            log::error!("tick thread panicked");
        }
    }
}

fn run_ticks<E>(core: &LoopCore<E>, epoch: u64)
where
    E: EngineBoundary,
{
    let pacer = core.pacer();

    loop {
        match core.tick(epoch) {
            TickOutcome::Rendered { elapsed } => core.clock().sleep(pacer.wait_for(elapsed)),
            TickOutcome::Skipped => core.clock().sleep(pacer.frame_budget()),
            TickOutcome::Halted => break,
        }
    }

    log::debug!("tick thread for session {epoch} exiting");
}

impl<E> Coordinator<E, ThreadScheduler>
where
    E: EngineBoundary + Send + 'static,
{
    pub fn threaded(engine: E, config: LoopConfig) -> Self {
        Self::with_scheduler(engine, config, ThreadScheduler::new())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::{LoopCoordinator, Phase};
    use crate::engine::SessionGuard;
    use crate::input::{MouseButton, PointerEvent};
    use crate::testing::{Call, Probe, native};
    use crate::time::ManualClock;

    const WAIT: Duration = Duration::from_secs(10);

    fn config() -> LoopConfig {
        LoopConfig::default().with_sessions(SessionGuard::isolated())
    }

    #[test]
    fn one_simulated_second_yields_sixty_ticks() {
        let clock = ManualClock::new();
        let probe = Probe::default();
        probe.stop_recording_after(1.2);
        let mut lp = ThreadLoop::threaded(probe.engine(), config().with_clock(Arc::new(clock)));

        lp.start(Some(&native(0x51)), 800, 600).unwrap();
        assert!(lp.is_running());
        assert!(probe.wait_until(WAIT, || probe.simulated_seconds() >= 1.2));
        lp.end();

        assert_eq!(probe.inits(), 1);

        let mut elapsed = 0.0_f64;
        let in_first_second = probe
            .deltas()
            .iter()
            .take_while(|dt| {
                elapsed += f64::from(**dt);
                elapsed <= 1.0
            })
            .count();
        assert!(
            (59..=61).contains(&in_first_second),
            "{in_first_second} ticks in the first second"
        );

        let deltas = probe.deltas();
        assert!(deltas[1..].iter().all(|dt| (dt - 1.0 / 60.0).abs() < 1e-4));
    }

    #[test]
    fn ticks_run_off_the_caller_thread() {
        let probe = Probe::default();
        let mut lp = ThreadLoop::threaded(
            probe.engine(),
            config().with_thread_name("tick-under-test"),
        );

        lp.start(Some(&native(1)), 320, 240).unwrap();
        assert!(probe.wait_for_renders(3, WAIT));
        lp.end();

        let me = thread::current().id();
        assert!(probe.tick_threads().iter().all(|id| *id != me));
    }

    #[test]
    fn ticks_never_overlap_with_resizes_or_input() {
        let probe = Probe::default();
        let mut lp = ThreadLoop::threaded(probe.engine(), config().with_target_rate(1000));
        lp.start(Some(&native(1)), 800, 600).unwrap();

        for i in 0..200 {
            lp.resize(800 + i, 600);
            lp.pointer(PointerEvent::moved(i as f32, 0.0, Some(MouseButton::Left)));
        }
        assert!(probe.wait_for_renders(20, WAIT));
        lp.end();

        assert_eq!(probe.overlaps(), 0);
    }

    #[test]
    fn end_waits_for_the_in_flight_tick() {
        let probe = Probe::default();
        let (entered, release) = probe.gate_next_render();
        let mut lp = ThreadLoop::threaded(probe.engine(), config());

        lp.start(Some(&native(1)), 800, 600).unwrap();
        entered.recv_timeout(WAIT).unwrap();

        let ender = thread::spawn(move || {
            lp.end();
            lp
        });

        thread::sleep(Duration::from_millis(50));
        assert_eq!(probe.shutdowns(), 0);

        release.send(()).unwrap();
        let lp = ender.join().unwrap();

        assert_eq!(lp.phase(), Phase::Idle);
        assert_eq!(probe.shutdowns(), 1);
        let calls = probe.calls();
        assert_eq!(calls[calls.len() - 1], Call::Shutdown);
        assert_eq!(calls[calls.len() - 2], Call::Render);
    }

    #[test]
    fn worker_is_gone_after_end() {
        let probe = Probe::default();
        let mut lp = ThreadLoop::threaded(probe.engine(), config());

        lp.start(Some(&native(1)), 800, 600).unwrap();
        assert!(lp.scheduler().is_active());
        lp.end();

        assert!(!lp.scheduler().is_active());
        let renders = probe.renders();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(probe.renders(), renders);
    }

    #[test]
    fn restart_after_end_spawns_a_fresh_worker() {
        let probe = Probe::default();
        let mut lp = ThreadLoop::threaded(probe.engine(), config());

        lp.start(Some(&native(1)), 800, 600).unwrap();
        assert!(probe.wait_for_renders(2, WAIT));
        lp.end();
        let before = probe.renders();

        lp.start(Some(&native(2)), 800, 600).unwrap();
        assert!(probe.wait_for_renders(before + 2, WAIT));
        lp.end();

        assert_eq!(probe.inits(), 2);
        assert_eq!(probe.shutdowns(), 2);
    }
}
