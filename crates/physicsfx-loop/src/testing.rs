//! Recording fake engine shared by the unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::ThreadId;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};

use crate::core::{LoopCore, LoopError, TickOutcome, TickScheduler};
use crate::engine::{EngineBoundary, SimulationControl};
use crate::input::{KeyEvent, PointerEvent};
use crate::surface::{HostWindow, RawSurface, SurfaceHandle};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Init { surface: String, width: u32, height: u32 },
    Update(f32),
    Render,
    Resize(u32, u32),
    Shutdown,
    Pointer(PointerEvent),
    Key(KeyEvent),
    Control(SimulationControl),
}

/// Holds the next gated engine call until released.
struct Gate {
    entered: Sender<()>,
    release: Receiver<()>,
}

impl Gate {
    fn new() -> (Self, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);
        let (release_tx, release_rx) = crossbeam_channel::bounded(1);
        let gate = Gate {
            entered: entered_tx,
            release: release_rx,
        };
        (gate, entered_rx, release_tx)
    }

    fn pass(self) {
        let _ = self.entered.send(());
        let _ = self.release.recv();
    }
}

#[derive(Default)]
struct ProbeInner {
    calls: Mutex<Vec<Call>>,
    init_fails: AtomicBool,
    depth: AtomicUsize,
    overlaps: AtomicUsize,
    fail_render_after: Mutex<Option<usize>>,
    renders: AtomicUsize,
    gate: Mutex<Option<Gate>>,
    init_gate: Mutex<Option<Gate>>,
    tick_threads: Mutex<Vec<ThreadId>>,
    simulated: Mutex<f64>,
    stop_recording_after: Mutex<Option<f64>>,
}

/// Observer handle for a `FakeEngine`. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct Probe {
    inner: Arc<ProbeInner>,
}

impl Probe {
    pub(crate) fn engine(&self) -> FakeEngine {
        FakeEngine {
            probe: self.clone(),
        }
    }

    pub(crate) fn fail_init(&self) {
        self.inner.init_fails.store(true, Ordering::SeqCst);
    }

    /// Makes the render after `n` successful renders return an error.
    pub(crate) fn fail_render_after(&self, n: usize) {
        *self.inner.fail_render_after.lock() = Some(n);
    }

    /// Blocks the next render until the returned sender fires.
    pub(crate) fn gate_next_render(&self) -> (Receiver<()>, Sender<()>) {
        let (gate, entered, release) = Gate::new();
        *self.inner.gate.lock() = Some(gate);
        (entered, release)
    }

    /// Blocks the next `init` until the returned sender fires.
    pub(crate) fn gate_next_init(&self) -> (Receiver<()>, Sender<()>) {
        let (gate, entered, release) = Gate::new();
        *self.inner.init_gate.lock() = Some(gate);
        (entered, release)
    }

    /// Stops recording `Update`/`Render` once `seconds` of simulated time
    /// have been seen, so free-running loops under a manual clock stay small.
    pub(crate) fn stop_recording_after(&self, seconds: f64) {
        *self.inner.stop_recording_after.lock() = Some(seconds);
    }

    pub(crate) fn simulated_seconds(&self) -> f64 {
        *self.inner.simulated.lock()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.inner.calls.lock().iter().filter(|c| pred(c)).count()
    }

    pub(crate) fn inits(&self) -> usize {
        self.count(|c| matches!(c, Call::Init { .. }))
    }

    pub(crate) fn updates(&self) -> usize {
        self.count(|c| matches!(c, Call::Update(_)))
    }

    pub(crate) fn renders(&self) -> usize {
        self.inner.renders.load(Ordering::SeqCst)
    }

    pub(crate) fn resizes(&self) -> Vec<(u32, u32)> {
        self.inner
            .calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Resize(w, h) => Some((*w, *h)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn shutdowns(&self) -> usize {
        self.count(|c| matches!(c, Call::Shutdown))
    }

    pub(crate) fn deltas(&self) -> Vec<f32> {
        self.inner
            .calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Update(dt) => Some(*dt),
                _ => None,
            })
            .collect()
    }

    /// Number of times an engine call started while another was in progress.
    pub(crate) fn overlaps(&self) -> usize {
        self.inner.overlaps.load(Ordering::SeqCst)
    }

    pub(crate) fn tick_threads(&self) -> Vec<ThreadId> {
        self.inner.tick_threads.lock().clone()
    }

    /// Polls until `renders() >= n` or `timeout` elapses.
    pub(crate) fn wait_for_renders(&self, n: usize, timeout: Duration) -> bool {
        self.wait_until(timeout, || self.renders() >= n)
    }

    pub(crate) fn wait_until(&self, timeout: Duration, cond: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        cond()
    }

    fn enter(&self) {
        if self.inner.depth.fetch_add(1, Ordering::SeqCst) > 0 {
            self.inner.overlaps.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn exit(&self) {
        self.inner.depth.fetch_sub(1, Ordering::SeqCst);
    }

    fn recording(&self) -> bool {
        match *self.inner.stop_recording_after.lock() {
            Some(limit) => *self.inner.simulated.lock() < limit,
            None => true,
        }
    }

    fn record(&self, call: Call) {
        self.inner.calls.lock().push(call);
    }
}

pub(crate) struct FakeEngine {
    probe: Probe,
}

impl EngineBoundary for FakeEngine {
    fn init(&mut self, surface: &SurfaceHandle, width: u32, height: u32) -> bool {
        let gate = self.probe.inner.init_gate.lock().take();
        if let Some(gate) = gate {
            gate.pass();
        }
        self.probe.enter();
        self.probe.record(Call::Init {
            surface: surface.to_string(),
            width,
            height,
        });
        self.probe.exit();
        !self.probe.inner.init_fails.load(Ordering::SeqCst)
    }

    fn update(&mut self, delta_time: f32) -> anyhow::Result<()> {
        // Held across update and render: one tick.
        self.probe.enter();
        if self.probe.recording() {
            self.probe.record(Call::Update(delta_time));
            self.probe.inner.tick_threads.lock().push(std::thread::current().id());
        }
        *self.probe.inner.simulated.lock() += f64::from(delta_time);
        Ok(())
    }

    fn render(&mut self) -> anyhow::Result<()> {
        let gate = self.probe.inner.gate.lock().take();
        if let Some(gate) = gate {
            gate.pass();
        }

        let done = self.probe.inner.renders.load(Ordering::SeqCst);
        let fail = *self.probe.inner.fail_render_after.lock() == Some(done);

        if self.probe.recording() {
            self.probe.record(Call::Render);
        }
        self.probe.exit();

        anyhow::ensure!(!fail, "device lost during render");
        self.probe.inner.renders.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.probe.enter();
        self.probe.record(Call::Resize(width, height));
        self.probe.exit();
    }

    fn shutdown(&mut self) {
        self.probe.enter();
        self.probe.record(Call::Shutdown);
        self.probe.exit();
    }

    fn info(&self) -> String {
        String::from("fake engine")
    }

    fn pointer(&mut self, event: PointerEvent) {
        self.probe.record(Call::Pointer(event));
    }

    fn key(&mut self, event: KeyEvent) {
        self.probe.record(Call::Key(event));
    }

    fn control(&mut self, control: SimulationControl) {
        self.probe.record(Call::Control(control));
    }
}

pub(crate) fn native(addr: usize) -> SurfaceHandle {
    SurfaceHandle::NativeWindow(RawSurface::from_address(addr))
}

/// Host window that can be marked dead without being dropped.
#[derive(Default)]
pub(crate) struct TestWindow {
    pub(crate) dead: AtomicBool,
}

impl HasWindowHandle for TestWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl HasDisplayHandle for TestWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl HostWindow for TestWindow {
    fn surface_size(&self) -> (u32, u32) {
        (640, 480)
    }

    fn is_alive(&self) -> bool {
        !self.dead.load(Ordering::SeqCst)
    }
}

/// Scheduler that ticks only when a test calls `step`.
pub(crate) struct StepScheduler<E> {
    pub(crate) session: Option<(Arc<LoopCore<E>>, u64)>,
    pub(crate) fail_next: bool,
    pub(crate) cancels: usize,
}

impl<E> Default for StepScheduler<E> {
    fn default() -> Self {
        Self {
            session: None,
            fail_next: false,
            cancels: 0,
        }
    }
}

impl<E: EngineBoundary> StepScheduler<E> {
    pub(crate) fn step(&self) -> TickOutcome {
        match &self.session {
            Some((core, epoch)) => core.tick(*epoch),
            None => TickOutcome::Halted,
        }
    }
}

impl<E: EngineBoundary> TickScheduler<E> for StepScheduler<E> {
    fn schedule(&mut self, core: &Arc<LoopCore<E>>, epoch: u64) -> Result<(), LoopError> {
        if std::mem::take(&mut self.fail_next) {
            return Err(LoopError::Toolkit("no frame source".into()));
        }
        self.session = Some((core.clone(), epoch));
        Ok(())
    }

    fn cancel_and_await(&mut self) {
        self.cancels += 1;
        self.session = None;
    }
}
