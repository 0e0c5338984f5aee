use std::sync::Arc;

use parking_lot::Mutex;
use web_time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::core::{
    LoopConfig, LoopCoordinator, LoopCore, LoopError, LoopStats, Phase, TickOutcome,
};
use crate::engine::{EngineBoundary, SimulationControl};
use crate::input::platform::winit::InputTranslator;
use crate::input::{EngineInput, KeyEvent, PointerEvent};
use crate::surface::{HostWindow, SurfaceChange, SurfaceHandle, SurfaceIdentityTracker};

/// Window configuration for the toolkit-owned loop.
#[derive(Debug, Clone)]
pub struct ToolkitConfig {
    pub title: String,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            title: "physicsfx".to_string(),
        }
    }
}

/// When the next paced redraw should happen.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameDue {
    Now,
    At(Instant),
    /// No session; wait for events.
    Idle,
}

/// Toolkit-driven half of the loop, free of any event loop.
///
/// The host toolkit calls in on surface, resize and redraw notifications;
/// every call happens on the toolkit thread, so nothing is ever in flight
/// when the session ends.
pub struct ToolkitDriven<E> {
    core: LoopCore<E>,
    tracker: SurfaceIdentityTracker,
    epoch: Option<u64>,
    next_frame_at: Option<Instant>,
}

impl<E> ToolkitDriven<E>
where
    E: EngineBoundary,
{
    pub fn new(engine: E, config: LoopConfig) -> Self {
        Self {
            core: LoopCore::new(engine, config),
            tracker: SurfaceIdentityTracker::new(),
            epoch: None,
            next_frame_at: None,
        }
    }

    pub fn core(&self) -> &LoopCore<E> {
        &self.core
    }

    /// A window (re)appeared. Starts, resizes or restarts the session.
    pub fn on_surface_ready(
        &mut self,
        handle: &SurfaceHandle,
        width: u32,
        height: u32,
    ) -> Result<SurfaceChange, LoopError> {
        let change = self.tracker.classify(handle, width, height);

        match change {
            SurfaceChange::StartFresh => self.begin(handle, width, height)?,
            SurfaceChange::ResizeOnly if self.core.is_running() => {
                self.core.resize(width, height);
            }
            SurfaceChange::ResizeOnly | SurfaceChange::Restart => {
                self.end_session();
                self.begin(handle, width, height)?;
            }
        }

        Ok(change)
    }

    fn begin(&mut self, handle: &SurfaceHandle, width: u32, height: u32) -> Result<(), LoopError> {
        match self.core.begin_session(Some(handle), width, height) {
            Ok(epoch) => {
                self.epoch = Some(epoch);
                self.tracker.remember(handle);
                self.next_frame_at = Some(self.core.clock().now());
                Ok(())
            }
            Err(e) => {
                self.tracker.forget();
                Err(e)
            }
        }
    }

    pub fn on_resized(&mut self, width: u32, height: u32) -> bool {
        self.core.resize(width, height)
    }

    /// One tick per redraw notification.
    pub fn on_redraw(&mut self) -> TickOutcome {
        let Some(epoch) = self.epoch else {
            return TickOutcome::Halted;
        };

        let frame_start = self.core.clock().now();
        let outcome = self.core.tick(epoch);

        self.next_frame_at = match outcome {
            TickOutcome::Halted => None,
            _ => Some(frame_start + self.core.pacer().frame_budget()),
        };
        outcome
    }

    /// Decides whether a redraw is due at `now`.
    ///
    /// A `Now` answer pushes the deadline one budget ahead so that a redraw
    /// the toolkit never delivers does not stall pacing.
    pub fn poll_frame(&mut self, now: Instant) -> FrameDue {
        match self.next_frame_at {
            None => FrameDue::Idle,
            Some(at) if now >= at => {
                self.next_frame_at = Some(now + self.core.pacer().frame_budget());
                FrameDue::Now
            }
            Some(at) => FrameDue::At(at),
        }
    }

    pub fn on_surface_lost(&mut self) {
        self.end_session();
    }

    pub fn end_session(&mut self) {
        if self.core.begin_end() {
            self.core.finish_end();
        }
        self.tracker.forget();
        self.epoch = None;
        self.next_frame_at = None;
    }
}

/// Messages delivered to the event loop from other threads.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ToolkitCommand {
    End,
    Control(SimulationControl),
}

/// Cross-thread access to a running `ToolkitLoop`.
#[derive(Clone, Default)]
pub struct ToolkitLoopHandle {
    proxy: Arc<Mutex<Option<EventLoopProxy<ToolkitCommand>>>>,
}

impl ToolkitLoopHandle {
    /// Asks the event loop to end the session and exit. Advisory: the
    /// toolkit acts on it when it next processes events. Returns `false` if
    /// no event loop is running.
    pub fn request_end(&self) -> bool {
        self.send(ToolkitCommand::End)
    }

    pub fn control(&self, control: SimulationControl) -> bool {
        self.send(ToolkitCommand::Control(control))
    }

    pub fn is_attached(&self) -> bool {
        self.proxy.lock().is_some()
    }

    fn send(&self, command: ToolkitCommand) -> bool {
        match self.proxy.lock().as_ref() {
            Some(proxy) => proxy.send_event(command).is_ok(),
            None => {
                log::debug!("{command:?} dropped, toolkit loop not running");
                false
            }
        }
    }

    fn attach(&self, proxy: EventLoopProxy<ToolkitCommand>) {
        *self.proxy.lock() = Some(proxy);
    }

    fn detach(&self) {
        self.proxy.lock().take();
    }
}

/// Coordinator backed by a winit event loop it creates and blocks on.
///
/// `start` opens a window of the requested size and returns only when the
/// toolkit exits. The surface argument is ignored: the loop renders into the
/// window it owns.
pub struct ToolkitLoop<E> {
    driven: ToolkitDriven<E>,
    config: ToolkitConfig,
    handle: ToolkitLoopHandle,
}

impl<E> ToolkitLoop<E>
where
    E: EngineBoundary,
{
    pub fn new(engine: E, config: LoopConfig, toolkit: ToolkitConfig) -> Self {
        Self {
            driven: ToolkitDriven::new(engine, config),
            config: toolkit,
            handle: ToolkitLoopHandle::default(),
        }
    }

    pub fn handle(&self) -> ToolkitLoopHandle {
        self.handle.clone()
    }

    pub fn driven(&self) -> &ToolkitDriven<E> {
        &self.driven
    }
}

impl<E> LoopCoordinator for ToolkitLoop<E>
where
    E: EngineBoundary,
{
    fn start(
        &mut self,
        surface: Option<&SurfaceHandle>,
        width: u32,
        height: u32,
    ) -> Result<(), LoopError> {
        let phase = self.driven.core.phase();
        if phase != Phase::Idle {
            log::warn!("toolkit loop already {phase:?}");
            return Err(LoopError::DoubleStart { phase });
        }
        if width == 0 || height == 0 {
            return Err(LoopError::InvalidSize { width, height });
        }
        if let Some(surface) = surface {
            log::warn!("toolkit loop renders into its own window, ignoring {surface}");
        }

        let event_loop = EventLoop::<ToolkitCommand>::with_user_event()
            .build()
            .map_err(|e| LoopError::Toolkit(e.to_string()))?;
        self.handle.attach(event_loop.create_proxy());

        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(width, height));

        let mut app = ToolkitApp {
            driven: &mut self.driven,
            attributes,
            window: None,
            input: InputTranslator::default(),
            error: None,
        };

        let run = event_loop.run_app(&mut app);
        let error = app.error.take();

        self.handle.detach();
        self.driven.end_session();

        run.map_err(|e| LoopError::Toolkit(e.to_string()))?;
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> bool {
        self.driven.on_resized(width, height)
    }

    fn end(&mut self) {
        self.handle.request_end();
        self.driven.end_session();
    }

    fn is_running(&self) -> bool {
        self.driven.core.is_running()
    }

    fn phase(&self) -> Phase {
        self.driven.core.phase()
    }

    fn suspend(&mut self) {
        self.driven.core.suspend();
    }

    fn resume(&mut self) {
        self.driven.core.resume();
    }

    fn pointer(&mut self, event: PointerEvent) -> bool {
        self.driven.core.pointer(event)
    }

    fn key(&mut self, event: KeyEvent) -> bool {
        self.driven.core.key(event)
    }

    fn control(&mut self, control: SimulationControl) -> bool {
        self.driven.core.control(control)
    }

    fn stats(&self) -> LoopStats {
        self.driven.core.stats()
    }

    fn engine_info(&self) -> String {
        self.driven.core.engine_info()
    }
}

struct ToolkitApp<'a, E> {
    driven: &'a mut ToolkitDriven<E>,
    attributes: WindowAttributes,
    window: Option<Arc<Window>>,
    input: InputTranslator,
    error: Option<LoopError>,
}

impl<E> ToolkitApp<'_, E>
where
    E: EngineBoundary,
{
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: LoopError) {
        log::error!("toolkit loop stopping: {error}");
        self.error.get_or_insert(error);
        self.driven.end_session();
        event_loop.exit();
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl<E> ApplicationHandler<ToolkitCommand> for ToolkitApp<'_, E>
where
    E: EngineBoundary,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, LoopError::Toolkit(format!("failed to create window: {e}")));
                return;
            }
        };

        let (width, height) = window.surface_size();
        let handle = SurfaceHandle::host_window(Arc::clone(&window));

        match self
            .driven
            .on_surface_ready(&handle, width.max(1), height.max(1))
        {
            Ok(change) => {
                log::debug!("window surface ready: {change:?}");
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("surface suspended by the platform");
        self.driven.on_surface_lost();
        self.window = None;
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, command: ToolkitCommand) {
        match command {
            ToolkitCommand::End => {
                log::info!("end requested");
                self.driven.end_session();
                self.window = None;
                event_loop.exit();
            }
            ToolkitCommand::Control(control) => {
                self.driven.core.control(control);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        match self.driven.poll_frame(self.driven.core.clock().now()) {
            FrameDue::Now => {
                self.request_redraw();
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            FrameDue::At(at) => event_loop.set_control_flow(ControlFlow::WaitUntil(at)),
            FrameDue::Idle => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(input) = self.input.translate(&event) {
            match input {
                EngineInput::Pointer(pointer) => self.driven.core.pointer(pointer),
                EngineInput::Key(key) => self.driven.core.key(key),
            };
        }

        match event {
            WindowEvent::CloseRequested => {
                self.driven.end_session();
                self.window = None;
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                self.driven.on_resized(size.width, size.height);
                self.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let (width, height) = window.surface_size();
                    self.driven.on_resized(width, height);
                }
                self.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                if self.driven.on_redraw() != TickOutcome::Halted {
                    return;
                }
                if let Some(fault) = self.driven.core.stats().fault {
                    log::error!("engine stopped: {fault}");
                    self.driven.end_session();
                    self.window = None;
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}
