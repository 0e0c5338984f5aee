use crate::input::{KeyEvent, PointerEvent};
use crate::surface::SurfaceHandle;

/// Runtime controls the original engine exposes alongside its lifecycle.
///
/// Forwarded outside the tick, under the same rules as input.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SimulationControl {
    /// Downward gravity magnitude, in units per second squared.
    SetGravity(f32),
    /// Multiplier applied to simulated time.
    SetTimeScale(f32),
    SetPaused(bool),
    /// Rebuilds the simulation from its initial state.
    Reset,
}

/// Contract of the rendering/physics engine.
///
/// Implementations are not reentrant: loops guarantee that at most one method
/// runs at a time, that nothing but `init` is called before a successful
/// `init`, and that `shutdown` runs only after the last tick has returned.
///
/// `update` followed by `render` is one tick and is never split.
pub trait EngineBoundary {
    /// Creates GPU/physics resources bound to `surface`.
    ///
    /// Returning `false` leaves the engine uninitialized; no other call
    /// follows until the next successful `init`.
    fn init(&mut self, surface: &SurfaceHandle, width: u32, height: u32) -> bool;

    /// Advances the simulation by `delta_time` seconds.
    fn update(&mut self, delta_time: f32) -> anyhow::Result<()>;

    /// Draws the current state to the surface.
    fn render(&mut self) -> anyhow::Result<()>;

    fn resize(&mut self, width: u32, height: u32);

    /// Releases every resource created by `init`.
    fn shutdown(&mut self);

    /// Free-form diagnostics string. Not part of the lifecycle.
    fn info(&self) -> String {
        String::from("unnamed engine")
    }

    fn pointer(&mut self, event: PointerEvent) {
        let _ = event;
    }

    fn key(&mut self, event: KeyEvent) {
        let _ = event;
    }

    fn control(&mut self, control: SimulationControl) {
        let _ = control;
    }
}

impl<E> EngineBoundary for Box<E>
where
    E: EngineBoundary + ?Sized,
{
    fn init(&mut self, surface: &SurfaceHandle, width: u32, height: u32) -> bool {
        (**self).init(surface, width, height)
    }

    fn update(&mut self, delta_time: f32) -> anyhow::Result<()> {
        (**self).update(delta_time)
    }

    fn render(&mut self) -> anyhow::Result<()> {
        (**self).render()
    }

    fn resize(&mut self, width: u32, height: u32) {
        (**self).resize(width, height)
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }

    fn info(&self) -> String {
        (**self).info()
    }

    fn pointer(&mut self, event: PointerEvent) {
        (**self).pointer(event)
    }

    fn key(&mut self, event: KeyEvent) {
        (**self).key(event)
    }

    fn control(&mut self, control: SimulationControl) {
        (**self).control(control)
    }
}
