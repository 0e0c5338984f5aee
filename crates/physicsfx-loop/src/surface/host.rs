use super::handle::SurfaceHandle;
use super::identity::{SurfaceChange, SurfaceIdentityTracker};
use crate::core::{LoopCoordinator, LoopError};

/// Binds surface provider callbacks to a coordinator.
///
/// One host per mounted drawable. Notifications may arrive in any order;
/// the identity tracker decides whether each one starts, resizes or
/// restarts the loop.
pub struct SurfaceHost<C>
where
    C: LoopCoordinator,
{
    coordinator: C,
    tracker: SurfaceIdentityTracker,
    last_size: Option<(u32, u32)>,
}

impl<C> SurfaceHost<C>
where
    C: LoopCoordinator,
{
    pub fn new(coordinator: C) -> Self {
        Self {
            coordinator,
            tracker: SurfaceIdentityTracker::new(),
            last_size: None,
        }
    }

    pub fn coordinator(&self) -> &C {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut C {
        &mut self.coordinator
    }

    pub fn tracker(&self) -> &SurfaceIdentityTracker {
        &self.tracker
    }

    pub fn on_created(
        &mut self,
        handle: &SurfaceHandle,
        width: u32,
        height: u32,
    ) -> Result<SurfaceChange, LoopError> {
        self.apply(handle, width, height)
    }

    pub fn on_changed(
        &mut self,
        handle: &SurfaceHandle,
        width: u32,
        height: u32,
    ) -> Result<SurfaceChange, LoopError> {
        self.apply(handle, width, height)
    }

    pub fn on_destroyed(&mut self) {
        log::debug!("surface destroyed");
        self.coordinator.end();
        self.tracker.forget();
        self.last_size = None;
    }

    /// Ends the loop unconditionally. Also runs on drop.
    pub fn unmount(&mut self) {
        self.on_destroyed();
    }

    fn apply(
        &mut self,
        handle: &SurfaceHandle,
        width: u32,
        height: u32,
    ) -> Result<SurfaceChange, LoopError> {
        let change = self.tracker.classify(handle, width, height);

        match change {
            SurfaceChange::StartFresh => self.start(handle, width, height)?,

            SurfaceChange::ResizeOnly if !self.coordinator.is_running() => {
                // Same drawable but the loop died (engine fault): bring it back.
                self.coordinator.end();
                self.start(handle, width, height)?;
            }

            SurfaceChange::ResizeOnly if self.last_size == Some((width, height)) => {
                log::debug!("duplicate surface change {width}x{height} ignored");
            }

            SurfaceChange::ResizeOnly => {
                if self.coordinator.resize(width, height) {
                    self.last_size = Some((width, height));
                }
            }

            SurfaceChange::Restart => {
                log::info!("surface replaced by {handle}, restarting loop");
                self.coordinator.end();
                self.tracker.forget();
                self.start(handle, width, height)?;
            }
        }

        Ok(change)
    }

    fn start(&mut self, handle: &SurfaceHandle, width: u32, height: u32) -> Result<(), LoopError> {
        match self.coordinator.start(Some(handle), width, height) {
            Ok(()) => {
                self.tracker.remember(handle);
                self.last_size = Some((width, height));
                Ok(())
            }
            Err(e) => {
                self.tracker.forget();
                self.last_size = None;
                Err(e)
            }
        }
    }
}

impl<C> Drop for SurfaceHost<C>
where
    C: LoopCoordinator,
{
    fn drop(&mut self) {
        self.unmount();
    }
}
