use super::handle::{SurfaceHandle, SurfaceIdentity};

/// What a surface-changed notification means for the loop.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceChange {
    /// No previous surface: call `start`.
    StartFresh,
    /// Same drawable, new size: call `resize`.
    ResizeOnly,
    /// Different or dead drawable: `end` the running loop, then `start` with
    /// the new handle. Resuming against the old handle is never attempted.
    Restart,
}

/// Classifies a surface notification against the previously seen surface.
///
/// Identity, not structure, decides: a recreated window with the same size is
/// still a `Restart`. The dimensions do not influence the outcome.
pub fn classify(
    previous: Option<&SurfaceHandle>,
    new: &SurfaceHandle,
    width: u32,
    height: u32,
) -> SurfaceChange {
    let previous = previous.map(SurfaceHandle::identity);
    classify_identity(previous.as_ref(), new, width, height)
}

fn classify_identity(
    previous: Option<&SurfaceIdentity>,
    new: &SurfaceHandle,
    width: u32,
    height: u32,
) -> SurfaceChange {
    let Some(previous) = previous else {
        return SurfaceChange::StartFresh;
    };

    let change = if previous.is_valid() && previous.matches(new) && new.is_valid() {
        SurfaceChange::ResizeOnly
    } else {
        SurfaceChange::Restart
    };

    log::trace!("surface {new} ({width}x{height}) vs {previous:?}: {change:?}");
    change
}

/// Remembers the last surface a session was started on.
#[derive(Debug, Default)]
pub struct SurfaceIdentityTracker {
    previous: Option<SurfaceIdentity>,
}

impl SurfaceIdentityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&self, new: &SurfaceHandle, width: u32, height: u32) -> SurfaceChange {
        classify_identity(self.previous.as_ref(), new, width, height)
    }

    pub fn remember(&mut self, handle: &SurfaceHandle) {
        self.previous = Some(handle.identity());
    }

    pub fn forget(&mut self) {
        self.previous = None;
    }

    pub fn current(&self) -> Option<&SurfaceIdentity> {
        self.previous.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::surface::RawSurface;
    use crate::testing::TestWindow;

    fn view(addr: usize) -> SurfaceHandle {
        SurfaceHandle::ViewSurface(RawSurface::from_address(addr))
    }

    #[test]
    fn no_previous_surface_starts_fresh() {
        assert_eq!(classify(None, &view(0x10), 800, 600), SurfaceChange::StartFresh);
    }

    #[test]
    fn same_valid_surface_is_resize_only() {
        let h = view(0x10);
        assert_eq!(classify(Some(&h), &h, 1024, 768), SurfaceChange::ResizeOnly);
    }

    #[test]
    fn different_surface_restarts() {
        assert_eq!(
            classify(Some(&view(0x10)), &view(0x20), 800, 600),
            SurfaceChange::Restart
        );
    }

    #[test]
    fn invalid_new_surface_restarts() {
        let h = view(0x10);
        let null = view(0);
        assert_eq!(classify(Some(&h), &null, 800, 600), SurfaceChange::Restart);
    }

    #[test]
    fn recreated_host_window_of_same_size_restarts() {
        let old = SurfaceHandle::host_window(Arc::new(TestWindow::default()));
        let new = SurfaceHandle::host_window(Arc::new(TestWindow::default()));
        assert_eq!(classify(Some(&old), &new, 640, 480), SurfaceChange::Restart);
    }

    #[test]
    fn dead_host_window_restarts_even_if_same_object() {
        let window = Arc::new(TestWindow::default());
        let handle = SurfaceHandle::host_window(window.clone());
        let mut tracker = SurfaceIdentityTracker::new();
        tracker.remember(&handle);

        window.dead.store(true, Ordering::SeqCst);

        assert_eq!(tracker.classify(&handle, 640, 480), SurfaceChange::Restart);
    }

    #[test]
    fn tracker_forgets_on_destroy() {
        let mut tracker = SurfaceIdentityTracker::new();
        tracker.remember(&view(0x10));
        tracker.forget();
        assert_eq!(tracker.classify(&view(0x10), 1, 1), SurfaceChange::StartFresh);
    }
}
