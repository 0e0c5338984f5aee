//! Engine linked through the physics core's C ABI.
//!
//! Requires the `physics_core` library at link time.

use std::ffi::{CStr, c_char, c_void};

use raw_window_handle::{HasWindowHandle, RawWindowHandle};

use crate::engine::{EngineBoundary, SimulationControl};
use crate::surface::{HostWindow, SurfaceHandle};

#[link(name = "physics_core")]
unsafe extern "C" {
    fn wgpu_init(surface: *mut c_void, width: i32, height: i32) -> bool;
    fn wgpu_update(delta_time: f32);
    fn wgpu_render();
    fn wgpu_resize(width: i32, height: i32);
    fn wgpu_shutdown();
    fn physics_core_get_info() -> *mut c_char;
    fn physics_core_free_string(s: *mut c_char);
}

/// `EngineBoundary` over the process-wide native engine.
#[derive(Debug, Default)]
pub struct ExternEngine {
    initialized: bool,
}

impl ExternEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EngineBoundary for ExternEngine {
    fn init(&mut self, surface: &SurfaceHandle, width: u32, height: u32) -> bool {
        let Some(ptr) = native_pointer(surface) else {
            log::error!("{surface} has no native pointer for the C engine");
            return false;
        };
        let (Ok(w), Ok(h)) = (i32::try_from(width), i32::try_from(height)) else {
            log::error!("size {width}x{height} out of range");
            return false;
        };

        // SAFETY: `ptr` is a live native drawable for the duration of the session.
        self.initialized = unsafe { wgpu_init(ptr, w, h) };
        self.initialized
    }

    fn update(&mut self, delta_time: f32) -> anyhow::Result<()> {
        anyhow::ensure!(self.initialized, "update before init");
        // SAFETY: initialized; calls are serialized by the coordinator.
        unsafe { wgpu_update(delta_time) };
        Ok(())
    }

    fn render(&mut self) -> anyhow::Result<()> {
        anyhow::ensure!(self.initialized, "render before init");
        // SAFETY: as in `update`.
        unsafe { wgpu_render() };
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if !self.initialized {
            return;
        }
        let w = i32::try_from(width).unwrap_or(i32::MAX);
        let h = i32::try_from(height).unwrap_or(i32::MAX);
        // SAFETY: as in `update`.
        unsafe { wgpu_resize(w, h) };
    }

    fn shutdown(&mut self) {
        if std::mem::take(&mut self.initialized) {
            // SAFETY: no tick is in flight once the coordinator calls shutdown.
            unsafe { wgpu_shutdown() };
        }
    }

    fn info(&self) -> String {
        // SAFETY: the library returns an owned NUL-terminated string or null,
        // released with `physics_core_free_string`.
        unsafe {
            let raw = physics_core_get_info();
            if raw.is_null() {
                return String::from("physics_core (no info)");
            }
            let info = CStr::from_ptr(raw).to_string_lossy().into_owned();
            physics_core_free_string(raw);
            info
        }
    }

    fn control(&mut self, control: SimulationControl) {
        log::debug!("{control:?} not exposed by the C ABI");
    }
}

/// The pointer the C engine expects for `handle`.
fn native_pointer(handle: &SurfaceHandle) -> Option<*mut c_void> {
    match handle {
        SurfaceHandle::NativeWindow(raw) | SurfaceHandle::ViewSurface(raw) => {
            (!raw.is_null()).then(|| raw.as_ptr())
        }
        SurfaceHandle::HostWindow(window) => host_pointer(window.as_ref()),
        SurfaceHandle::Canvas(_) => None,
    }
}

fn host_pointer(window: &dyn HostWindow) -> Option<*mut c_void> {
    let handle = window.window_handle().ok()?;
    let ptr = match handle.as_raw() {
        RawWindowHandle::Win32(h) => h.hwnd.get() as *mut c_void,
        RawWindowHandle::AppKit(h) => h.ns_view.as_ptr(),
        RawWindowHandle::UiKit(h) => h.ui_view.as_ptr(),
        RawWindowHandle::AndroidNdk(h) => h.a_native_window.as_ptr(),
        RawWindowHandle::Xlib(h) => h.window as usize as *mut c_void,
        RawWindowHandle::Xcb(h) => h.window.get() as usize as *mut c_void,
        RawWindowHandle::Wayland(h) => h.surface.as_ptr(),
        other => {
            log::warn!("unsupported window handle {other:?}");
            return None;
        }
    };
    Some(ptr)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::surface::RawSurface;
    use crate::testing::TestWindow;

    #[test]
    fn raw_variants_pass_their_address() {
        let handle = SurfaceHandle::ViewSurface(RawSurface::from_address(0x7000));
        assert_eq!(native_pointer(&handle), Some(0x7000 as *mut c_void));
        assert_eq!(
            native_pointer(&SurfaceHandle::NativeWindow(RawSurface::NULL)),
            None
        );
    }

    #[test]
    fn canvas_and_handleless_windows_have_no_pointer() {
        assert_eq!(native_pointer(&SurfaceHandle::canvas("c")), None);
        let window = SurfaceHandle::host_window(Arc::new(TestWindow::default()));
        assert_eq!(native_pointer(&window), None);
    }
}
