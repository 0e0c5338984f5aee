use anyhow::Result;
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, RawDisplayHandle,
    RawWindowHandle, WindowHandle,
};

use crate::surface::RawSurface;

/// Native window pointer paired with the display it belongs to.
///
/// Built from a `RawSurface` the host vouches for; wgpu only reads the
/// handles while creating the surface.
pub(crate) struct RawTarget {
    window: RawWindowHandle,
    display: RawDisplayHandle,
}

impl RawTarget {
    pub(crate) fn from_raw(raw: RawSurface) -> Result<Self> {
        let (window, display) = platform_handles(raw)?;
        Ok(Self { window, display })
    }
}

impl HasWindowHandle for RawTarget {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        // SAFETY: the host keeps the native window alive while the engine session runs.
        Ok(unsafe { WindowHandle::borrow_raw(self.window) })
    }
}

impl HasDisplayHandle for RawTarget {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        // SAFETY: see `window_handle`.
        Ok(unsafe { DisplayHandle::borrow_raw(self.display) })
    }
}

#[cfg(target_os = "windows")]
fn platform_handles(raw: RawSurface) -> Result<(RawWindowHandle, RawDisplayHandle)> {
    use anyhow::Context;
    use raw_window_handle::{Win32WindowHandle, WindowsDisplayHandle};

    let hwnd = std::num::NonZeroIsize::new(raw.address() as isize).context("null HWND")?;
    Ok((
        RawWindowHandle::Win32(Win32WindowHandle::new(hwnd)),
        RawDisplayHandle::Windows(WindowsDisplayHandle::new()),
    ))
}

#[cfg(target_os = "macos")]
fn platform_handles(raw: RawSurface) -> Result<(RawWindowHandle, RawDisplayHandle)> {
    use anyhow::Context;
    use raw_window_handle::{AppKitDisplayHandle, AppKitWindowHandle};

    let view = std::ptr::NonNull::new(raw.as_ptr()).context("null NSView")?;
    Ok((
        RawWindowHandle::AppKit(AppKitWindowHandle::new(view)),
        RawDisplayHandle::AppKit(AppKitDisplayHandle::new()),
    ))
}

#[cfg(target_os = "ios")]
fn platform_handles(raw: RawSurface) -> Result<(RawWindowHandle, RawDisplayHandle)> {
    use anyhow::Context;
    use raw_window_handle::{UiKitDisplayHandle, UiKitWindowHandle};

    let view = std::ptr::NonNull::new(raw.as_ptr()).context("null UIView")?;
    Ok((
        RawWindowHandle::UiKit(UiKitWindowHandle::new(view)),
        RawDisplayHandle::UiKit(UiKitDisplayHandle::new()),
    ))
}

#[cfg(target_os = "android")]
fn platform_handles(raw: RawSurface) -> Result<(RawWindowHandle, RawDisplayHandle)> {
    use anyhow::Context;
    use raw_window_handle::{AndroidDisplayHandle, AndroidNdkWindowHandle};

    let window = std::ptr::NonNull::new(raw.as_ptr()).context("null ANativeWindow")?;
    Ok((
        RawWindowHandle::AndroidNdk(AndroidNdkWindowHandle::new(window)),
        RawDisplayHandle::Android(AndroidDisplayHandle::new()),
    ))
}

#[cfg(all(
    unix,
    not(any(target_os = "macos", target_os = "ios", target_os = "android"))
))]
fn platform_handles(raw: RawSurface) -> Result<(RawWindowHandle, RawDisplayHandle)> {
    use raw_window_handle::{XlibDisplayHandle, XlibWindowHandle};

    anyhow::ensure!(!raw.is_null(), "null X11 window id");
    Ok((
        RawWindowHandle::Xlib(XlibWindowHandle::new(raw.address() as std::ffi::c_ulong)),
        RawDisplayHandle::Xlib(XlibDisplayHandle::new(None, 0)),
    ))
}

#[cfg(not(any(unix, target_os = "windows")))]
fn platform_handles(raw: RawSurface) -> Result<(RawWindowHandle, RawDisplayHandle)> {
    anyhow::bail!("raw surface {raw} is not supported on this platform")
}
