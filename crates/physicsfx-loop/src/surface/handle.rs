use std::ffi::c_void;
use std::fmt;
use std::sync::{Arc, Weak};

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// Address of a native drawable (window, view, layer) owned by the host.
///
/// Carried as an integer: the loop never dereferences it, it only compares
/// and forwards it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RawSurface(usize);

impl RawSurface {
    pub const NULL: RawSurface = RawSurface(0);

    pub fn from_ptr<T>(ptr: *mut T) -> Self {
        Self(ptr as usize)
    }

    pub fn from_address(address: usize) -> Self {
        Self(address)
    }

    pub fn address(self) -> usize {
        self.0
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RawSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Window object owned by a host windowing toolkit.
pub trait HostWindow: HasWindowHandle + HasDisplayHandle + Send + Sync {
    /// Drawable size in physical pixels.
    fn surface_size(&self) -> (u32, u32);

    /// Whether the platform still reports a usable native handle.
    fn is_alive(&self) -> bool {
        self.window_handle().is_ok()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl HostWindow for winit::window::Window {
    fn surface_size(&self) -> (u32, u32) {
        let size = self.inner_size();
        (size.width, size.height)
    }
}

/// Platform drawable handed to `start`.
///
/// Equality is identity: two handles are equal when they name the same
/// drawable object, regardless of its current size or state.
#[derive(Clone)]
pub enum SurfaceHandle {
    /// Window created on a host OS thread (HWND, NSView*, X11 window id),
    /// typically passed down from a JVM or desktop shell.
    NativeWindow(RawSurface),

    /// Browser canvas element, by id.
    Canvas(String),

    /// OS-managed view surface (ANativeWindow*, CAMetalLayer*).
    ViewSurface(RawSurface),

    /// Window object of the host windowing toolkit.
    HostWindow(Arc<dyn HostWindow>),
}

impl SurfaceHandle {
    pub fn host_window<W>(window: Arc<W>) -> Self
    where
        W: HostWindow + 'static,
    {
        SurfaceHandle::HostWindow(window)
    }

    pub fn canvas(id: impl Into<String>) -> Self {
        SurfaceHandle::Canvas(id.into())
    }

    /// Validity predicate checked before the handle reaches the engine.
    pub fn is_valid(&self) -> bool {
        match self {
            SurfaceHandle::NativeWindow(raw) | SurfaceHandle::ViewSurface(raw) => !raw.is_null(),
            SurfaceHandle::Canvas(id) => !id.trim().is_empty(),
            SurfaceHandle::HostWindow(window) => window.is_alive(),
        }
    }

    /// Non-owning identity of this handle.
    pub fn identity(&self) -> SurfaceIdentity {
        match self {
            SurfaceHandle::NativeWindow(raw) => SurfaceIdentity::NativeWindow(*raw),
            SurfaceHandle::Canvas(id) => SurfaceIdentity::Canvas(id.clone()),
            SurfaceHandle::ViewSurface(raw) => SurfaceIdentity::ViewSurface(*raw),
            SurfaceHandle::HostWindow(window) => SurfaceIdentity::HostWindow {
                address: host_address(window),
                window: Arc::downgrade(window),
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SurfaceHandle::NativeWindow(_) => "native-window",
            SurfaceHandle::Canvas(_) => "canvas",
            SurfaceHandle::ViewSurface(_) => "view-surface",
            SurfaceHandle::HostWindow(_) => "host-window",
        }
    }
}

impl PartialEq for SurfaceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.identity().matches(other)
    }
}

impl Eq for SurfaceHandle {}

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceHandle::NativeWindow(raw) | SurfaceHandle::ViewSurface(raw) => {
                write!(f, "{}@{raw}", self.kind())
            }
            SurfaceHandle::Canvas(id) => write!(f, "canvas#{id}"),
            SurfaceHandle::HostWindow(window) => {
                write!(f, "host-window@{:#x}", host_address(window))
            }
        }
    }
}

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceHandle({self})")
    }
}

/// What a tracker remembers about a previous surface.
///
/// Host windows are held weakly so that remembering a surface never extends
/// its lifetime.
#[derive(Clone)]
pub enum SurfaceIdentity {
    NativeWindow(RawSurface),
    Canvas(String),
    ViewSurface(RawSurface),
    HostWindow {
        address: usize,
        window: Weak<dyn HostWindow>,
    },
}

impl SurfaceIdentity {
    /// Whether `handle` names the same drawable.
    pub fn matches(&self, handle: &SurfaceHandle) -> bool {
        match (self, handle) {
            (SurfaceIdentity::NativeWindow(a), SurfaceHandle::NativeWindow(b)) => a == b,
            (SurfaceIdentity::ViewSurface(a), SurfaceHandle::ViewSurface(b)) => a == b,
            (SurfaceIdentity::Canvas(a), SurfaceHandle::Canvas(b)) => a == b,
            (SurfaceIdentity::HostWindow { address, .. }, SurfaceHandle::HostWindow(b)) => {
                *address == host_address(b)
            }
            _ => false,
        }
    }

    /// Whether the remembered drawable still exists and is usable.
    pub fn is_valid(&self) -> bool {
        match self {
            SurfaceIdentity::NativeWindow(raw) | SurfaceIdentity::ViewSurface(raw) => {
                !raw.is_null()
            }
            SurfaceIdentity::Canvas(id) => !id.trim().is_empty(),
            SurfaceIdentity::HostWindow { window, .. } => {
                window.upgrade().is_some_and(|w| w.is_alive())
            }
        }
    }
}

impl fmt::Debug for SurfaceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceIdentity::NativeWindow(raw) => write!(f, "NativeWindow({raw})"),
            SurfaceIdentity::Canvas(id) => write!(f, "Canvas({id})"),
            SurfaceIdentity::ViewSurface(raw) => write!(f, "ViewSurface({raw})"),
            SurfaceIdentity::HostWindow { address, .. } => write!(f, "HostWindow({address:#x})"),
        }
    }
}

fn host_address(window: &Arc<dyn HostWindow>) -> usize {
    Arc::as_ptr(window) as *const () as usize
}
