//! Drawable surfaces.
//!
//! A surface is produced and destroyed by the host environment. The loop only
//! compares surfaces across notifications; it never keeps one alive.

mod handle;
mod host;
mod identity;

pub use handle::{HostWindow, RawSurface, SurfaceHandle, SurfaceIdentity};
pub use host::SurfaceHost;
pub use identity::{SurfaceChange, SurfaceIdentityTracker, classify};
