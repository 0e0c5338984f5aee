//! wgpu device bound to a `SurfaceHandle`, plus a minimal engine on top.
//!
//! Native targets only.

mod clear;
mod error;
mod gpu;
mod init;
mod raw;
mod surface;

pub use clear::{ClearColorEngine, ClearSimulation};
pub use error::SurfaceErrorAction;
pub use gpu::{Gpu, GpuFrame};
pub use init::GpuInit;
