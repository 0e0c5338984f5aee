//! Lifecycle coordination for a GPU-backed render/simulation engine.
//!
//! The engine is an opaque collaborator (`engine::EngineBoundary`). This
//! crate starts it on a host surface, paces `update`/`render` ticks under
//! one of several scheduling models, forwards resizes and input, and shuts
//! it down only once no tick is in flight.

pub mod adapter;
pub mod core;
pub mod engine;
pub mod input;
pub mod logging;
pub mod surface;
pub mod time;

#[cfg(not(target_arch = "wasm32"))]
pub mod device;

#[cfg(feature = "extern-engine")]
pub mod ffi;

#[cfg(test)]
mod testing;
