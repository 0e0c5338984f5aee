//! Input forwarding.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Hosts translate platform events into `PointerEvent`/`KeyEvent` and hand
//! them to the coordinator, which forwards them to the engine only while a
//! session is running.

mod types;

#[cfg(not(target_arch = "wasm32"))]
pub(crate) mod platform;

pub use types::{EngineInput, KeyEvent, KeyPhase, MouseButton, PointerEvent, PointerPhase};
