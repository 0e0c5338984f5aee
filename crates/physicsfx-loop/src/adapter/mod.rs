//! Scheduling adapters.
//!
//! Each adapter supplies the two primitives that differ between
//! environments (schedule the next tick, cancel and wait for quiescence):
//!
//! - `thread`: ticks on a dedicated OS thread, explicit sleep pacing.
//! - `affinity`: paced off-thread, executed on a UI-owned thread.
//! - `callback_chain`: display-synchronized callbacks, one per frame.
//! - `toolkit`: a winit event loop owns scheduling and calls in on redraw.

mod callback_chain;

#[cfg(not(target_arch = "wasm32"))]
mod affinity;
#[cfg(not(target_arch = "wasm32"))]
mod thread;
#[cfg(not(target_arch = "wasm32"))]
mod toolkit;

#[cfg(target_arch = "wasm32")]
mod browser;

pub use callback_chain::{
    CallbackChainLoop, CallbackChainScheduler, FrameRequest, FrameScheduler, ManualFrameScheduler,
};

#[cfg(not(target_arch = "wasm32"))]
pub use affinity::{
    AffinityLoop, AffinityScheduler, ChannelDispatcher, UiDispatcher, UiJob, UiQueue, ui_channel,
};
#[cfg(not(target_arch = "wasm32"))]
pub use thread::{ThreadLoop, ThreadScheduler};
#[cfg(not(target_arch = "wasm32"))]
pub use toolkit::{
    FrameDue, ToolkitCommand, ToolkitConfig, ToolkitDriven, ToolkitLoop, ToolkitLoopHandle,
};

#[cfg(target_arch = "wasm32")]
pub use browser::AnimationFrameScheduler;
