//! Loop coordination core.
//!
//! `LoopCore` owns the phase machine and every engine call. Scheduling
//! adapters (see `adapter`) decide only when ticks run, and plug in through
//! `TickScheduler`; hosts talk to any of them through `LoopCoordinator`.

mod config;
mod coordinator;
mod error;
mod loop_core;
mod state;

pub use config::LoopConfig;
pub use coordinator::{Coordinator, LoopCoordinator, TickScheduler};
pub use error::LoopError;
pub use loop_core::{LoopCore, TickOutcome};
pub use state::{FrameTiming, LoopStats, Phase};
