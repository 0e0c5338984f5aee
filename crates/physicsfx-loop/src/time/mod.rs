//! Time subsystem.
//!
//! Provides testable frame timing utilities without coupling to a scheduler.
//! Intended usage:
//! - one `FrameClock` per coordinator
//! - call `tick(now)` once per scheduled frame to obtain `FrameTime`
//! - ask the `FramePacer` how long to wait before the next frame

mod clock;
mod fps;
mod frame_clock;
mod pacer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fps::FpsCounter;
pub use frame_clock::{FrameClock, FrameTime};
pub use pacer::FramePacer;
