use std::io;

use thiserror::Error;

use super::state::Phase;
use crate::engine::CoordinatorId;

/// Why a `start` call did not produce a running loop.
///
/// Spurious `resize`/`end` calls are not errors; they are logged no-ops.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("surface size must be non-zero, got {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("surface handle is missing or no longer valid")]
    InvalidSurface,

    #[error("start called while the loop is {phase:?}")]
    DoubleStart { phase: Phase },

    #[error("engine session is held by coordinator {holder}")]
    SessionBusy { holder: CoordinatorId },

    #[error("engine init returned false")]
    InitializationFailed,

    #[error("failed to spawn tick thread")]
    Spawn(#[source] io::Error),

    #[error("toolkit event loop failed: {0}")]
    Toolkit(String),
}

impl LoopError {
    /// Whether the call was refused because of the phase or the session,
    /// as opposed to bad input or a failing engine.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LoopError::DoubleStart { .. } | LoopError::SessionBusy { .. }
        )
    }
}
