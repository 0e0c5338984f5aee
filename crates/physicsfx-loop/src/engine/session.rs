use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;

use crate::core::LoopError;

/// Identity of one coordinator instance, unique within the process.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct CoordinatorId(u64);

impl CoordinatorId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CoordinatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

static GLOBAL: LazyLock<SessionGuard> = LazyLock::new(SessionGuard::isolated);

/// Lock-guarded record of which coordinator currently owns the engine.
///
/// The engine's native resources exist once per process. Every coordinator
/// claims the guard before `init` and releases it after `shutdown`; a second
/// claimant is rejected instead of sharing the resources.
#[derive(Clone)]
pub struct SessionGuard {
    holder: Arc<Mutex<Option<CoordinatorId>>>,
}

impl SessionGuard {
    /// The process-wide guard. Default for every coordinator.
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    /// A guard independent of the process-wide one.
    ///
    /// For hosts that drive several independent engine instances, and for
    /// tests.
    pub fn isolated() -> Self {
        Self {
            holder: Arc::new(Mutex::new(None)),
        }
    }

    /// Coordinator currently holding the session, if any.
    pub fn holder(&self) -> Option<CoordinatorId> {
        *self.holder.lock()
    }

    pub(crate) fn claim(&self, id: CoordinatorId) -> Result<SessionClaim, LoopError> {
        let mut holder = self.holder.lock();
        match *holder {
            Some(current) if current != id => Err(LoopError::SessionBusy { holder: current }),
            _ => {
                *holder = Some(id);
                Ok(SessionClaim {
                    guard: self.clone(),
                    id,
                })
            }
        }
    }
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("holder", &self.holder())
            .finish()
    }
}

/// Proof that a coordinator owns the engine session. Releases on drop.
#[derive(Debug)]
pub struct SessionClaim {
    guard: SessionGuard,
    id: CoordinatorId,
}

impl SessionClaim {
    pub fn owner(&self) -> CoordinatorId {
        self.id
    }
}

impl Drop for SessionClaim {
    fn drop(&mut self) {
        let mut holder = self.guard.holder.lock();
        if *holder == Some(self.id) {
            *holder = None;
        }
    }
}
