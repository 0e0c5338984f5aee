//! Engine boundary.
//!
//! The rendering/physics engine is an external collaborator. This module
//! defines the contract the loops drive it through, and the process-wide
//! guard that keeps two coordinators from driving it at once.

mod boundary;
mod session;

pub use boundary::{EngineBoundary, SimulationControl};
pub use session::{CoordinatorId, SessionClaim, SessionGuard};
