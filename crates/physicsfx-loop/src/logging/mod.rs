//! Logging setup.
//!
//! Everything in the crate logs through the `log` facade; this module only
//! installs the `env_logger` backend for hosts that want one.

mod init;

pub use init::{DEFAULT_FILTER, LoggingConfig, init_logging};
