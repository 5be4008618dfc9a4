//! Logging utilities.
//!
//! Logger initialization for binaries. The engine itself only uses the `log`
//! facade.

mod init;

pub use init::{init_logging, LoggingConfig};
