//! Process lifecycle: logging setup and shutdown signal handling.

pub mod logging;
pub mod signal;
