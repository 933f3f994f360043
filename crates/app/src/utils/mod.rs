//! Shared helpers for the application layer.

pub mod logging;

pub use logging::{error_label, init_logging, log_command_execution};
