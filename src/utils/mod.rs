//! Utility functions
//!
//! Logging setup and log-safe rendering of relayed messages.

pub mod logging;

pub use logging::{describe_message, escape_for_log, setup_logging};
