//! Error handlers
//!
//! Routes errors to the log at the severity they deserve.

use crate::error::types::RelayError;
use log::{error, warn};

/// Log a relay error raised outside any single connection's read loop.
///
/// A failed handshake only costs that one peer, so it is a warning.
pub fn handle_error(err: &RelayError) {
    match err {
        RelayError::Handshake(..) => warn!("Relay error: {}", err),
        _ => error!("Relay error: {}", err),
    }
}
