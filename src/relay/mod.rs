//! Relay core
//!
//! Per-connection read loop and the fan-out that copies every received
//! message to all other registered clients.

pub mod broadcast;
pub mod handler;

pub use broadcast::{BroadcastReport, broadcast};
pub use handler::handle_connection;
