//! Client management system
//!
//! Tracks connected peers and the registry they are broadcast through.

pub mod registry;
pub mod state;

pub use registry::{ClientRegistry, Registration, SharedRegistry};
pub use state::{ClientId, ConnectedClient, ConnectionState};
