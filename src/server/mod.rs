//! Server core functionality
//!
//! Binds the listener, accepts TCP connections, completes the WebSocket
//! handshake and hands each socket to its own relay handler task.

pub mod core;

pub use core::Server;
