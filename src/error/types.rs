//! Error types
//!
//! Defines the error types surfaced by the server, the transport and the
//! broadcast fan-out.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use tokio_tungstenite::tungstenite;

use crate::client::ClientId;

/// Errors raised by the relay server outside a single connection's loop.
#[derive(Debug)]
pub enum RelayError {
    Config(config::ConfigError),
    Bind(String, io::Error),
    Io(io::Error),
    Handshake(SocketAddr, tungstenite::Error),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Config(e) => write!(f, "Configuration error: {}", e),
            RelayError::Bind(addr, e) => write!(f, "Failed to bind to {}: {}", addr, e),
            RelayError::Io(e) => write!(f, "I/O error: {}", e),
            RelayError::Handshake(addr, e) => {
                write!(f, "WebSocket handshake with {} failed: {}", addr, e)
            }
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::Config(e) => Some(e),
            RelayError::Bind(_, e) | RelayError::Io(e) => Some(e),
            RelayError::Handshake(_, e) => Some(e),
        }
    }
}

impl From<config::ConfigError> for RelayError {
    fn from(error: config::ConfigError) -> Self {
        RelayError::Config(error)
    }
}

impl From<io::Error> for RelayError {
    fn from(error: io::Error) -> Self {
        RelayError::Io(error)
    }
}

/// Why a message could not be queued for one broadcast recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The recipient's outbound queue is full; it is not draining its socket.
    QueueFull,
    /// The recipient's writer has stopped.
    Disconnected,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryFailure::QueueFull => write!(f, "outbound queue full"),
            DeliveryFailure::Disconnected => write!(f, "connection gone"),
        }
    }
}

/// A send to one broadcast recipient that did not go through.
///
/// Only ever logged; it never leaves the broadcast that produced it.
#[derive(Debug)]
pub struct DeliveryError {
    pub recipient: ClientId,
    pub addr: SocketAddr,
    pub reason: DeliveryFailure,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Delivery to client {} ({}) failed: {}",
            self.recipient, self.addr, self.reason
        )
    }
}

impl std::error::Error for DeliveryError {}
