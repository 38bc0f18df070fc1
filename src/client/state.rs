//! Module `state`
//!
//! Defines the `ConnectedClient` handle shared between the registry and the
//! broadcasters, its identity type, and the per-connection lifecycle states.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::Message;

use crate::error::{DeliveryError, DeliveryFailure};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one connection.
///
/// Two connections from the same address still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    /// Hands out the next unused id.
    pub fn next() -> Self {
        ClientId(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a single connection's handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Active,
    Closing,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Active => "ACTIVE",
            ConnectionState::Closing => "CLOSING",
            ConnectionState::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

/// One active peer.
///
/// Holds the sending end of the queue drained by the connection's writer
/// task. The inbound half stays with the handler running the read loop.
pub struct ConnectedClient {
    id: ClientId,
    addr: SocketAddr,
    outbound: mpsc::Sender<Message>,
}

impl ConnectedClient {
    pub fn new(addr: SocketAddr, outbound: mpsc::Sender<Message>) -> Self {
        Self {
            id: ClientId::next(),
            addr,
            outbound,
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Remote host, as shown in connect/disconnect events.
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    // --------------------
    // I/O
    // --------------------

    /// Queues one message for this peer without waiting on its socket.
    pub fn send(&self, message: Message) -> Result<(), DeliveryError> {
        self.outbound.try_send(message).map_err(|e| DeliveryError {
            recipient: self.id,
            addr: self.addr,
            reason: match e {
                TrySendError::Full(_) => DeliveryFailure::QueueFull,
                TrySendError::Closed(_) => DeliveryFailure::Disconnected,
            },
        })
    }
}

impl fmt::Debug for ConnectedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectedClient")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}
