//! Broadcast fan-out
//!
//! Queues one message for every registered client except its sender. Nothing
//! here waits on a socket: each recipient's writer task drains its own queue,
//! and each recipient's outcome is judged on its own.

use log::{debug, warn};
use tokio_tungstenite::tungstenite::Message;

use crate::client::{ClientId, ClientRegistry};
use crate::error::DeliveryError;

/// Outcome of a single broadcast.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: Vec<DeliveryError>,
}

impl BroadcastReport {
    pub fn recipients(&self) -> usize {
        self.delivered + self.failed.len()
    }
}

/// Relays `message` to every member of a fresh registry snapshot other than
/// `sender`.
///
/// A full or closed recipient queue is logged and reported, never returned
/// as an error.
pub fn broadcast(
    registry: &ClientRegistry,
    sender: ClientId,
    message: &Message,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for client in registry.snapshot() {
        if client.id() == sender {
            continue;
        }
        match client.send(message.clone()) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!("{}", e);
                report.failed.push(e);
            }
        }
    }

    if report.recipients() == 0 {
        debug!("No recipients for message from client {}", sender);
    } else {
        debug!(
            "Broadcast from client {}: {}/{} queued",
            sender,
            report.delivered,
            report.recipients()
        );
    }
    report
}
