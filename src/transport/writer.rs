//! Outbound writer
//!
//! Each connection's sink is owned by one spawned task that drains a bounded
//! queue. Broadcasters only ever enqueue, so a peer that stops reading holds
//! up nothing but its own writer.

use std::time::Duration;

use futures::SinkExt;
use log::debug;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use super::MessageSink;

/// Messages a connection may have waiting before further ones are dropped.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 1024;

/// Handle on a connection's writer task.
///
/// Dropping it aborts the task.
#[derive(Debug)]
pub struct OutboundWriter {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

/// Spawns the writer for `sink` and returns the queue feeding it.
pub fn spawn_writer(sink: MessageSink) -> (mpsc::Sender<Message>, OutboundWriter) {
    let (queue_tx, queue_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(drain(sink, queue_rx, shutdown_rx));

    (
        queue_tx,
        OutboundWriter {
            shutdown: Some(shutdown_tx),
            task,
        },
    )
}

impl OutboundWriter {
    /// Asks the writer to close its sink and waits up to `grace` for it.
    ///
    /// Returns `false` if the writer was still stuck on the socket and had to
    /// be aborted.
    pub async fn close(&mut self, grace: Duration) -> bool {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        match timeout(grace, &mut self.task).await {
            Ok(_) => true,
            Err(_) => {
                self.task.abort();
                false
            }
        }
    }
}

impl Drop for OutboundWriter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn drain(
    mut sink: MessageSink,
    mut queue: mpsc::Receiver<Message>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            // Resolves on an explicit close and when the handle is dropped.
            _ = &mut shutdown => break,
            next = queue.recv() => match next {
                Some(message) => {
                    if let Err(e) = sink.send(message).await {
                        debug!("Outbound writer stopped: {}", e);
                        return;
                    }
                }
                None => break,
            },
        }
    }
    let _ = sink.close().await;
}
