use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{ConnectedClient, ConnectionState, SharedRegistry};
use crate::relay::broadcast;
use crate::transport::{MessageSink, MessageStream, Received, receive, spawn_writer};
use crate::utils::describe_message;

/// How long a closing connection's writer may take to flush and close.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Runs one connection from registration to deregistration.
///
/// - Registers the client and reports the connect event.
/// - Relays every received message to all other registered clients.
/// - On close or transport error, deregisters and reports the disconnect.
///
/// Outbound traffic goes through a writer task, so this loop never waits on
/// any peer's socket. Returns only once the connection has reached `CLOSED`.
/// If the task running this future is dropped early, the registration guard
/// still deregisters and the writer is aborted.
pub async fn handle_connection(
    registry: SharedRegistry,
    client_addr: SocketAddr,
    outbound: MessageSink,
    mut inbound: MessageStream,
) {
    let (queue, mut writer) = spawn_writer(outbound);
    let client = Arc::new(ConnectedClient::new(client_addr, queue));
    let host = client.host();
    let port = client.port();
    let mut state = ConnectionState::Connecting;

    let registration = registry.enroll(Arc::clone(&client));
    transition(&client, &mut state, ConnectionState::Active);
    info!("Client connected ({}:{})", host, port);

    loop {
        match receive(&mut inbound).await {
            Received::Message(message) => {
                info!(
                    "Client message received ({}:{}): {}",
                    host,
                    port,
                    describe_message(&message)
                );
                broadcast(&registry, registration.id(), &message);
            }
            Received::Closed => {
                info!("Connection closed by client ({}:{})", host, port);
                break;
            }
            Received::Error(detail) => {
                error!("Failed to read from ({}:{}): {}", host, port, detail);
                break;
            }
        }
    }

    transition(&client, &mut state, ConnectionState::Closing);
    drop(registration);
    if !writer.close(CLOSE_GRACE).await {
        warn!("Outbound writer for ({}:{}) did not finish, aborted", host, port);
    }
    transition(&client, &mut state, ConnectionState::Closed);
    info!("Client disconnected ({}:{})", host, port);
}

fn transition(client: &ConnectedClient, state: &mut ConnectionState, next: ConnectionState) {
    debug!("Client {} {} -> {}", client.id(), state, next);
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientRegistry;
    use crate::transport::boxed_sink;
    use futures::channel::mpsc;
    use futures::{Sink, SinkExt, StreamExt};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::task::JoinHandle;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::{Error as WsError, Message};

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// In-memory peer: `to_server` feeds the handler, `from_server` collects
    /// what the relay sends to this peer.
    struct TestPeer {
        to_server: mpsc::UnboundedSender<Result<Message, WsError>>,
        from_server: mpsc::UnboundedReceiver<Message>,
        task: JoinHandle<()>,
    }

    fn connect(registry: &SharedRegistry, port: u16) -> TestPeer {
        let (out_tx, out_rx) = mpsc::unbounded::<Message>();
        let (to_server, task) = connect_with_sink(registry, port, boxed_sink(out_tx));
        TestPeer {
            to_server,
            from_server: out_rx,
            task,
        }
    }

    fn connect_with_sink(
        registry: &SharedRegistry,
        port: u16,
        sink: MessageSink,
    ) -> (mpsc::UnboundedSender<Result<Message, WsError>>, JoinHandle<()>) {
        let (in_tx, in_rx) = mpsc::unbounded::<Result<Message, WsError>>();
        let addr = format!("192.168.0.10:{}", port).parse().unwrap();
        let task = tokio::spawn(handle_connection(
            Arc::clone(registry),
            addr,
            sink,
            Box::pin(in_rx),
        ));
        (in_tx, task)
    }

    /// A socket whose send buffer never drains.
    struct NeverReady;

    impl Sink<Message> for NeverReady {
        type Error = WsError;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
            Poll::Pending
        }

        fn start_send(self: Pin<&mut Self>, _item: Message) -> Result<(), WsError> {
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
            Poll::Pending
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
            Poll::Pending
        }
    }

    async fn wait_for_members(registry: &ClientRegistry, n: usize) {
        timeout(TIMEOUT, async {
            while registry.len() != n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("registry never reached expected size");
    }

    async fn next_message(peer: &mut TestPeer) -> Message {
        timeout(TIMEOUT, peer.from_server.next())
            .await
            .expect("timed out waiting for relay")
            .expect("relay closed the peer")
    }

    #[tokio::test]
    async fn relays_to_other_client_but_not_sender() {
        let registry = ClientRegistry::shared();
        let mut a = connect(&registry, 1);
        let mut b = connect(&registry, 2);
        wait_for_members(&registry, 2).await;

        a.to_server.send(Ok(Message::text("hello"))).await.unwrap();

        assert_eq!(next_message(&mut b).await, Message::text("hello"));
        assert!(a.from_server.try_next().is_err());
    }

    #[tokio::test]
    async fn relays_control_characters_unescaped() {
        let registry = ClientRegistry::shared();
        let mut a = connect(&registry, 1);
        let b = connect(&registry, 2);
        let mut c = connect(&registry, 3);
        wait_for_members(&registry, 3).await;

        b.to_server
            .unbounded_send(Ok(Message::text("hi\nthere")))
            .unwrap();

        assert_eq!(next_message(&mut a).await, Message::text("hi\nthere"));
        assert_eq!(next_message(&mut c).await, Message::text("hi\nthere"));
    }

    #[tokio::test]
    async fn close_deregisters_and_finishes() {
        let registry = ClientRegistry::shared();
        let a = connect(&registry, 1);
        wait_for_members(&registry, 1).await;

        a.to_server.unbounded_send(Ok(Message::Close(None))).unwrap();

        timeout(TIMEOUT, a.task).await.unwrap().unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn transport_error_still_cleans_up() {
        let registry = ClientRegistry::shared();
        let a = connect(&registry, 1);
        let mut b = connect(&registry, 2);
        wait_for_members(&registry, 2).await;

        a.to_server
            .unbounded_send(Err(WsError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))))
            .unwrap();
        timeout(TIMEOUT, a.task).await.unwrap().unwrap();
        assert_eq!(registry.len(), 1);

        // The survivor keeps working on its own.
        let c = connect(&registry, 3);
        wait_for_members(&registry, 2).await;
        c.to_server.unbounded_send(Ok(Message::text("ok"))).unwrap();
        assert_eq!(next_message(&mut b).await, Message::text("ok"));
    }

    #[tokio::test]
    async fn aborted_handler_does_not_leak_registration() {
        let registry = ClientRegistry::shared();
        let a = connect(&registry, 1);
        wait_for_members(&registry, 1).await;

        a.task.abort();
        let _ = a.task.await;

        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn dead_recipient_does_not_break_sender_loop() {
        let registry = ClientRegistry::shared();
        let a = connect(&registry, 1);
        let b = connect(&registry, 2);
        let mut c = connect(&registry, 3);
        wait_for_members(&registry, 3).await;

        // b's outbound side is gone but its read loop is still running.
        drop(b.from_server);

        a.to_server.unbounded_send(Ok(Message::text("one"))).unwrap();
        a.to_server.unbounded_send(Ok(Message::text("two"))).unwrap();

        assert_eq!(next_message(&mut c).await, Message::text("one"));
        assert_eq!(next_message(&mut c).await, Message::text("two"));
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn preserves_order_of_one_senders_burst() {
        let registry = ClientRegistry::shared();
        let a = connect(&registry, 1);
        let mut b = connect(&registry, 2);
        wait_for_members(&registry, 2).await;

        for i in 0..1000 {
            a.to_server
                .unbounded_send(Ok(Message::text(format!("msg-{}", i))))
                .unwrap();
        }

        for i in 0..1000 {
            assert_eq!(
                next_message(&mut b).await,
                Message::text(format!("msg-{}", i))
            );
        }
    }

    #[tokio::test]
    async fn stalled_recipient_does_not_hold_up_sender_or_others() {
        let registry = ClientRegistry::shared();
        let a = connect(&registry, 1);
        let (stalled_in, stalled_task) = connect_with_sink(&registry, 2, Box::pin(NeverReady));
        let mut c = connect(&registry, 3);
        wait_for_members(&registry, 3).await;

        for text in ["one", "two", "three"] {
            a.to_server.unbounded_send(Ok(Message::text(text))).unwrap();
        }

        assert_eq!(next_message(&mut c).await, Message::text("one"));
        assert_eq!(next_message(&mut c).await, Message::text("two"));
        assert_eq!(next_message(&mut c).await, Message::text("three"));

        // The stalled peer's own handler still reaches CLOSED once it leaves.
        stalled_in.unbounded_send(Ok(Message::Close(None))).unwrap();
        timeout(TIMEOUT, stalled_task).await.unwrap().unwrap();
        assert_eq!(registry.len(), 2);
    }
}
