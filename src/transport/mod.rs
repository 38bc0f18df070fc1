//! Transport layer
//!
//! Wraps the WebSocket connection behind boxed sink/stream halves so the
//! relay core never names a concrete socket type.

pub mod receive;
pub mod writer;

pub use receive::{Received, receive};
pub use writer::{OUTBOUND_QUEUE_CAPACITY, OutboundWriter, spawn_writer};

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Outbound half of a connection.
pub type MessageSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;

/// Inbound half of a connection.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<Message, WsError>> + Send>>;

/// Split an accepted WebSocket into the halves the relay handler consumes.
pub fn split_socket(socket: WebSocketStream<TcpStream>) -> (MessageSink, MessageStream) {
    let (sink, stream) = socket.split();
    (Box::pin(sink), Box::pin(stream))
}

/// Box an arbitrary sink. Any error it reports surfaces as a closed
/// connection, so in-memory channels can stand in for sockets.
pub fn boxed_sink<S>(sink: S) -> MessageSink
where
    S: Sink<Message> + Send + Unpin + 'static,
{
    Box::pin(ClosedOnError(sink))
}

struct ClosedOnError<S>(S);

impl<S> Sink<Message> for ClosedOnError<S>
where
    S: Sink<Message> + Unpin,
{
    type Error = WsError;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        self.0.poll_ready_unpin(cx).map_err(|_| WsError::ConnectionClosed)
    }

    fn start_send(mut self: Pin<&mut Self>, item: Message) -> Result<(), WsError> {
        self.0.start_send_unpin(item).map_err(|_| WsError::ConnectionClosed)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        self.0.poll_flush_unpin(cx).map_err(|_| WsError::ConnectionClosed)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        self.0.poll_close_unpin(cx).map_err(|_| WsError::ConnectionClosed)
    }
}
