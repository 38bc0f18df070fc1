//! Receive outcomes
//!
//! Collapses the inbound stream's items into an explicit tagged result so the
//! handler's loop never has to interpret tungstenite errors itself.

use futures::StreamExt;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use super::MessageStream;

/// Outcome of one receive on a connection.
#[derive(Debug)]
pub enum Received {
    /// A data message to relay.
    Message(Message),
    /// The peer closed the connection.
    Closed,
    /// Transport or protocol failure.
    Error(String),
}

/// Wait for the next data message.
///
/// Control frames are consumed here and never surface.
pub async fn receive(stream: &mut MessageStream) -> Received {
    loop {
        match stream.next().await {
            None => return Received::Closed,
            Some(Ok(Message::Close(_))) => return Received::Closed,
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            Some(Ok(message)) => return Received::Message(message),
            Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                return Received::Closed;
            }
            Some(Err(e)) => return Received::Error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tokio_tungstenite::tungstenite::error::ProtocolError;

    fn stream_of(items: Vec<Result<Message, WsError>>) -> MessageStream {
        Box::pin(stream::iter(items))
    }

    #[tokio::test]
    async fn skips_control_frames() {
        let mut s = stream_of(vec![
            Ok(Message::Ping(vec![1u8].into())),
            Ok(Message::Pong(Vec::<u8>::new().into())),
            Ok(Message::text("hello")),
        ]);
        match receive(&mut s).await {
            Received::Message(m) => assert_eq!(m, Message::text("hello")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn close_frame_and_end_of_stream_are_closed() {
        let mut s = stream_of(vec![Ok(Message::Close(None))]);
        assert!(matches!(receive(&mut s).await, Received::Closed));

        let mut empty = stream_of(vec![]);
        assert!(matches!(receive(&mut empty).await, Received::Closed));

        let mut closed = stream_of(vec![Err(WsError::ConnectionClosed)]);
        assert!(matches!(receive(&mut closed).await, Received::Closed));
    }

    #[tokio::test]
    async fn protocol_failures_are_errors() {
        let mut s = stream_of(vec![Err(WsError::Protocol(
            ProtocolError::ResetWithoutClosingHandshake,
        ))]);
        assert!(matches!(receive(&mut s).await, Received::Error(_)));
    }

    #[tokio::test]
    async fn binary_messages_pass_through() {
        let mut s = stream_of(vec![Ok(Message::binary(vec![0u8, 159, 146, 150]))]);
        match receive(&mut s).await {
            Received::Message(m) => assert_eq!(m.into_data().as_ref(), &[0u8, 159, 146, 150]),
            other => panic!("unexpected {:?}", other),
        }
    }
}
