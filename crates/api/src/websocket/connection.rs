//! WebSocket connection handle
//!
//! Represents one live bidirectional session. Outbound traffic goes through
//! a single-writer queue drained by one task per socket, which preserves
//! per-connection delivery order across direct sends, confirmations,
//! broadcasts, and pings.

use time::OffsetDateTime;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::ServerEvent;

/// Frame pushed onto a connection's outbound queue
#[derive(Debug)]
pub enum Outbound {
    /// Serialize and deliver an event to the client
    Event(ServerEvent),
    /// Close the underlying transport and stop the writer task
    Close,
}

/// An active WebSocket connection
#[derive(Debug)]
pub struct Connection {
    /// Unique session ID for this connection
    pub session_id: Uuid,

    /// When the transport handshake completed
    pub connected_at: OffsetDateTime,

    /// Outbound queue drained by this connection's writer task
    sender: mpsc::UnboundedSender<Outbound>,
}

impl Connection {
    /// Create a new connection wrapping an outbound queue
    pub fn new(sender: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            connected_at: OffsetDateTime::now_utc(),
            sender,
        }
    }

    /// Queue an event for delivery to this connection
    ///
    /// Returns Err when the writer task is gone, i.e. the transport is
    /// closed. Callers treat that as a dead connection.
    #[allow(clippy::result_large_err)] // Error type is from tokio mpsc, containing the failed frame
    pub fn send(&self, event: ServerEvent) -> Result<(), mpsc::error::SendError<Outbound>> {
        self.sender.send(Outbound::Event(event))
    }

    /// Ask the writer task to close the transport (best effort)
    pub fn close(&self) {
        let _ = self.sender.send(Outbound::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_queues_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = Connection::new(tx);

        conn.send(ServerEvent::ping()).unwrap();

        match rx.try_recv().unwrap() {
            Outbound::Event(ServerEvent::Ping { .. }) => {}
            other => panic!("Expected ping frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Connection::new(tx);
        drop(rx);

        assert!(conn.send(ServerEvent::ping()).is_err());
    }

    #[tokio::test]
    async fn test_close_queues_close_frame() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = Connection::new(tx);

        conn.close();

        assert!(matches!(rx.try_recv().unwrap(), Outbound::Close));
    }
}
