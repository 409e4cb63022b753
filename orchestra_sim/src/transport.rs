//! Channel-backed transport: every envelope goes through the conductor.

use async_trait::async_trait;
use tokio::sync::mpsc;

use orchestra_core::Message;
use orchestra_env::{EnvError, Envelope, MusicianId, Transport};

/// Transport endpoint handed to one performer.
///
/// Outgoing envelopes flow into the conductor's router; incoming ones arrive
/// on this node's private mailbox. Mailboxes are unbounded so that routing
/// to one musician can never block behind another (the delivery-independence
/// contract), and mpsc preserves per-sender FIFO order.
pub struct ChannelTransport {
    local_id: MusicianId,

    /// Sender toward the conductor's router.
    tx: mpsc::Sender<Envelope<Message>>,

    /// This node's mailbox (behind a tokio mutex for `recv(&self)`).
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Envelope<Message>>>,
}

impl ChannelTransport {
    /// Creates the endpoint for one musician.
    pub fn new(
        local_id: MusicianId,
        tx: mpsc::Sender<Envelope<Message>>,
        rx: mpsc::UnboundedReceiver<Envelope<Message>>,
    ) -> Self {
        Self {
            local_id,
            tx,
            rx: tokio::sync::Mutex::new(rx),
        }
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    type Body = Message;

    async fn send(&self, envelope: Envelope<Message>) -> Result<(), EnvError> {
        self.tx
            .send(envelope)
            .await
            .map_err(|_| EnvError::closed("conductor router is gone"))
    }

    async fn recv(&self) -> Option<Envelope<Message>> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }

    fn local_id(&self) -> MusicianId {
        self.local_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_core::Message;

    #[tokio::test]
    async fn test_send_reaches_router_and_recv_drains_mailbox() {
        let (router_tx, mut router_rx) = mpsc::channel(8);
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let id = MusicianId::from_index(0);
        let transport = ChannelTransport::new(id, router_tx, inbox_rx);

        transport
            .send(Envelope::to_one(id, MusicianId::CONDUCTOR, Message::Join))
            .await
            .unwrap();
        let routed = router_rx.recv().await.unwrap();
        assert_eq!(routed.body, Message::Join);

        inbox_tx
            .send(Envelope::to_one(MusicianId::CONDUCTOR, id, Message::Start))
            .unwrap();
        let received = transport.recv().await.unwrap();
        assert_eq!(received.body, Message::Start);
    }

    #[tokio::test]
    async fn test_send_after_router_dropped_errors() {
        let (router_tx, router_rx) = mpsc::channel(1);
        drop(router_rx);
        let (_inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let id = MusicianId::from_index(0);
        let transport = ChannelTransport::new(id, router_tx, inbox_rx);

        let err = transport
            .send(Envelope::to_one(id, MusicianId::CONDUCTOR, Message::Join))
            .await
            .unwrap_err();
        assert!(matches!(err, EnvError::TransportClosed(_)));
    }
}
