//! Transport abstraction between musicians and the conductor.

use async_trait::async_trait;

use crate::error::EnvError;
use crate::types::{Envelope, MusicianId};

/// Abstraction for message I/O between a musician and the rest of the stage.
///
/// # Implementations
///
/// - **Simulation**: channel-based, routed through an in-process conductor
/// - **Production**: would wrap a broker connection (e.g. a hub socket)
///
/// # Delivery contract
///
/// ```text
/// Musician A                 Conductor                Musician B
///   |                           |                          |
///   |-- send(env{B,C}) -------->|                          |
///   |                           |-- route ---------------->|-- recv() -> env
///   |                           |-- route --> Musician C   |
/// ```
///
/// Envelopes from the same sender arrive at each receiver in send order.
/// No ordering is guaranteed across different senders.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// The payload type carried by envelopes.
    type Body: Send + 'static;

    /// Sends an envelope toward its receivers.
    ///
    /// Success means the envelope was accepted for delivery, not that any
    /// receiver has seen it yet.
    async fn send(&self, envelope: Envelope<Self::Body>) -> Result<(), EnvError>;

    /// Receives the next envelope addressed to this node.
    ///
    /// Returns `None` when the transport has shut down.
    async fn recv(&self) -> Option<Envelope<Self::Body>>;

    /// Returns this node's id.
    fn local_id(&self) -> MusicianId;
}
