//! The conductor: join barrier and addressed message routing.
//!
//! The conductor knows ids and mailbox addresses, never musician state.
//! Registry bookkeeping (join counting, firing the barrier) happens inside
//! one mutex; fan-out delivery happens outside it, so unrelated traffic is
//! never serialized behind barrier bookkeeping.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use orchestra_core::Message;
use orchestra_env::{Envelope, MusicianId};

/// Join-barrier bookkeeping, guarded by the conductor's single mutex.
#[derive(Debug, Default)]
struct Registry {
    joined: HashSet<MusicianId>,
    connected: usize,
    start_fired: bool,
}

/// The coordination relay.
pub struct Conductor {
    expected: usize,
    registry: Mutex<Registry>,

    /// Mailbox address per musician, fixed at construction. Unbounded: a
    /// send never blocks, so delivery to one receiver cannot stall another.
    mailboxes: HashMap<MusicianId, mpsc::UnboundedSender<Envelope<Message>>>,
}

impl Conductor {
    /// Creates a conductor expecting `expected` musicians at the barrier.
    pub fn new(
        expected: usize,
        mailboxes: HashMap<MusicianId, mpsc::UnboundedSender<Envelope<Message>>>,
    ) -> Self {
        Self {
            expected,
            registry: Mutex::new(Registry::default()),
            mailboxes,
        }
    }

    /// Routes envelopes until every sender is gone.
    ///
    /// `Join` is the one kind addressed to the conductor itself; everything
    /// else is fanned out to its receivers.
    pub async fn run(self, mut rx: mpsc::Receiver<Envelope<Message>>) {
        while let Some(envelope) = rx.recv().await {
            match envelope.body {
                Message::Join => self.join(envelope.sender),
                _ => self.route(envelope),
            }
        }
        debug!("conductor router shutting down");
    }

    /// Registers a musician at the barrier.
    ///
    /// The connected count only grows while the barrier is open; once the
    /// last expected musician joins, `start` is broadcast exactly once. A
    /// late join is still recorded but never re-fires the barrier.
    fn join(&self, id: MusicianId) {
        let fire_start = {
            let mut registry = self.registry.lock().expect("conductor registry poisoned");
            registry.joined.insert(id);
            if registry.connected < self.expected {
                registry.connected += 1;
            }
            info!(
                musician = %id,
                connected = registry.connected,
                expected = self.expected,
                "connected"
            );

            let all_connected = registry.connected == self.expected;
            if all_connected && !registry.start_fired {
                registry.start_fired = true;
                true
            } else {
                false
            }
        };

        // Fan-out happens after the registry lock is released.
        if fire_start {
            info!("all connected, starting");
            for (&id, mailbox) in &self.mailboxes {
                let envelope = Envelope::to_one(MusicianId::CONDUCTOR, id, Message::Start);
                if mailbox.send(envelope).is_err() {
                    warn!(musician = %id, "start signal undeliverable, mailbox closed");
                }
            }
        }
    }

    /// Delivers an envelope to each receiver's mailbox independently.
    fn route(&self, envelope: Envelope<Message>) {
        for &receiver in &envelope.receivers {
            match self.mailboxes.get(&receiver) {
                Some(mailbox) => {
                    if mailbox.send(envelope.clone()).is_err() {
                        warn!(
                            from = %envelope.sender,
                            to = %receiver,
                            kind = envelope.body.kind(),
                            "delivery failed, mailbox closed"
                        );
                    }
                }
                None => warn!(
                    from = %envelope.sender,
                    to = %receiver,
                    "dropping envelope for unknown receiver"
                ),
            }
        }
    }
}
