//! Orchestra - wires roster, conductor, and performers into one run.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use orchestra_core::{build_neighbors, Musician, ProtocolConfig, Roster};
use orchestra_env::{MusicianId, TokioClock};

use crate::conductor::Conductor;
use crate::performer::{Performer, PerformerEvent};
use crate::transport::ChannelTransport;

/// Capacity of the conductor's ingress channel.
const ROUTER_CAPACITY: usize = 10_000;

/// A running election: the conductor's router task plus one performer task
/// per musician.
pub struct Orchestra {
    ids: Vec<MusicianId>,
    events: mpsc::UnboundedReceiver<PerformerEvent>,
    router: JoinHandle<()>,
    performers: Vec<JoinHandle<()>>,
}

impl Orchestra {
    /// Builds the neighbor graph from the roster and spawns everything.
    ///
    /// Musicians immediately race to the conductor's join barrier; the
    /// election begins as soon as the last one registers.
    pub fn start(roster: &Roster, config: ProtocolConfig) -> Self {
        let graph = build_neighbors(&roster.positions(), config.neighbor_max_distance);
        let (router_tx, router_rx) = mpsc::channel(ROUTER_CAPACITY);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let clock = TokioClock::shared();

        let mut mailboxes = HashMap::new();
        let mut performers = Vec::with_capacity(roster.len());
        let mut ids = Vec::with_capacity(roster.len());

        for (entry, neighbors) in roster.entries().iter().zip(&graph) {
            let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
            mailboxes.insert(entry.id, inbox_tx);
            ids.push(entry.id);

            let musician = Musician::new(
                entry.id,
                entry.position,
                entry.priority_value,
                neighbors,
                config.tie_break_by_id,
            );
            debug!(
                musician = %entry.id,
                position = %entry.position,
                value = entry.priority_value,
                neighbors = neighbors.len(),
                "spawning performer"
            );

            let transport = Arc::new(ChannelTransport::new(
                entry.id,
                router_tx.clone(),
                inbox_rx,
            ));
            performers.push(
                Performer::new(musician, transport, Arc::clone(&clock), config.clone())
                    .with_events(events_tx.clone()),
            );
        }
        drop(router_tx);
        drop(events_tx);

        let conductor = Conductor::new(roster.len(), mailboxes);
        let router = tokio::spawn(conductor.run(router_rx));
        let performers = performers
            .into_iter()
            .map(|p| tokio::spawn(p.run()))
            .collect();

        Self {
            ids,
            events: events_rx,
            router,
            performers,
        }
    }

    /// Ids of all spawned musicians, in roster order.
    pub fn ids(&self) -> &[MusicianId] {
        &self.ids
    }

    /// Next observable transition, or `None` once every performer is gone.
    pub async fn next_event(&mut self) -> Option<PerformerEvent> {
        self.events.recv().await
    }

    /// Stops all tasks. The run has no graceful wind-down to perform:
    /// agent state is in-memory only.
    pub fn shutdown(self) {
        for handle in &self.performers {
            handle.abort();
        }
        self.router.abort();
    }
}
