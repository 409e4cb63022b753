//! The async driver that runs one musician as a task.
//!
//! The performer owns a [`Musician`] state machine and applies its effects:
//! envelopes go to the transport, timer commands move the single lease
//! deadline, and `begin_performance` starts the bounded heartbeat schedule.
//! One `select!` loop per musician - handlers run to completion, and the
//! only suspension points are waiting for the next envelope or the next
//! deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use orchestra_core::{Message, Musician, PriorityState, ProtocolConfig, Step, TimerCmd};
use orchestra_env::{Clock, Envelope, MusicianId, Transport};

/// Observable state transitions, published for tests and the CLI summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformerEventKind {
    BecameWinner,
    BecameLoser,
    RoundRestarted,
    PerformanceFinished,
}

/// One transition of one musician.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformerEvent {
    pub id: MusicianId,
    pub kind: PerformerEventKind,
}

/// Async driver for a single musician.
pub struct Performer<T: Transport<Body = Message>, C: Clock> {
    musician: Musician,
    transport: Arc<T>,
    clock: Arc<C>,
    config: ProtocolConfig,

    /// The lease watchdog. At most one deadline exists per musician;
    /// re-arming overwrites it, which is what cancels the previous one.
    lease_deadline: Option<Instant>,

    /// Next Perform frame, while performing.
    next_heartbeat: Option<Instant>,

    /// End of the current performance.
    performing_until: Option<Instant>,

    events: Option<mpsc::UnboundedSender<PerformerEvent>>,
}

impl<T: Transport<Body = Message>, C: Clock> Performer<T, C> {
    /// Creates a performer around a musician.
    pub fn new(
        musician: Musician,
        transport: Arc<T>,
        clock: Arc<C>,
        config: ProtocolConfig,
    ) -> Self {
        Self {
            musician,
            transport,
            clock,
            config,
            lease_deadline: None,
            next_heartbeat: None,
            performing_until: None,
            events: None,
        }
    }

    /// Attaches an event channel for observers.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<PerformerEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Joins the barrier, then drives the musician until the transport
    /// closes.
    pub async fn run(mut self) {
        let id = self.musician.id();
        let join = Envelope::to_one(id, MusicianId::CONDUCTOR, Message::Join);
        if let Err(error) = self.transport.send(join).await {
            warn!(musician = %id, %error, "could not reach the conductor, giving up");
            return;
        }

        loop {
            let transport = Arc::clone(&self.transport);
            let clock = Arc::clone(&self.clock);
            let lease = self.lease_deadline;
            let beat = self.next_heartbeat;
            // Placeholder deadline for disabled branches; never polled.
            let idle = clock.now() + Duration::from_secs(86_400);

            tokio::select! {
                envelope = transport.recv() => {
                    match envelope {
                        Some(envelope) => self.on_envelope(envelope).await,
                        None => {
                            debug!(musician = %id, "transport closed, stopping");
                            break;
                        }
                    }
                }
                _ = clock.sleep_until(lease.unwrap_or(idle)), if lease.is_some() => {
                    self.on_lease_deadline().await;
                }
                _ = clock.sleep_until(beat.unwrap_or(idle)), if beat.is_some() => {
                    self.on_heartbeat_due().await;
                }
            }
        }
    }

    async fn on_envelope(&mut self, envelope: Envelope<Message>) {
        let before = self.musician.priority_state();
        let step = self.musician.handle(envelope.sender, envelope.body);
        let restarted = step.round_restarted;
        self.apply(step).await;
        self.emit_transitions(before, restarted);
    }

    async fn on_lease_deadline(&mut self) {
        // The deadline is consumed; the state machine decides whether it
        // was still meaningful.
        self.lease_deadline = None;
        let before = self.musician.priority_state();
        let step = self.musician.on_lease_expired();
        let restarted = step.round_restarted;
        self.apply(step).await;
        self.emit_transitions(before, restarted);
    }

    async fn on_heartbeat_due(&mut self) {
        let now = self.clock.now();
        let Some(until) = self.performing_until else {
            self.next_heartbeat = None;
            return;
        };

        if now >= until {
            info!(musician = %self.musician.id(), "performance finished");
            self.next_heartbeat = None;
            self.performing_until = None;
            self.emit(PerformerEventKind::PerformanceFinished);
            return;
        }

        if let Some(frame) = self.musician.heartbeat() {
            self.send(frame).await;
        }
        self.next_heartbeat = Some(now + self.config.heartbeat_interval);
    }

    async fn apply(&mut self, step: Step) {
        for envelope in step.outbound {
            self.send(envelope).await;
        }

        match step.timer {
            Some(TimerCmd::Arm) => {
                self.lease_deadline = Some(self.clock.now() + self.config.lease_timeout);
            }
            Some(TimerCmd::Disarm) => self.lease_deadline = None,
            None => {}
        }

        if step.begin_performance {
            let now = self.clock.now();
            info!(musician = %self.musician.id(), "performance begins");
            self.performing_until = Some(now + self.config.performance_duration);
            // First frame goes out right away.
            self.next_heartbeat = Some(now);
        }
    }

    async fn send(&self, envelope: Envelope<Message>) {
        if let Err(error) = self.transport.send(envelope).await {
            warn!(musician = %self.musician.id(), %error, "send failed");
        }
    }

    fn emit_transitions(&self, state_before: PriorityState, restarted: bool) {
        let state = self.musician.priority_state();

        if state != state_before {
            match state {
                PriorityState::Winner => self.emit(PerformerEventKind::BecameWinner),
                PriorityState::Loser => self.emit(PerformerEventKind::BecameLoser),
                PriorityState::Unknown => {}
            }
        }

        // Reported by the step itself: a convergence reset can happen while
        // the phase is still Exchanging, where no transition is visible.
        if restarted {
            self.emit(PerformerEventKind::RoundRestarted);
        }
    }

    fn emit(&self, kind: PerformerEventKind) {
        if let Some(events) = &self.events {
            let _ = events.send(PerformerEvent {
                id: self.musician.id(),
                kind,
            });
        }
    }
}
