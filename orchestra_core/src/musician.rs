//! The per-musician election state machine.
//!
//! A musician is a pure, event-driven state machine: the driver feeds it
//! inbound messages and timer expirations, and every handler returns a
//! [`Step`] describing what to send and how to adjust the lease watchdog.
//! Nothing here performs I/O, which keeps every protocol property unit
//! testable without a runtime.
//!
//! # Round structure
//!
//! One round is one attempt to find the unique local maximum-priority node
//! in each neighborhood:
//!
//! 1. On `Start`, send `Exchange(Requested)` with the own priority value to
//!    every neighbor.
//! 2. Answer incoming requests: a resolved loser always accepts, a resolved
//!    winner always rejects, an undecided musician accepts exactly when the
//!    requester's value beats its own (strict `>`).
//! 3. When every neighbor accepted, become Winner, announce
//!    `Prioritize(Winner)`, and start performing.
//! 4. Losers propagate `Prioritize(NotWinner)` (at most one broadcast per
//!    round) and wait on the winner's heartbeat lease; when every neighbor
//!    has conceded without a winner emerging, reset the round and re-send
//!    the Exchange requests.
//!
//! A Winner is terminal: it never re-enters the exchange.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use orchestra_env::{Envelope, MusicianId};

use crate::messages::{ExchangeStatus, Message, PriorityStatus};
use crate::position::Position;

/// Where a musician is in the round lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Joined, waiting for the conductor's barrier to close.
    WaitingForStart,
    /// Exchange requests sent, collecting replies.
    Exchanging,
    /// Own exchange resolved without a win; waiting for a winner claim,
    /// NotWinner convergence, or a lease expiry.
    WaitingForPriorityResolution,
    /// Confirmed winner, heartbeating. Terminal.
    Performing,
}

/// A musician's resolved standing, carried across rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityState {
    Unknown,
    Winner,
    Loser,
}

/// Outcome of the exchange with one neighbor, this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeResult {
    #[default]
    Unknown,
    Accepted,
    Rejected,
}

/// What one neighbor last claimed about itself, this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityResult {
    #[default]
    Unknown,
    Winner,
    NotWinner,
}

/// Per-neighbor bookkeeping, reset to `Unknown` at every round start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NeighborRecord {
    pub exchange: ExchangeResult,
    pub priority: PriorityResult,
}

/// Watchdog instruction for the driver.
///
/// `Arm` replaces any previously armed deadline - a round reset can never
/// leave a stale timer behind, because the agent holds at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCmd {
    /// Arm (or re-arm) the lease deadline at `now + lease_timeout`.
    Arm,
    /// Clear the lease deadline.
    Disarm,
}

/// Effects of handling one event.
#[derive(Debug, Default)]
pub struct Step {
    /// Envelopes to hand to the transport, in order.
    pub outbound: Vec<Envelope<Message>>,

    /// Lease watchdog adjustment, if any.
    pub timer: Option<TimerCmd>,

    /// True exactly when this event made the musician a Winner: the driver
    /// starts the bounded heartbeat schedule.
    pub begin_performance: bool,

    /// True exactly when this event reset the round. Carried on the step
    /// because a convergence reset can fire while the musician is still
    /// `Exchanging`, where no phase change betrays it.
    pub round_restarted: bool,
}

/// One election participant.
#[derive(Debug)]
pub struct Musician {
    id: MusicianId,
    position: Position,
    priority_value: u64,
    priority_state: PriorityState,
    phase: Phase,
    neighbors: HashMap<MusicianId, NeighborRecord>,
    not_winner_broadcast: bool,
    tie_break_by_id: bool,
}

impl Musician {
    /// Creates a musician with its (symmetric) neighbor set.
    pub fn new(
        id: MusicianId,
        position: Position,
        priority_value: u64,
        neighbor_ids: &[MusicianId],
        tie_break_by_id: bool,
    ) -> Self {
        Self {
            id,
            position,
            priority_value,
            priority_state: PriorityState::Unknown,
            phase: Phase::WaitingForStart,
            neighbors: neighbor_ids
                .iter()
                .map(|&n| (n, NeighborRecord::default()))
                .collect(),
            not_winner_broadcast: false,
            tie_break_by_id,
        }
    }

    pub fn id(&self) -> MusicianId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn priority_value(&self) -> u64 {
        self.priority_value
    }

    pub fn priority_state(&self) -> PriorityState {
        self.priority_state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The record kept for one neighbor, if it is a neighbor.
    pub fn record(&self, neighbor: MusicianId) -> Option<&NeighborRecord> {
        self.neighbors.get(&neighbor)
    }

    /// Dispatches one inbound message.
    pub fn handle(&mut self, sender: MusicianId, message: Message) -> Step {
        trace!(id = %self.id, from = %sender, kind = message.kind(), "handling message");
        match message {
            Message::Start => self.on_start(),
            Message::Exchange {
                value,
                status: ExchangeStatus::Requested,
            } => self.on_exchange_request(sender, value),
            Message::Exchange { status, .. } => {
                self.on_exchange_reply(sender, status == ExchangeStatus::Accepted)
            }
            Message::Prioritize { status } => self.on_priority(sender, status),
            Message::Perform => self.on_perform(sender),
            Message::Reject { reason } => {
                warn!(id = %self.id, from = %sender, %reason, "message was rejected");
                Step::default()
            }
            Message::Join => self.reject_to(sender, "join is addressed to the conductor"),
        }
    }

    /// The loser's lease deadline fired without a heartbeat: the winner's
    /// turn is over, restart the round.
    ///
    /// A fire that races a round that already reset is a no-op - the phase
    /// check guarantees at most one restart per expiry.
    pub fn on_lease_expired(&mut self) -> Step {
        if self.phase == Phase::WaitingForPriorityResolution
            && self.priority_state == PriorityState::Loser
        {
            debug!(id = %self.id, "lease expired, restarting round");
            self.reset_round()
        } else {
            trace!(id = %self.id, phase = ?self.phase, "stale lease expiry ignored");
            Step::default()
        }
    }

    /// One performance heartbeat frame, sent by the driver at the
    /// configured interval while this musician performs.
    pub fn heartbeat(&self) -> Option<Envelope<Message>> {
        self.to_neighbors(Message::Perform)
    }

    fn on_start(&mut self) -> Step {
        if self.phase != Phase::WaitingForStart {
            trace!(id = %self.id, "duplicate start ignored");
            return Step::default();
        }

        debug!(id = %self.id, value = self.priority_value, "starting first round");
        self.phase = Phase::Exchanging;

        if self.neighbors.is_empty() {
            // No one to defer to: trivially the local maximum.
            return self.become_winner();
        }

        Step {
            outbound: self.exchange_request().into_iter().collect(),
            ..Default::default()
        }
    }

    fn on_exchange_request(&mut self, sender: MusicianId, value: u64) -> Step {
        if self.phase == Phase::WaitingForStart {
            return self.reject_to(sender, "exchange request while waiting for start");
        }
        if !self.neighbors.contains_key(&sender) {
            return self.reject_to(sender, "exchange request from a non-neighbor");
        }

        let accepted = match self.priority_state {
            // A resolved loser always defers, a resolved winner never does.
            PriorityState::Loser => true,
            PriorityState::Winner => false,
            PriorityState::Unknown => {
                value > self.priority_value
                    || (self.tie_break_by_id && value == self.priority_value && sender > self.id)
            }
        };

        let status = if accepted {
            ExchangeStatus::Accepted
        } else {
            ExchangeStatus::Rejected
        };

        // Exactly one reply per request; the echoed value is the
        // requester's own.
        Step {
            outbound: vec![Envelope::to_one(
                self.id,
                sender,
                Message::Exchange { value, status },
            )],
            ..Default::default()
        }
    }

    fn on_exchange_reply(&mut self, sender: MusicianId, accepted: bool) -> Step {
        match self.phase {
            Phase::WaitingForStart => {
                return self.reject_to(sender, "exchange reply while waiting for start")
            }
            Phase::Performing => {
                return self.reject_to(sender, "exchange reply after the exchange resolved")
            }
            Phase::Exchanging | Phase::WaitingForPriorityResolution => {}
        }

        let Some(record) = self.neighbors.get_mut(&sender) else {
            return self.reject_to(sender, "exchange reply from a non-neighbor");
        };
        record.exchange = if accepted {
            ExchangeResult::Accepted
        } else {
            ExchangeResult::Rejected
        };

        // Only an undecided musician can still win this round; a loser
        // records replies without ever acting on them.
        if self.priority_state == PriorityState::Unknown && self.all_exchanges_accepted() {
            return self.become_winner();
        }
        if self.phase == Phase::Exchanging && self.all_exchanges_replied() {
            debug!(id = %self.id, "exchange resolved without a win");
            self.phase = Phase::WaitingForPriorityResolution;
        }

        Step::default()
    }

    fn on_priority(&mut self, sender: MusicianId, status: PriorityStatus) -> Step {
        if self.phase == Phase::WaitingForStart {
            return self.reject_to(sender, "priority message while waiting for start");
        }
        if self.priority_state == PriorityState::Winner {
            trace!(id = %self.id, from = %sender, "winner ignores priority messages");
            return Step::default();
        }
        if !self.neighbors.contains_key(&sender) {
            return self.reject_to(sender, "priority message from a non-neighbor");
        }

        match status {
            PriorityStatus::Winner => {
                if let Some(record) = self.neighbors.get_mut(&sender) {
                    record.priority = PriorityResult::Winner;
                }
                debug!(id = %self.id, winner = %sender, "yielding to neighborhood winner");
                self.priority_state = PriorityState::Loser;
                self.phase = Phase::WaitingForPriorityResolution;

                let mut step = Step {
                    // Await the winner's heartbeats from here on.
                    timer: Some(TimerCmd::Arm),
                    ..Default::default()
                };
                if !self.not_winner_broadcast {
                    self.not_winner_broadcast = true;
                    step.outbound
                        .extend(self.to_neighbors(Message::Prioritize {
                            status: PriorityStatus::NotWinner,
                        }));
                }
                step
            }
            PriorityStatus::NotWinner => {
                if let Some(record) = self.neighbors.get_mut(&sender) {
                    record.priority = PriorityResult::NotWinner;
                }

                let mut step = Step::default();
                if !self.not_winner_broadcast {
                    self.not_winner_broadcast = true;
                    // The informing neighbor already knows.
                    let others: Vec<MusicianId> = self
                        .neighbors
                        .keys()
                        .copied()
                        .filter(|&n| n != sender)
                        .collect();
                    if !others.is_empty() {
                        step.outbound.push(Envelope::new(
                            self.id,
                            others,
                            Message::Prioritize {
                                status: PriorityStatus::NotWinner,
                            },
                        ));
                    }
                }

                // Everyone conceded and nobody claimed victory: the round
                // is spent, retry with the same priority value.
                if self.all_priorities_not_winner() {
                    debug!(id = %self.id, "all neighbors conceded, restarting round");
                    let reset = self.reset_round();
                    step.outbound.extend(reset.outbound);
                    step.timer = reset.timer;
                    step.round_restarted = true;
                }
                step
            }
        }
    }

    fn on_perform(&mut self, sender: MusicianId) -> Step {
        if self.phase == Phase::WaitingForStart {
            return self.reject_to(sender, "perform while waiting for start");
        }
        if !self.neighbors.contains_key(&sender) {
            return self.reject_to(sender, "perform from a non-neighbor");
        }

        if self.phase == Phase::WaitingForPriorityResolution
            && self.priority_state == PriorityState::Loser
        {
            trace!(id = %self.id, from = %sender, "heartbeat received, lease renewed");
            Step {
                timer: Some(TimerCmd::Arm),
                ..Default::default()
            }
        } else {
            // A heartbeat straddling a round reset is normal traffic, not a
            // protocol violation.
            trace!(id = %self.id, from = %sender, "stale heartbeat ignored");
            Step::default()
        }
    }

    /// Resets all per-round state and re-issues the Exchange requests.
    ///
    /// Idempotent: a second invocation without intervening replies leaves
    /// the records in the same reset state. `priority_state` is deliberately
    /// retained - a Loser stays a Loser across restarts and keeps using the
    /// auto-accept response rule (see DESIGN notes).
    fn reset_round(&mut self) -> Step {
        for record in self.neighbors.values_mut() {
            *record = NeighborRecord::default();
        }
        self.not_winner_broadcast = false;
        self.phase = Phase::Exchanging;

        Step {
            outbound: self.exchange_request().into_iter().collect(),
            timer: Some(TimerCmd::Disarm),
            begin_performance: false,
            round_restarted: true,
        }
    }

    fn become_winner(&mut self) -> Step {
        debug!(id = %self.id, value = self.priority_value, "won the neighborhood");
        self.priority_state = PriorityState::Winner;
        self.phase = Phase::Performing;

        Step {
            outbound: self
                .to_neighbors(Message::Prioritize {
                    status: PriorityStatus::Winner,
                })
                .into_iter()
                .collect(),
            timer: Some(TimerCmd::Disarm),
            begin_performance: true,
            round_restarted: false,
        }
    }

    fn exchange_request(&self) -> Option<Envelope<Message>> {
        self.to_neighbors(Message::Exchange {
            value: self.priority_value,
            status: ExchangeStatus::Requested,
        })
    }

    fn to_neighbors(&self, message: Message) -> Option<Envelope<Message>> {
        if self.neighbors.is_empty() {
            return None;
        }
        let mut receivers: Vec<MusicianId> = self.neighbors.keys().copied().collect();
        receivers.sort_unstable();
        Some(Envelope::new(self.id, receivers, message))
    }

    fn reject_to(&self, sender: MusicianId, reason: &str) -> Step {
        let reason = format!("{} (phase {:?})", reason, self.phase);
        debug!(id = %self.id, to = %sender, %reason, "rejecting out-of-phase message");
        Step {
            outbound: vec![Envelope::to_one(self.id, sender, Message::Reject { reason })],
            ..Default::default()
        }
    }

    fn all_exchanges_accepted(&self) -> bool {
        self.neighbors
            .values()
            .all(|r| r.exchange == ExchangeResult::Accepted)
    }

    fn all_exchanges_replied(&self) -> bool {
        self.neighbors
            .values()
            .all(|r| r.exchange != ExchangeResult::Unknown)
    }

    fn all_priorities_not_winner(&self) -> bool {
        self.neighbors
            .values()
            .all(|r| r.priority == PriorityResult::NotWinner)
    }
}
