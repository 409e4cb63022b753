//! Orchestra Core - distributed leader-selection protocol
//!
//! A set of spatially-placed musicians, each able to talk only to neighbors
//! within a fixed distance, repeatedly elects a unique local
//! maximum-priority node without global knowledge. This crate holds the
//! protocol itself: the neighbor graph, the wire messages, and the
//! per-musician state machine. It performs no I/O - every handler takes an
//! inbound event and returns a [`Step`](musician::Step) of outbound
//! envelopes and timer commands for the driver to apply.

pub mod config;
pub mod error;
pub mod graph;
pub mod messages;
pub mod musician;
pub mod position;
pub mod roster;

pub use config::ProtocolConfig;
pub use error::RosterError;
pub use graph::build_neighbors;
pub use messages::{ExchangeStatus, Message, PriorityStatus};
pub use musician::{
    ExchangeResult, Musician, NeighborRecord, Phase, PriorityResult, PriorityState, Step, TimerCmd,
};
pub use position::Position;
pub use roster::{Roster, RosterEntry};
