//! Orchestra Simulation Harness
//!
//! Runs a whole election - conductor plus one task per musician - inside a
//! single process, with tokio channels standing in for the broker transport.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        Orchestra                          │
//! │                                                           │
//! │  ┌──────────┐   router    ┌───────────────────────────┐   │
//! │  │Performer │────────────►│         Conductor         │   │
//! │  │  task #0 │◄────────────│  join barrier + routing   │   │
//! │  └──────────┘   mailbox   └───────────────────────────┘   │
//! │  ┌──────────┐                    ▲         │              │
//! │  │Performer │────────────────────┘         │              │
//! │  │  task #1 │◄──────────────────────────────              │
//! │  └──────────┘        ...                                  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Every performer owns its musician state machine outright; the only shared
//! mutable state in the process is the conductor's join registry.

mod conductor;
mod orchestra;
mod performer;
mod transport;

pub use conductor::Conductor;
pub use orchestra::Orchestra;
pub use performer::{Performer, PerformerEvent, PerformerEventKind};
pub use transport::ChannelTransport;
